//! HTTP API: a thin JSON shell over one inventory session.

pub mod app;

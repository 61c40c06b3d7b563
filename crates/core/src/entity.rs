//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inventory records are identified by their normalized name, so renaming a
/// record produces a different entity rather than mutating this one.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

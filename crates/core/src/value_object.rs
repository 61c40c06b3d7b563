//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. An
/// [`ItemName`](crate::ItemName) is one: two names built from `"Apple"` and
/// `" apple "` are the same value, so they address the same store record.
///
/// ```ignore
/// let a = ItemName::parse("Apple")?;
/// let b = ItemName::parse(" apple ")?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

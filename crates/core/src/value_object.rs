//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable once built; two value
/// objects holding the same values are the same thing. Query filters such as
/// a date window are modelled this way: they are parsed once at the boundary
/// and then only compared and evaluated.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Marker types tagging [`DateTimeOf`] values.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Marker of an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker of an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker of a payment being made.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

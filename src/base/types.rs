//! Result aliases shared across the crate.

/// The application-wide error type.
pub type Err = anyhow::Error;
/// Result with the application-wide error type.
pub type Res<T> = Result<T, Err>;
/// Result carrying no value.
pub type Void = Res<()>;

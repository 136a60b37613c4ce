//! Error types for the `tods-grid` crate.

/// Errors that can occur during geometry calculations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// A polygon needs at least three sides.
    #[error("polygon must have 3 sides or more, got {sides}")]
    TooFewSides {
        /// The requested side count.
        sides: u32,
    },
}

//! Utility functions and helpers.

pub mod identifier;
pub mod naming;

// Re-export commonly used items
pub use identifier::IdentifierValidator;
pub use naming::model_name;

//! Domain layer: the signed-in user and the values exchanged with the provider.

pub mod entities;
pub mod value_objects;

// Re-export commonly used domain types
pub use entities::*;
pub use value_objects::*;

//! Domain entities representing core business objects.

pub mod user;

// Re-export commonly used types
pub use user::AuthUser;

pub mod employee;
pub mod work_session;

// Re-export models for easier access
pub use employee::*;
pub use work_session::*;

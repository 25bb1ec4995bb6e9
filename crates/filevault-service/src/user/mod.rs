//! Account management and lock-password verification.

pub mod lock;
pub mod service;

pub use lock::LockVerifier;
pub use service::UserService;

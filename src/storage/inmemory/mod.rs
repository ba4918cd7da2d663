//! In-memory storage implementations
//!
//! Suitable for development and testing; nothing survives a restart.

mod users;

pub use users::MemoryUserStore;

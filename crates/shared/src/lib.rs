//! Gatehouse Shared Types and Utilities
//!
//! This crate contains the domain types, database utilities, and the user
//! directory contract shared across the Gatehouse platform.

pub mod db;
pub mod directory;
pub mod types;

pub use db::*;
pub use directory::{DirectoryError, MemoryDirectory, PgUserDirectory, UserDirectory};
pub use types::*;

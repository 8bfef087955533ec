//! Shared utilities

pub mod hashing;

pub use hashing::texts_hash;

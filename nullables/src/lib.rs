//! Nullable infrastructure for deterministic testing.
//!
//! Storage is abstracted behind the `ti-store` traits. This crate provides a
//! test-friendly implementation that:
//! - Keeps everything in memory and never touches the filesystem
//! - Is thread-safe, so concurrency tests can share it across threads
//! - Can be told to fail its next commit, to exercise storage-failure paths
//!
//! Usage: swap the LMDB store for a nullable in tests.

pub mod store;

pub use store::NullTrustStore;

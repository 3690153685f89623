//! Document store for minotor
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - JSON documents grouped into named collections
//! - The [`DocumentStore`] seam the event repository reads through

pub mod repo;
pub mod schema;

pub use repo::{Database, DocumentStore};

//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the project persistence contract consumed by services.
//! - Keep SQL and JSON document encoding inside the repository boundary.
//!
//! # Invariants
//! - Outline and content documents of one project are written together or
//!   not at all.
//! - Document writes are guarded by an optimistic version check.

pub mod project_repo;

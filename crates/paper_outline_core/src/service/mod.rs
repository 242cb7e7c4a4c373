//! Use-case services over the outline model.
//!
//! # Responsibility
//! - Reconcile content with the outline, plan and run generation.
//! - Orchestrate sessions and project lifecycle over the repository layer.

pub mod content_sync;
pub mod generation;
pub mod planner;
pub mod project_service;
pub mod session;

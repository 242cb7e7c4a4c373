//! Paper outline domain model.
//!
//! # Responsibility
//! - Define the outline tree and the per-section content store.
//! - Keep structural edits and id assignment free of I/O and logging.
//!
//! # Invariants
//! - Every outline node id is unique across its tree after a completed edit.
//! - The content store sentinel entry is never treated as a real section.

pub mod content;
pub mod ids;
pub mod outline;

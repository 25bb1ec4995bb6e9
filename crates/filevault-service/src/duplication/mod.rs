//! Duplication of files and folder subtrees.

pub mod service;

pub use service::{DuplicatedItem, DuplicationResult, DuplicationService};

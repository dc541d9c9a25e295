//! Board rules.
//!
//! `stacking` decides whether two stacks may merge. Command handlers call it
//! before touching the board and surface rejections as rule violations.

pub mod stacking;

pub use stacking::{validate_merge, MergeCandidate, StackingViolation};

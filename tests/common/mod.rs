//! Shared helpers for test targets.

pub mod fixtures;

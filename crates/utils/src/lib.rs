//! Shared utilities for stash
//!
//! This crate provides the plumbing the other crates lean on: thread pools
//! with diagnostic names and explicit rejection behaviour, XDG directory
//! lookup, and the tracing subscriber setup used by the binary.

pub mod pool;
pub mod tracing;
pub mod xdg;

pub use pool::{RejectionPolicy, Submission, WorkerPool};
pub use xdg::XdgPaths;

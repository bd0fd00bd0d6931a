//! Domain model, trait boundaries, and error taxonomy for the task
//! orchestration core.
//!
//! This crate has no opinion on storage, transport, or scheduling policy —
//! it defines the shapes (`domain`) and the seams (`traits`) that
//! `taskcore-foundation` implements and `taskcore-gateway`/`taskcore-cli`
//! consume.

pub mod domain;
pub mod error;
pub mod traits;

#[cfg(feature = "config")]
pub mod config;

pub use error::{TaskCoreError, TaskCoreResult};

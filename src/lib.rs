//! termprof: aggregate terminal profiles from many sources into one iTerm2
//! dynamic profiles document.
//!
//! The `generate` pipeline runs the [`sources`], discovers cloud instances
//! concurrently ([`discovery`]), then merges, checks and augments the result
//! ([`profile`]) before reconciling it with the file on disk.

#[macro_use]
pub mod debug;

pub mod cli;
pub mod discovery;
pub mod error;
pub mod estate;
pub mod generate;
pub mod profile;
pub mod sources;

pub use error::GenerateError;
pub use generate::{Generator, InstanceSource};

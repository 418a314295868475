//! proclaunch core - Platform-independent process abstractions
//!
//! This crate provides the traits, launch contract, environment access and
//! error types shared by the platform-specific implementations.

pub mod args;
pub mod config;
pub mod env;
mod error;
mod process;

pub use args::{Invocation, Role, SpawnRequest, join_command_line, quote_argument};
pub use config::*;
pub use env::EnvValue;
pub use error::*;
pub use process::*;

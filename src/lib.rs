//! Reach device-side protocol stack.
//!
//! Lets an embedded device expose parameters, files, commands, streams,
//! a CLI, time, and Wi-Fi provisioning to a Reach client over any
//! fixed-MTU packet link. The application implements the port traits in
//! [`ports`] and pumps [`stack::ReachStack::process`] from its main
//! loop; the stack owns no I/O and spawns no tasks.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod ports;
pub mod stack;
pub mod wire;

pub use error::{ErrorCode, Result};
pub use stack::ReachStack;

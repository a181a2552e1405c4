//! Service layer: dispatch, per-service handlers, and the engines that
//! outlive a single request (continued transactions, file transfers,
//! parameter notifications, open streams).
//!
//! [`ReachStack`] owns all of it. Callers feed it prompts and ticks
//! through [`ReachStack::process`] and everything else happens behind
//! the port traits.

pub mod access;
pub mod commands;
pub mod continued;
pub mod device;
pub mod engine;
pub mod notify;
pub mod params;
pub mod streams;
pub mod time;
pub mod transfer;
pub mod wifi;

pub use continued::{ContinuedKind, ContinuedTransaction};
pub use engine::ReachStack;
pub use notify::NotifyTable;
pub use streams::OpenStreams;
pub use transfer::FileTransfer;

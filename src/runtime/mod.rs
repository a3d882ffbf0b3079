//! Mailbox transport for the actor runtime
//!
//! Thin wrapper over `tokio::sync::mpsc` used as the actor mailbox's
//! underlying channel.

pub mod channel;

pub use channel::{Rx, Tx, bounded, oneshot, sync_channel, unbounded};

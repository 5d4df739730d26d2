//! Social relay publisher
//!
//! Signs profile events with the wallet's Schnorr identity and fans them
//! out to relays over WebSocket. Relays are independent: a dead or slow
//! relay shows up in the report, never as an error of the whole publish.

mod error;
mod event;
mod profile;
mod publisher;

pub use error::*;
pub use event::*;
pub use profile::*;
pub use publisher::*;

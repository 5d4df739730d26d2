//! Electrum RPC client
//!
//! Queries balances and unspent outputs, fetches previous transactions and
//! broadcasts signed ones against a list of Electrum servers.

mod broadcast;
mod client;
mod endpoint;
mod protocol;

pub use broadcast::*;
pub use client::*;
pub use endpoint::*;
pub use protocol::*;

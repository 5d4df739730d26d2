//! Payout pipeline
//!
//! Turns a batch of `(address, amount)` payouts into one signed, broadcast
//! and validated transaction from the funding wallet.

mod amount;
mod error;
mod lease;
mod orchestrator;
mod types;

pub use amount::*;
pub use error::*;
pub use lease::*;
pub use orchestrator::*;
pub use types::*;

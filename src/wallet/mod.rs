//! Wallet module - key derivation, WIF and addresses

mod address;
mod keys;

pub use address::*;
pub use keys::*;

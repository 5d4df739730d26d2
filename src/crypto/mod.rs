//! Cryptography module - hashing, Base58Check, secp256k1, ECDSA and Schnorr

mod base58;
mod curve;
mod ecdsa;
mod hash;
mod schnorr;
mod secret;
mod signer;

pub use base58::*;
pub use curve::*;
pub use ecdsa::*;
pub use hash::*;
pub use schnorr::*;
pub use secret::*;
pub use signer::*;

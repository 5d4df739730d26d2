//! LanaCoin payout engine
//!
//! Moves real funds: decodes a funding key, selects unspent outputs,
//! assembles and signs a legacy pay-to-pubkey-hash transaction, broadcasts
//! it through an Electrum server with failover, and validates the returned
//! txid before the caller may mark payouts settled.
//!
//! A secondary publisher signs profile events with Schnorr and fans them
//! out to social relays over WebSocket.

pub mod config;
pub mod crypto;
pub mod logging;
pub mod payout;
pub mod relay;
pub mod rpc;
pub mod transaction;
pub mod utxo;
pub mod wallet;

/// Coin-family constants - HARD-CODED, NOT PART OF RUNTIME CONFIG
pub mod constants {
    /// Minor units per coin (1 LANA = 10^8 lanoshis)
    pub const COIN: u64 = 100_000_000;

    /// Number of decimal places
    pub const DECIMAL_PLACES: u32 = 8;

    /// Version byte prepended to HASH160 in legacy addresses
    pub const ADDRESS_VERSION: u8 = 0x30;

    /// Version byte prepended to the private scalar in WIF
    pub const WIF_VERSION: u8 = 0xb0;

    /// Transaction version written by the builder
    pub const TX_VERSION: u32 = 1;

    /// Sequence for every input (final, no replacement signalling)
    pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

    /// SIGHASH_ALL, appended to DER signatures and to the preimage trailer
    pub const SIGHASH_ALL: u32 = 0x01;

    /// Outputs below this value are dust for the selector
    pub const DUST_THRESHOLD: u64 = 500_000;

    /// Hard ceiling on inputs per transaction
    pub const MAX_INPUTS: usize = 500;

    /// Change at or below this amount is absorbed into the fee
    pub const MIN_CHANGE: u64 = 1_000;

    /// Estimated serialized bytes per signed P2PKH input
    pub const FEE_BYTES_PER_INPUT: u64 = 180;

    /// Estimated serialized bytes per P2PKH output
    pub const FEE_BYTES_PER_OUTPUT: u64 = 34;

    /// Fixed transaction overhead in bytes
    pub const FEE_BYTES_OVERHEAD: u64 = 10;

    /// Minor units charged per estimated byte
    pub const FEE_RATE_PER_BYTE: u64 = 100;

    /// Safety multiplier on the estimated fee, as (numerator, denominator)
    pub const FEE_SAFETY_MULTIPLIER: (u64, u64) = (3, 2);

    /// Upper bound on fee re-selection rounds
    pub const FEE_MAX_ITERATIONS: usize = 10;

    /// Default Electrum port for the coin family
    pub const ELECTRUM_PORT: u16 = 5097;

    /// Fixed fallback Electrum servers, tried after the configured primary
    pub const FALLBACK_ELECTRUM_SERVERS: &[(&str, u16)] = &[
        ("electrum1.lanacoin.com", ELECTRUM_PORT),
        ("electrum2.lanacoin.com", ELECTRUM_PORT),
        ("electrum3.lanacoin.com", ELECTRUM_PORT),
    ];
}

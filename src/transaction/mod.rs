//! Legacy transaction encoding, fee estimation and signing

mod builder;
mod encode;
mod fee;
mod script;
mod tx;

pub use builder::*;
pub use encode::*;
pub use fee::*;
pub use script::*;
pub use tx::*;

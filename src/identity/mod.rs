// Identity module - validator keys, addresses and signer recovery

mod address;
mod hash;
mod keypair;
mod signer;

pub use address::*;
pub(crate) use hash::hash32;
pub use hash::{keccak256, keccak256_concat};
pub use keypair::*;
pub use signer::*;

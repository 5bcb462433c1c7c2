//! Sign single inputs of a PSET with keys obtained one at a time, and finalize the PSET into a
//! broadcastable transaction.
//!
//! Unlike a wallet signer, [`KeySigner`] does not know which inputs it is supposed to sign: the
//! caller fetches a key for an input (eg from a node wallet) and asks to sign that input only.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![warn(missing_docs)]

mod finalize;
mod key;

pub use crate::finalize::{finalize, FinalizeError};
pub use crate::key::{KeySigner, SignError};

pub use elements_miniscript;

use elements_miniscript::elements::secp256k1_zkp::{All, Secp256k1};

/// Shared secp context, creating one is expensive
pub static EC: once_cell::sync::Lazy<Secp256k1<All>> = once_cell::sync::Lazy::new(Secp256k1::new);

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing common code used in multiple other crate in the workspace, such as:
//!
//!  * Exact conversion of amounts between their fractional and their smallest unit form, and
//!    the collateral sizing formula, see [`amount`].
//!  * The [`Network`] enum with the asset table of each network.
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

pub mod amount;
mod network;

pub use crate::amount::Precision;
pub use crate::network::{fixed_fee, AssetTable, Network, FIXED_FEE_SATS};

pub use elements;
pub use rust_decimal::Decimal;

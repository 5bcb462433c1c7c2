#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Borrow a synthetic asset (eg FUSD) locking Liquid collateral in a contract issued by a remote
//! contract service ("factory").
//!
//! A borrow:
//!  * resolves a signed price from the oracles, see [`oracles`],
//!  * asks the service for the contract terms and the covenant address,
//!  * builds a transaction locking the collateral with coins of an Elements node wallet, see
//!    [`CollateralTxBuilder`],
//!  * sends it to the service which appends the output issuing the borrowed asset,
//!  * checks the returned transaction against what was sent, see [`Proposal`],
//!  * signs the wallet inputs with keys of the node, see [`CooperativeSigner`], and optionally
//!    broadcasts.
//!
//! The entry point is [`Borrower`].
//!
//! ```no_run
//! # use fuji_borrow::{BorrowConfig, BorrowRequest, Borrower, Network, Error};
//! # async fn borrow() -> Result<(), Error> {
//! let config = BorrowConfig::new(Network::LiquidTestnet)
//!     .elements_url("http://127.0.0.1:18884")
//!     .elements_credentials("user", "pass");
//! let borrower = Borrower::from_config(config)?;
//! let request = BorrowRequest {
//!     amount: 50_000_000_000,
//!     collateral_ratio: 150.into(),
//!     oracles: vec!["@fuji/btc-usd".to_string()],
//! };
//! let result = borrower.borrow(request).await?;
//! println!("{}", result.hex);
//! # Ok(())
//! # }
//! ```

mod borrow;
mod clients;
mod config;
mod error;
mod model;
pub mod oracles;
mod proposal;
mod signer;
mod tx_builder;

pub use crate::borrow::{BorrowState, Borrower};
pub use crate::clients::{ContractService, ElementsRpcClient, FactoryClient, WalletGateway};
pub use crate::config::{BorrowConfig, DEFAULT_FACTORY_URL, DEFAULT_PAIR};
pub use crate::error::Error;
pub use crate::model::{
    AddressInfo, Attestation, BlockchainInfo, BorrowRequest, BorrowResult, BorrowerAddress,
    ContractParams, FinalTransaction, Preview, ProposeContractRequest, PsetOutput,
    UnblindDescriptor, UnspentCoin,
};
pub use crate::proposal::Proposal;
pub use crate::signer::{CooperativeSigner, InputOutcome};
pub use crate::tx_builder::{
    asset_to_base64, blinder_to_base64, unblind_descriptor, BuiltTransaction, CollateralTxBuilder,
    SelectedInput, COVENANT_OUTPUT_INDEX,
};

pub use elements;
pub use fuji_common::{amount, Network};
pub use rust_decimal::Decimal;

use elements::{Address, AssetId, Transaction, Txid};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An unspent output of the node wallet, as returned by `listunspent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentCoin {
    pub txid: Txid,
    pub vout: u32,

    /// Hex of the asset id, display order
    pub asset: String,

    /// Fractional amount, 8 decimals
    pub amount: Decimal,

    /// Hex of the asset blinding factor, display order
    #[serde(rename = "assetblinder")]
    pub asset_blinder: String,

    /// Hex of the value blinding factor, display order
    #[serde(rename = "amountblinder")]
    pub amount_blinder: String,
}

/// Data a counterparty needs to unblind a collateral input and check the transaction balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblindDescriptor {
    pub index: u32,

    /// Base64 of the asset id, internal byte order
    pub asset: String,

    /// Amount in smallest unit, as decimal string
    pub value: String,

    /// Base64 of the asset blinding factor, internal byte order
    pub asset_blinding_factor: String,

    /// Base64 of the value blinding factor, internal byte order
    pub value_blinding_factor: String,
}

/// Terms of the contract returned by the contract service preview.
///
/// Opaque to this crate, fields unknown to us are kept in `extra` so that the terms are sent back
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractParams {
    pub borrow_asset: String,
    pub borrow_amount: u64,
    pub issuer_public_key: String,
    pub borrower_public_key: String,
    pub oracle_public_key: String,

    /// Base64
    pub price_level: String,

    /// Base64
    pub setup_timestamp: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of a contract preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    /// Address of the covenant locking the collateral
    #[serde(alias = "contractAddress")]
    pub address: String,
    pub contract_params: ContractParams,
}

/// A price attestation as forwarded to the contract service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub signature: String,
    pub message: String,
    pub message_hash: String,
}

impl Attestation {
    /// Only the signature is known to the borrower
    pub fn from_signature(signature: &str) -> Self {
        Attestation {
            signature: signature.to_string(),
            message: String::new(),
            message_hash: String::new(),
        }
    }
}

/// Body of the contract proposal sent to the contract service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeContractRequest {
    /// Base64 PSET
    pub partial_transaction: String,
    pub borrower_address: String,

    /// In smallest unit
    pub collateral_amount: u64,

    /// Hex of the asset id, display order
    pub collateral_asset: String,
    pub contract_params: ContractParams,
    pub attestation: Attestation,
    pub covenant_output_index_in_transaction: u32,
    pub blinders_of_collateral_inputs: Vec<UnblindDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProposeContractResponse {
    pub partial_transaction: String,
}

/// Subset of the `getaddressinfo` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: Option<String>,

    /// Hex of the compressed public key
    pub pubkey: String,
    pub unconfidential: String,
}

/// Subset of the `getblockchaininfo` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
}

/// A fresh address of the node wallet with the key controlling it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerAddress {
    pub address: Address,
    pub unconfidential: String,

    /// Hex of the x-only public key
    pub x_only_public_key: String,
}

/// An output of the transaction to create, in the node `createpsbt` format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsetOutput {
    pub address: Address,

    /// Fractional amount
    pub amount: Decimal,
    pub asset: AssetId,

    /// Index of the input whose owner blinds this output
    pub blinder_index: Option<u32>,
}

/// Parameters of a borrow operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRequest {
    /// Amount of the synthetic asset to borrow, in smallest unit
    pub amount: u64,

    /// Collateral ratio in percent, 150 means the collateral is worth 1.5 times the borrowed amount
    pub collateral_ratio: Decimal,

    /// Names of the oracles to ask for a price attestation, the highest price wins
    pub oracles: Vec<String>,
}

/// A finalized transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalTransaction {
    pub transaction: Transaction,
    pub hex: String,
}

/// Outcome of a borrow operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowResult {
    /// Present only if the transaction has been broadcast
    pub txid: Option<Txid>,
    pub hex: String,
}

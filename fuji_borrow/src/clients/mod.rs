//! Interfaces to the parties a borrow talks to: the node wallet holding the collateral and the
//! contract service issuing the synthetic asset.

mod elements_rpc;
mod factory;

pub use elements_rpc::ElementsRpcClient;
pub use factory::FactoryClient;

use async_trait::async_trait;
use elements::bitcoin::PrivateKey;
use elements::pset::PartiallySignedTransaction;
use elements::{Address, AssetId, OutPoint, Transaction, Txid};
use rust_decimal::Decimal;

use crate::model::{AddressInfo, BlockchainInfo, Preview, ProposeContractRequest, PsetOutput};
use crate::{BorrowerAddress, Error};

/// The wallet holding the collateral, typically an Elements node
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Unspent coins of `asset` whose sum is at least `minimum_sum` (fractional), if available
    async fn list_unspent(
        &self,
        asset: AssetId,
        minimum_sum: Decimal,
    ) -> Result<Vec<crate::UnspentCoin>, Error>;

    /// A wallet transaction
    async fn get_transaction(&self, txid: Txid) -> Result<Transaction, Error>;

    /// A fresh (confidential) address
    async fn get_new_address(&self) -> Result<Address, Error>;

    async fn get_address_info(&self, address: &Address) -> Result<AddressInfo, Error>;

    /// An unsigned PSET spending `inputs` to `outputs`, in this order
    async fn create_pset(
        &self,
        inputs: &[OutPoint],
        outputs: &[PsetOutput],
    ) -> Result<PartiallySignedTransaction, Error>;

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, Error>;

    /// The private key controlling `address`, fails if the address is not of this wallet
    async fn dump_private_key(&self, address: &Address) -> Result<PrivateKey, Error>;

    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Txid, Error>;

    /// A fresh address with the x-only public key controlling it
    async fn borrower_address(&self) -> Result<BorrowerAddress, Error> {
        let address = self.get_new_address().await?;
        let info = self.get_address_info(&address).await?;
        // compressed public key without the parity byte
        let x_only_public_key = match info.pubkey.get(2..) {
            Some(x) if info.pubkey.len() == 66 => x.to_string(),
            _ => {
                return Err(Error::UnexpectedReturn(format!(
                    "getaddressinfo returned invalid pubkey {:?}",
                    info.pubkey
                )))
            }
        };
        Ok(BorrowerAddress {
            address,
            unconfidential: info.unconfidential,
            x_only_public_key,
        })
    }
}

/// The service issuing contracts
#[async_trait]
pub trait ContractService: Send + Sync {
    /// Whether the service is online
    async fn ping(&self) -> Result<bool, Error>;

    /// Terms and covenant address of a contract borrowing `amount` (smallest unit) of `asset`
    async fn preview(
        &self,
        amount: u64,
        asset: AssetId,
        oracle_public_key: &str,
        borrower_public_key: &str,
    ) -> Result<Preview, Error>;

    /// Propose a contract, returns the base64 PSET with the covenant output appended
    async fn propose_contract(&self, request: &ProposeContractRequest) -> Result<String, Error>;
}

/// Extract the error message from the body of a failed HTTP response.
///
/// Uses the `error` field of a json object, the string itself of a json string, or the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => match map.get("error") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Object(e)) => match e.get("message") {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => serde_json::Value::Object(e.clone()).to_string(),
            },
            Some(v) => v.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::error_message;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error":"bad amount"}"#), "bad amount");
        assert_eq!(
            error_message(r#"{"error":{"code":-5,"message":"Invalid address"}}"#),
            "Invalid address"
        );
        assert_eq!(error_message(r#""plain json string""#), "plain json string");
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
        assert_eq!(error_message(r#"{"other":1}"#), r#"{"other":1}"#);
    }
}

//! In memory implementations of the parties a borrow talks to

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use fuji_borrow::amount::{from_smallest_unit, to_smallest_unit};
use fuji_borrow::elements::bitcoin::PrivateKey;
use fuji_borrow::elements::pset::{Input, Output, PartiallySignedTransaction};
use fuji_borrow::elements::{Address, AssetId, OutPoint, Transaction, TxOut, Txid};
use fuji_borrow::oracles::{PriceAggregator, PriceAttestation};
use fuji_borrow::{
    AddressInfo, BlockchainInfo, ContractParams, ContractService, Decimal, Error, Preview,
    ProposeContractRequest, PsetOutput, UnspentCoin, WalletGateway,
};
use fuji_test_util::*;

/// Seed of the address the contract service uses for covenants
pub const CONTRACT_SEED: u8 = 77;

/// Seed of the output appended by the contract service
pub const ISSUANCE_SEED: u8 = 88;

pub const ORACLE_PUBLIC_KEY: &str =
    "c304c3b5805eecff054c319c545dc6ac2ad44eb70f79dd9570e284c5a62c0f9e";

#[derive(Default)]
pub struct MockWallet {
    coins: Vec<(UnspentCoin, Transaction)>,
    keys: HashMap<String, PrivateKey>,
    issued: Mutex<Vec<u8>>,
    pub created: Mutex<Vec<PartiallySignedTransaction>>,
    pub broadcasts: AtomicUsize,
    pub key_requests: AtomicUsize,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a confidential coin of `sats` locked to the key of `seed`, the wallet knows the key
    pub fn with_coin(self, seed: u8, sats: u64) -> Self {
        let txout = confidential_txout(test_script(seed));
        self.with_txout(txout, sats).with_key(seed)
    }

    /// Add a coin of `sats` locked to the key of `seed`, the wallet does not know the key
    pub fn with_foreign_coin(self, seed: u8, sats: u64) -> Self {
        let txout = confidential_txout(test_script(seed));
        self.with_txout(txout, sats)
    }

    /// Add a coin without range proof
    pub fn with_explicit_coin(self, seed: u8, sats: u64) -> Self {
        let txout = explicit_txout(test_script(seed), sats, regtest_policy_asset());
        self.with_txout(txout, sats).with_key(seed)
    }

    fn with_txout(mut self, txout: TxOut, sats: u64) -> Self {
        let salt = self.coins.len() as u32;
        let tx = funding_tx(vec![txout], salt);
        let coin = UnspentCoin {
            txid: tx.txid(),
            vout: 0,
            asset: regtest_policy_asset().to_string(),
            amount: from_smallest_unit(sats),
            asset_blinder: blinder_hex(salt as u8),
            amount_blinder: blinder_hex(100 + salt as u8),
        };
        self.coins.push((coin, tx));
        self
    }

    fn with_key(mut self, seed: u8) -> Self {
        self.keys
            .insert(test_address(seed).to_string(), test_private_key(seed));
        self
    }

    pub fn issued(&self) -> Vec<u8> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletGateway for MockWallet {
    async fn list_unspent(
        &self,
        asset: AssetId,
        _minimum_sum: Decimal,
    ) -> Result<Vec<UnspentCoin>, Error> {
        Ok(self
            .coins
            .iter()
            .filter(|(c, _)| c.asset == asset.to_string())
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn get_transaction(&self, txid: Txid) -> Result<Transaction, Error> {
        self.coins
            .iter()
            .find(|(c, _)| c.txid == txid)
            .map(|(_, tx)| tx.clone())
            .ok_or_else(|| Error::Transport("Invalid or non-wallet transaction id".to_string()))
    }

    async fn get_new_address(&self) -> Result<Address, Error> {
        let mut issued = self.issued.lock().unwrap();
        let seed = 100 + issued.len() as u8;
        issued.push(seed);
        Ok(test_address(seed))
    }

    async fn get_address_info(&self, address: &Address) -> Result<AddressInfo, Error> {
        let seed = self
            .issued()
            .into_iter()
            .find(|s| &test_address(*s) == address)
            .ok_or_else(|| Error::Transport("address not issued".to_string()))?;
        Ok(AddressInfo {
            address: Some(address.to_string()),
            pubkey: test_public_key(seed).to_string(),
            unconfidential: address.to_string(),
        })
    }

    async fn create_pset(
        &self,
        inputs: &[OutPoint],
        outputs: &[PsetOutput],
    ) -> Result<PartiallySignedTransaction, Error> {
        let mut pset = PartiallySignedTransaction::new_v2();
        for outpoint in inputs {
            pset.add_input(Input::from_prevout(*outpoint));
        }
        for o in outputs {
            let mut output = Output::new_explicit(
                o.address.script_pubkey(),
                to_smallest_unit(o.amount)?,
                o.asset,
                None,
            );
            output.blinder_index = o.blinder_index;
            pset.add_output(output);
        }
        self.created.lock().unwrap().push(pset.clone());
        Ok(pset)
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, Error> {
        Ok(BlockchainInfo {
            chain: "elementsregtest".to_string(),
        })
    }

    async fn dump_private_key(&self, address: &Address) -> Result<PrivateKey, Error> {
        self.key_requests.fetch_add(1, Ordering::SeqCst);
        self.keys
            .get(&address.to_string())
            .copied()
            .ok_or_else(|| Error::Transport("Address does not refer to a key".to_string()))
    }

    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Txid, Error> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(tx.txid())
    }
}

pub fn contract_params(amount: u64) -> ContractParams {
    let value = serde_json::json!({
        "borrowAsset": regtest_fusd().to_string(),
        "borrowAmount": amount,
        "issuerPublicKey": "02aa",
        "borrowerPublicKey": "bb",
        "oraclePublicKey": ORACLE_PUBLIC_KEY,
        "priceLevel": "AAAAAAAAdTA=",
        "setupTimestamp": "AAABjZ0sTgA=",
        "treasuryPublicKey": "03cc",
    });
    serde_json::from_value(value).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    Honest,
    Offline,
    Unreachable,
    Reject,
    TamperCovenant,
    AppendNothing,
}

pub struct MockService {
    mode: ServiceMode,
    pub pings: AtomicUsize,
    pub previews: Mutex<Vec<(u64, AssetId, String, String)>>,
    pub proposals: Mutex<Vec<ProposeContractRequest>>,
}

impl MockService {
    pub fn new(mode: ServiceMode) -> Self {
        MockService {
            mode,
            pings: AtomicUsize::new(0),
            previews: Mutex::new(vec![]),
            proposals: Mutex::new(vec![]),
        }
    }

    pub fn proposals(&self) -> Vec<ProposeContractRequest> {
        self.proposals.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractService for MockService {
    async fn ping(&self) -> Result<bool, Error> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ServiceMode::Offline => Ok(false),
            ServiceMode::Unreachable => Err(Error::Transport("connection refused".to_string())),
            _ => Ok(true),
        }
    }

    async fn preview(
        &self,
        amount: u64,
        asset: AssetId,
        oracle_public_key: &str,
        borrower_public_key: &str,
    ) -> Result<Preview, Error> {
        self.previews.lock().unwrap().push((
            amount,
            asset,
            oracle_public_key.to_string(),
            borrower_public_key.to_string(),
        ));
        Ok(Preview {
            address: test_address(CONTRACT_SEED).to_string(),
            contract_params: contract_params(amount),
        })
    }

    async fn propose_contract(&self, request: &ProposeContractRequest) -> Result<String, Error> {
        self.proposals.lock().unwrap().push(request.clone());
        if self.mode == ServiceMode::Reject {
            return Err(Error::Transport("attestation expired".to_string()));
        }
        let mut pset = PartiallySignedTransaction::from_str(&request.partial_transaction)
            .map_err(|e| Error::Transport(e.to_string()))?;
        match self.mode {
            ServiceMode::AppendNothing => return Ok(pset.to_string()),
            ServiceMode::TamperCovenant => pset.outputs_mut()[0].amount = Some(1),
            _ => (),
        }
        pset.add_output(Output::new_explicit(
            test_script(ISSUANCE_SEED),
            request.contract_params.borrow_amount,
            regtest_fusd(),
            None,
        ));
        Ok(pset.to_string())
    }
}

pub struct MockAggregator {
    price: Result<Decimal, String>,
    pub calls: AtomicUsize,
}

impl MockAggregator {
    pub fn new(price: u64) -> Self {
        MockAggregator {
            price: Ok(Decimal::from(price)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        MockAggregator {
            price: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PriceAggregator for MockAggregator {
    async fn highest_price(
        &self,
        oracles: &[String],
        _pair: &str,
    ) -> Result<PriceAttestation, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!oracles.is_empty());
        let price = self.price.clone().map_err(Error::Transport)?;
        Ok(PriceAttestation {
            price,
            signature: "3045022100signature".to_string(),
            oracle_public_key: ORACLE_PUBLIC_KEY.to_string(),
        })
    }
}

mod canned;

pub use canned::{CannedRequest, CannedResponse, CannedServer};

use std::str::FromStr;

use elements::bitcoin::{self, secp256k1, PrivateKey, PublicKey};
use elements::confidential::{Asset, Nonce, Value};
use elements::encode::deserialize;
use elements::hashes::Hash;
use elements::hex::FromHex;
use elements::pset::{Input, Output, PartiallySignedTransaction};
use elements::{
    Address, AddressParams, AssetId, AssetIssuance, LockTime, OutPoint, Script, Sequence,
    Transaction, TxIn, TxInWitness, TxOut, TxOutWitness, Txid,
};

pub use fuji_common::Network;

pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn regtest_policy_asset() -> AssetId {
    AssetId::from_str("5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225").unwrap()
}

pub fn regtest_fusd() -> AssetId {
    AssetId::from_str("2dcf5a8834645654911964ec3602426fd3b9b4017554d3f9c19403e7fc1411d3").unwrap()
}

/// A deterministic private key, different for every `seed` in `1..=255`
pub fn test_private_key(seed: u8) -> PrivateKey {
    let secret = secp256k1::SecretKey::from_slice(&[seed; 32]).unwrap();
    PrivateKey::new(secret, bitcoin::Network::Regtest)
}

pub fn test_public_key(seed: u8) -> PublicKey {
    let secp = secp256k1::Secp256k1::new();
    test_private_key(seed).public_key(&secp)
}

/// Unconfidential regtest p2wpkh address of [`test_private_key()`]
pub fn test_address(seed: u8) -> Address {
    Address::p2wpkh(&test_public_key(seed), None, &AddressParams::ELEMENTS)
}

pub fn test_script(seed: u8) -> Script {
    test_address(seed).script_pubkey()
}

/// A real transaction with a single confidential output, carrying commitments and a range proof
pub fn confidential_tx() -> Transaction {
    let hex = include_str!("../test_data/confidential_tx.hex");
    let bytes = Vec::<u8>::from_hex(hex.trim()).unwrap();
    deserialize(&bytes).unwrap()
}

/// A confidential output locked to `script`.
///
/// Commitments and range proof come from [`confidential_tx()`], they do not depend on the script,
/// so the output is spendable by the key of the script for signing purposes.
pub fn confidential_txout(script: Script) -> TxOut {
    let mut txout = confidential_tx().output[0].clone();
    assert!(txout.witness.rangeproof.is_some());
    txout.script_pubkey = script;
    txout
}

pub fn explicit_txout(script: Script, satoshi: u64, asset: AssetId) -> TxOut {
    TxOut {
        asset: Asset::Explicit(asset),
        value: Value::Explicit(satoshi),
        nonce: Nonce::Null,
        script_pubkey: script,
        witness: TxOutWitness::default(),
    }
}

/// A transaction with the given outputs spending a made up outpoint, `salt` changes its txid
pub fn funding_tx(outputs: Vec<TxOut>, salt: u32) -> Transaction {
    Transaction {
        version: 2,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::all_zeros(), salt),
            is_pegin: false,
            script_sig: Script::new(),
            sequence: Sequence::MAX,
            asset_issuance: AssetIssuance::default(),
            witness: TxInWitness::default(),
        }],
        output: outputs,
    }
}

/// A PSET spending a confidential output locked to `prevout_script`, with a single explicit output
pub fn pset_spending(prevout_script: Script) -> PartiallySignedTransaction {
    let funding = funding_tx(vec![confidential_txout(prevout_script)], 0);
    let mut pset = PartiallySignedTransaction::new_v2();
    let mut input = Input::from_prevout(OutPoint::new(funding.txid(), 0));
    input.witness_utxo = Some(funding.output[0].clone());
    pset.add_input(input);
    pset.add_output(Output::new_explicit(
        test_script(9),
        1000,
        regtest_policy_asset(),
        None,
    ));
    pset
}

/// Hex of a blinder as a node would show it, 32 bytes in display order
pub fn blinder_hex(byte: u8) -> String {
    let mut s = String::with_capacity(64);
    for i in 0..32u8 {
        s.push_str(&format!("{:02x}", byte.wrapping_add(i)));
    }
    s
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixtures() {
        let tx = confidential_tx();
        assert_eq!(tx.output.len(), 1);
        let txout = confidential_txout(test_script(1));
        assert!(txout.value.is_confidential());
        assert_eq!(txout.script_pubkey, test_script(1));
        assert_ne!(test_script(1), test_script(2));
        assert_ne!(funding_tx(vec![], 0).txid(), funding_tx(vec![], 1).txid());
        assert_eq!(blinder_hex(0).len(), 64);
        assert!(blinder_hex(0).starts_with("000102"));
        assert_eq!(
            regtest_policy_asset(),
            Network::ElementsRegtest.policy_asset()
        );
    }
}

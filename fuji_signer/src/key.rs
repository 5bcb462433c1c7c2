use elements_miniscript::{
    bitcoin::{PrivateKey, PublicKey},
    elements::{
        hashes::Hash, pset::PartiallySignedTransaction, sighash::SighashCache, Address,
        AddressParams, BlockHash, EcdsaSighashType, Script,
    },
    elementssig_to_rawsig,
    psbt::PsbtExt,
};

use crate::EC;

/// Possible errors when signing an input with [`KeySigner`]
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum SignError {
    #[error(transparent)]
    Pset(#[from] elements_miniscript::elements::pset::Error),

    #[error(transparent)]
    Sighash(#[from] elements_miniscript::psbt::SighashError),

    #[error("Input {0} does not exist")]
    InputIndex(usize),

    #[error("Input {0} has no witness utxo")]
    MissingWitnessUtxo(usize),

    #[error("The key does not control the script of input {idx}: {script}")]
    KeyMismatch { idx: usize, script: Script },
}

/// Signs p2wpkh inputs of a PSET with low-R ECDSA signatures
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySigner;

impl KeySigner {
    /// Create a new signer
    pub fn new() -> Self {
        KeySigner
    }

    /// Sign the input `idx` of `pset` with `key`, adding a partial signature.
    ///
    /// The key must control the script of the input witness utxo. The signature commits to the
    /// sighash type of the input, `SIGHASH_ALL` if not set.
    ///
    /// Returns `true` if a new signature has been added, `false` if one was already there for
    /// the same public key.
    pub fn sign_input(
        &self,
        pset: &mut PartiallySignedTransaction,
        idx: usize,
        key: &PrivateKey,
    ) -> Result<bool, SignError> {
        let public_key = key.public_key(&EC);
        let input = pset.inputs().get(idx).ok_or(SignError::InputIndex(idx))?;
        let script = &input
            .witness_utxo
            .as_ref()
            .ok_or(SignError::MissingWitnessUtxo(idx))?
            .script_pubkey;
        if script != &p2wpkh_script(&public_key) {
            return Err(SignError::KeyMismatch {
                idx,
                script: script.clone(),
            });
        }

        let tx = pset.extract_tx()?;
        let mut sighash_cache = SighashCache::new(&tx);
        // genesis hash is not used at all for sighash calculation
        let msg = pset
            .sighash_msg(idx, &mut sighash_cache, None, BlockHash::all_zeros())?
            .to_secp_msg();

        let input = &mut pset.inputs_mut()[idx];
        let hash_ty = input
            .sighash_type
            .map(|h| h.ecdsa_hash_ty().unwrap_or(EcdsaSighashType::All))
            .unwrap_or(EcdsaSighashType::All);
        let sig = EC.sign_ecdsa_low_r(&msg, &key.inner);
        let sig = elementssig_to_rawsig(&(sig, hash_ty));

        let inserted = input.partial_sigs.insert(public_key, sig);
        log::debug!("signed input {idx} with {public_key}");
        Ok(inserted.is_none())
    }
}

fn p2wpkh_script(public_key: &PublicKey) -> Script {
    // the script does not depend on the address params
    Address::p2wpkh(public_key, None, &AddressParams::ELEMENTS).script_pubkey()
}

#[cfg(test)]
mod test {
    use fuji_test_util::*;

    use super::*;

    #[test]
    fn sign_input() {
        let signer = KeySigner::new();
        let key = test_private_key(1);
        let mut pset = pset_spending(test_script(1));

        assert!(signer.sign_input(&mut pset, 0, &key).unwrap());
        assert_eq!(pset.inputs()[0].partial_sigs.len(), 1);
        let sig = pset.inputs()[0].partial_sigs.values().next().unwrap();
        // low-R DER signature plus the sighash byte
        assert!(sig.len() <= 71);
        assert_eq!(*sig.last().unwrap(), EcdsaSighashType::All as u8);

        // signing is deterministic, signing again does not add a signature
        let before = pset.inputs()[0].partial_sigs.clone();
        assert!(!signer.sign_input(&mut pset, 0, &key).unwrap());
        assert_eq!(before, pset.inputs()[0].partial_sigs);
    }

    #[test]
    fn sign_input_errors() {
        let signer = KeySigner::new();
        let mut pset = pset_spending(test_script(1));

        let err = signer
            .sign_input(&mut pset, 0, &test_private_key(2))
            .unwrap_err();
        assert!(matches!(err, SignError::KeyMismatch { idx: 0, .. }));

        let err = signer
            .sign_input(&mut pset, 1, &test_private_key(1))
            .unwrap_err();
        assert!(matches!(err, SignError::InputIndex(1)));

        pset.inputs_mut()[0].witness_utxo = None;
        let err = signer
            .sign_input(&mut pset, 0, &test_private_key(1))
            .unwrap_err();
        assert!(matches!(err, SignError::MissingWitnessUtxo(0)));
        assert!(pset.inputs()[0].partial_sigs.is_empty());
    }
}

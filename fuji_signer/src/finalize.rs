use elements_miniscript::{
    elements::{hashes::Hash, pset::PartiallySignedTransaction, BlockHash, Transaction},
    psbt::PsbtExt,
};

use crate::EC;

/// Possible errors when finalizing a PSET
#[derive(thiserror::Error, Debug)]
pub enum FinalizeError {
    /// Some inputs have no valid unlocking data (eg they have not been signed)
    #[error("Inputs {indexes:?} cannot be finalized: {errors}")]
    NotFinalized {
        /// Indexes of the inputs without a final script witness
        indexes: Vec<usize>,
        /// Errors reported by the finalizer
        errors: String,
    },

    /// The finalized PSET cannot be extracted to a transaction
    #[error(transparent)]
    Extract(#[from] elements_miniscript::elements::pset::Error),
}

/// Finalize every input of a PSET, extracting a broadcastable transaction.
///
/// Fails if any input cannot be finalized; partial signatures of finalized inputs are moved in
/// their final script witness.
pub fn finalize(pset: &mut PartiallySignedTransaction) -> Result<Transaction, FinalizeError> {
    // genesis_hash is only used for BIP341 (taproot) sighash computation
    let result = pset.finalize_mut(&EC, BlockHash::all_zeros());

    if let Err(errors) = result {
        // In some case "finalize" finalizes all inputs but return some error
        let not_finalized: Vec<usize> = pset
            .inputs()
            .iter()
            .enumerate()
            .filter(|(_, i)| !seems_finalized(i))
            .map(|(idx, _)| idx)
            .collect();
        if !not_finalized.is_empty() {
            log::warn!("cannot finalize inputs {not_finalized:?}: {errors:?}");
            return Err(FinalizeError::NotFinalized {
                indexes: not_finalized,
                errors: format!("{errors:?}"),
            });
        }
    }

    Ok(pset.extract_tx()?)
}

fn seems_finalized(i: &elements_miniscript::elements::pset::Input) -> bool {
    i.partial_sigs.is_empty()
        && (i
            .final_script_witness
            .as_ref()
            .is_some_and(|v| !v.is_empty())
            || i.final_script_sig.as_ref().is_some_and(|v| !v.is_empty()))
}

#[cfg(test)]
mod test {
    use elements_miniscript::elements::encode::serialize_hex;
    use fuji_test_util::*;

    use super::*;
    use crate::KeySigner;

    #[test]
    fn finalize_signed() {
        let mut pset = pset_spending(test_script(1));
        KeySigner::new()
            .sign_input(&mut pset, 0, &test_private_key(1))
            .unwrap();

        let tx = finalize(&mut pset).unwrap();
        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.output.len(), 1);
        // p2wpkh witness: signature and public key
        let witness = &tx.input[0].witness.script_witness;
        assert_eq!(witness.len(), 2);
        assert_eq!(witness[1], test_public_key(1).to_bytes());
        assert!(pset.inputs()[0].partial_sigs.is_empty());
        assert!(!serialize_hex(&tx).is_empty());
    }

    #[test]
    fn finalize_unsigned() {
        let mut pset = pset_spending(test_script(1));
        let err = finalize(&mut pset).unwrap_err();
        match err {
            FinalizeError::NotFinalized { indexes, .. } => assert_eq!(indexes, vec![0]),
            e => panic!("unexpected error {e}"),
        }
    }
}

//! The contract service receives our PSET and sends it back with one more output. Before asking,
//! we commit to what it is not allowed to touch, and we verify the PSET it returns against the
//! commitment before signing anything.

use elements::hashes::{sha256, Hash, HashEngine};
use elements::pset::{Output, PartiallySignedTransaction};

use crate::Error;

/// Commitments to the inputs and outputs of a PSET sent to the contract service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    inputs: Vec<sha256::Hash>,
    outputs: Vec<sha256::Hash>,
    /// Index, among the original outputs, of the output locking the collateral in the covenant
    covenant_index: usize,
}

impl Proposal {
    /// Commit to every input outpoint and every output of `pset`, `covenant_index` is the index
    /// of the output locking the collateral
    pub fn commit(pset: &PartiallySignedTransaction, covenant_index: usize) -> Result<Self, Error> {
        if covenant_index >= pset.outputs().len() {
            return Err(Error::RemoteProposal(format!(
                "covenant output {covenant_index} does not exist"
            )));
        }
        Ok(Proposal {
            inputs: pset.inputs().iter().map(input_commitment).collect(),
            outputs: pset.outputs().iter().map(output_commitment).collect(),
            covenant_index,
        })
    }

    pub fn covenant_index(&self) -> usize {
        self.covenant_index
    }

    /// Verify the PSET returned by the contract service: same inputs in the same order, every
    /// original output unchanged at its index, exactly one output appended.
    ///
    /// The covenant output is one of the original outputs, so it must be unchanged too. The
    /// appended output is the one issuing the borrowed asset, its content is up to the service.
    pub fn verify(&self, returned: &PartiallySignedTransaction) -> Result<(), Error> {
        let inputs: Vec<_> = returned.inputs().iter().map(input_commitment).collect();
        if inputs != self.inputs {
            return Err(Error::RemoteProposal(
                "returned transaction changed the inputs".to_string(),
            ));
        }

        let outputs = returned.outputs();
        if outputs.len() != self.outputs.len() + 1 {
            return Err(Error::RemoteProposal(format!(
                "returned transaction has {} outputs, expected {}",
                outputs.len(),
                self.outputs.len() + 1
            )));
        }
        for (idx, (output, expected)) in outputs.iter().zip(&self.outputs).enumerate() {
            if &output_commitment(output) != expected {
                let which = if idx == self.covenant_index {
                    "covenant output"
                } else {
                    "output"
                };
                return Err(Error::RemoteProposal(format!(
                    "returned transaction changed {which} {idx}"
                )));
            }
        }
        Ok(())
    }
}

fn input_commitment(input: &elements::pset::Input) -> sha256::Hash {
    let mut engine = sha256::Hash::engine();
    engine.input(&input.previous_txid.to_byte_array());
    engine.input(&input.previous_output_index.to_le_bytes());
    sha256::Hash::from_engine(engine)
}

fn output_commitment(output: &Output) -> sha256::Hash {
    let mut engine = sha256::Hash::engine();
    let script = output.script_pubkey.as_bytes();
    engine.input(&(script.len() as u64).to_le_bytes());
    engine.input(script);
    match output.asset {
        Some(asset) => {
            engine.input(&[1]);
            engine.input(&asset.into_inner().to_byte_array());
        }
        None => engine.input(&[0]),
    }
    match output.amount {
        Some(amount) => {
            engine.input(&[1]);
            engine.input(&amount.to_le_bytes());
        }
        None => engine.input(&[0]),
    }
    sha256::Hash::from_engine(engine)
}

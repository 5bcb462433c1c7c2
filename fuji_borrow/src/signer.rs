use elements::encode::serialize_hex;
use elements::pset::PartiallySignedTransaction;
use elements::Address;
use fuji_common::Network;
use fuji_signer::KeySigner;

use crate::clients::WalletGateway;
use crate::model::FinalTransaction;
use crate::Error;

/// What happened to a single input while signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Signed,

    /// Not ours, or we cannot tell: somebody else is expected to sign it
    Skipped(String),

    /// Ours, but the signature could not be produced
    Failed(String),
}

/// Signs the inputs of a PSET controlled by the node wallet, fetching one key per input.
pub struct CooperativeSigner<'a, W: WalletGateway + ?Sized> {
    wallet: &'a W,
    signer: KeySigner,
}

impl<'a, W: WalletGateway + ?Sized> CooperativeSigner<'a, W> {
    pub fn new(wallet: &'a W) -> Self {
        Self {
            wallet,
            signer: KeySigner::new(),
        }
    }

    /// Sign every input the wallet has a key for, leaving the others untouched
    pub async fn sign(
        &self,
        pset: &mut PartiallySignedTransaction,
    ) -> Result<Vec<InputOutcome>, Error> {
        let chain = self.wallet.get_blockchain_info().await?.chain;
        let network = Network::detect(&chain);
        log::debug!("signing for chain {chain} as {network}");

        let mut outcomes = Vec::with_capacity(pset.inputs().len());
        for idx in 0..pset.inputs().len() {
            let outcome = self.sign_input(pset, idx, network).await;
            log::debug!("input {idx}: {outcome:?}");
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn sign_input(
        &self,
        pset: &mut PartiallySignedTransaction,
        idx: usize,
        network: Network,
    ) -> InputOutcome {
        let script = match pset.inputs()[idx].witness_utxo.as_ref() {
            Some(utxo) => utxo.script_pubkey.clone(),
            None => return InputOutcome::Skipped("no witness utxo".to_string()),
        };
        let address = match Address::from_script(&script, None, network.address_params()) {
            Some(address) => address,
            None => return InputOutcome::Skipped(format!("no address for script {script}")),
        };
        let key = match self.wallet.dump_private_key(&address).await {
            Ok(key) => key,
            Err(e) => return InputOutcome::Skipped(format!("no key for {address}: {e}")),
        };
        match self.signer.sign_input(pset, idx, &key) {
            Ok(_) => InputOutcome::Signed,
            Err(e) => InputOutcome::Failed(e.to_string()),
        }
    }

    /// Sign, then finalize and extract the transaction.
    ///
    /// Inputs not signed here must have been signed by somebody else, otherwise finalization
    /// fails.
    pub async fn sign_and_finalize(
        &self,
        mut pset: PartiallySignedTransaction,
    ) -> Result<FinalTransaction, Error> {
        let outcomes = self.sign(&mut pset).await?;
        let failed: Vec<String> = outcomes
            .iter()
            .enumerate()
            .filter_map(|(idx, o)| match o {
                InputOutcome::Failed(e) => Some(format!("input {idx}: {e}")),
                _ => None,
            })
            .collect();
        if !failed.is_empty() {
            return Err(Error::Signing(failed.join(", ")));
        }
        let signed = outcomes
            .iter()
            .filter(|o| matches!(o, InputOutcome::Signed))
            .count();
        log::info!("signed {signed} of {} inputs", outcomes.len());

        let transaction =
            fuji_signer::finalize(&mut pset).map_err(|e| Error::Finalization(e.to_string()))?;
        let hex = serialize_hex(&transaction);
        Ok(FinalTransaction { transaction, hex })
    }
}

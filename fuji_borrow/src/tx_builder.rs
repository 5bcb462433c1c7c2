use base64::Engine;
use elements::hex::FromHex;
use elements::pset::{PartiallySignedTransaction, PsbtSighashType};
use elements::{Address, AssetId, EcdsaSighashType, OutPoint, TxOut};
use fuji_common::amount::to_smallest_unit;
use fuji_common::fixed_fee;
use rust_decimal::Decimal;

use crate::clients::WalletGateway;
use crate::model::{PsetOutput, UnblindDescriptor, UnspentCoin};
use crate::Error;

/// Index of the output locking the collateral in the contract
pub const COVENANT_OUTPUT_INDEX: usize = 0;

/// A coin spent by the collateral transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInput {
    /// Index of the input in the transaction
    pub index: usize,
    pub coin: UnspentCoin,

    /// The output spent, with commitments and range proof
    pub prevout: TxOut,
}

impl SelectedInput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.coin.txid, self.coin.vout)
    }
}

/// The unsigned collateral transaction
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub pset: PartiallySignedTransaction,

    /// Unblinding data of the inputs, aligned with them
    pub unblind_descriptors: Vec<UnblindDescriptor>,
    pub inputs: Vec<SelectedInput>,
    pub outputs: Vec<PsetOutput>,

    /// Fractional amount of the change output
    pub change: Decimal,

    /// Fractional sum of the selected coins
    pub total_selected: Decimal,
}

/// Builds the transaction locking the collateral in the contract address, with the node wallet
/// providing coins, change address and the PSET skeleton.
pub struct CollateralTxBuilder<'a, W: WalletGateway + ?Sized> {
    wallet: &'a W,
}

impl<'a, W: WalletGateway + ?Sized> CollateralTxBuilder<'a, W> {
    pub fn new(wallet: &'a W) -> Self {
        Self { wallet }
    }

    /// Build a PSET sending `contract_amount` (fractional) of `collateral_asset` to
    /// `contract_address`, at [`COVENANT_OUTPUT_INDEX`], and the change back to the wallet.
    ///
    /// The fee is fixed, see [`fuji_common::FIXED_FEE_SATS`]. Every input has witness utxo,
    /// utxo range proof and sighash type set.
    pub async fn build(
        &self,
        contract_address: &Address,
        contract_amount: Decimal,
        collateral_asset: AssetId,
    ) -> Result<BuiltTransaction, Error> {
        let change_address = self.wallet.get_new_address().await?;

        let coins = self
            .wallet
            .list_unspent(collateral_asset, contract_amount)
            .await?;
        if coins.is_empty() {
            return Err(Error::InsufficientFunds(format!(
                "no coins of {collateral_asset} to lock {contract_amount}"
            )));
        }

        let mut inputs = Vec::with_capacity(coins.len());
        let mut unblind_descriptors = Vec::with_capacity(coins.len());
        let mut total_selected = Decimal::ZERO;
        for (index, coin) in coins.into_iter().enumerate() {
            let tx = self.wallet.get_transaction(coin.txid).await?;
            if tx.txid() != coin.txid {
                return Err(Error::UnexpectedReturn(format!(
                    "asked transaction {} got {}",
                    coin.txid,
                    tx.txid()
                )));
            }
            let prevout = tx.output.get(coin.vout as usize).cloned().ok_or_else(|| {
                Error::UnexpectedReturn(format!("{} has no output {}", coin.txid, coin.vout))
            })?;
            unblind_descriptors.push(unblind_descriptor(index, &coin)?);
            total_selected = total_selected
                .checked_add(coin.amount)
                .ok_or_else(|| Error::UnexpectedReturn("overflow summing coins".to_string()))?;
            inputs.push(SelectedInput {
                index,
                coin,
                prevout,
            });
        }

        let change = total_selected - contract_amount - fixed_fee();
        if change.is_sign_negative() && !change.is_zero() {
            return Err(Error::InsufficientFunds(format!(
                "selected {total_selected}, needed {contract_amount} plus fee {}",
                fixed_fee()
            )));
        }
        log::debug!(
            "collateral tx: {} inputs, total {total_selected}, change {change}",
            inputs.len()
        );

        let outputs = vec![
            PsetOutput {
                address: contract_address.clone(),
                amount: contract_amount,
                asset: collateral_asset,
                blinder_index: None,
            },
            PsetOutput {
                address: change_address,
                amount: change,
                asset: collateral_asset,
                blinder_index: Some(0),
            },
        ];

        let outpoints: Vec<OutPoint> = inputs.iter().map(SelectedInput::outpoint).collect();
        let mut pset = self.wallet.create_pset(&outpoints, &outputs).await?;
        enrich_inputs(&mut pset, &inputs)?;

        Ok(BuiltTransaction {
            pset,
            unblind_descriptors,
            inputs,
            outputs,
            change,
            total_selected,
        })
    }
}

/// Set witness utxo, utxo range proof and `SIGHASH_ALL` on every input
fn enrich_inputs(
    pset: &mut PartiallySignedTransaction,
    inputs: &[SelectedInput],
) -> Result<(), Error> {
    if pset.inputs().len() != inputs.len() {
        return Err(Error::UnexpectedReturn(format!(
            "created pset has {} inputs, expected {}",
            pset.inputs().len(),
            inputs.len()
        )));
    }
    for (idx, (input, selected)) in pset.inputs_mut().iter_mut().zip(inputs).enumerate() {
        if input.previous_txid != selected.coin.txid
            || input.previous_output_index != selected.coin.vout
        {
            return Err(Error::UnexpectedReturn(format!(
                "created pset input {idx} does not spend {}",
                selected.outpoint()
            )));
        }
        let rangeproof = selected
            .prevout
            .witness
            .rangeproof
            .clone()
            .ok_or(Error::MissingRangeProof { idx })?;
        input.witness_utxo = Some(selected.prevout.clone());
        input.in_utxo_rangeproof = Some(rangeproof);
        input.sighash_type = Some(PsbtSighashType::from(EcdsaSighashType::All));
    }
    Ok(())
}

/// Unblinding data of a coin in the encoding expected by the contract service
pub fn unblind_descriptor(index: usize, coin: &UnspentCoin) -> Result<UnblindDescriptor, Error> {
    let asset: AssetId = coin
        .asset
        .parse()
        .map_err(|e| Error::UnexpectedReturn(format!("invalid asset {}: {e}", coin.asset)))?;
    Ok(UnblindDescriptor {
        index: index as u32,
        asset: asset_to_base64(asset),
        value: to_smallest_unit(coin.amount)?.to_string(),
        asset_blinding_factor: blinder_to_base64(&coin.asset_blinder)?,
        value_blinding_factor: blinder_to_base64(&coin.amount_blinder)?,
    })
}

/// Base64 of the asset id bytes, internal order and without prefix
pub fn asset_to_base64(asset: AssetId) -> String {
    base64::prelude::BASE64_STANDARD.encode(asset.into_inner().to_byte_array())
}

/// Base64 of a blinding factor given in display order hex, as the node shows it
pub fn blinder_to_base64(hex: &str) -> Result<String, Error> {
    let mut bytes = Vec::<u8>::from_hex(hex)
        .map_err(|e| Error::UnexpectedReturn(format!("invalid blinder {hex}: {e}")))?;
    if bytes.len() != 32 {
        return Err(Error::UnexpectedReturn(format!(
            "blinder must be 32 bytes, given {}",
            bytes.len()
        )));
    }
    bytes.reverse();
    Ok(base64::prelude::BASE64_STANDARD.encode(bytes))
}

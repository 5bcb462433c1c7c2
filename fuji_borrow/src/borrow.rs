use std::fmt;
use std::str::FromStr;

use elements::pset::PartiallySignedTransaction;
use elements::Address;
use fuji_common::amount::{collateral_from_ratio, from_smallest_unit};
use rust_decimal::Decimal;

use crate::clients::{ContractService, ElementsRpcClient, FactoryClient, WalletGateway};
use crate::model::{Attestation, BorrowRequest, BorrowResult, ProposeContractRequest};
use crate::oracles::{OracleSet, PriceAggregator, PriceAttestation};
use crate::proposal::Proposal;
use crate::signer::CooperativeSigner;
use crate::tx_builder::{CollateralTxBuilder, COVENANT_OUTPUT_INDEX};
use crate::{BorrowConfig, Error};

/// Steps of a borrow operation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowState {
    Validating,
    CheckingService,
    ResolvingPrice,
    DerivingAddress,
    Previewing,
    Building,
    Proposing,
    Signing,
    Broadcasting,
    Done,
    Failed,
}

impl fmt::Display for BorrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BorrowState::Validating => "validating",
            BorrowState::CheckingService => "checking service",
            BorrowState::ResolvingPrice => "resolving price",
            BorrowState::DerivingAddress => "deriving address",
            BorrowState::Previewing => "previewing",
            BorrowState::Building => "building",
            BorrowState::Proposing => "proposing",
            BorrowState::Signing => "signing",
            BorrowState::Broadcasting => "broadcasting",
            BorrowState::Done => "done",
            BorrowState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Borrows the synthetic asset locking collateral of the node wallet in a contract issued by the
/// contract service.
///
/// Every call goes through the wallet, the service and the aggregator given at construction, use
/// [`Borrower::from_config()`] for the HTTP implementations.
pub struct Borrower<W, S, A> {
    config: BorrowConfig,
    wallet: W,
    service: S,
    aggregator: A,
}

impl Borrower<ElementsRpcClient, FactoryClient, OracleSet> {
    /// A borrower talking to the Elements node, the contract service and the oracles of `config`
    pub fn from_config(config: BorrowConfig) -> Result<Self, Error> {
        let wallet = ElementsRpcClient::from_config(&config)?;
        let service = FactoryClient::from_config(&config)?;
        let aggregator = OracleSet::new(config.http_timeout())?;
        Ok(Self::new(config, wallet, service, aggregator))
    }
}

impl<W, S, A> Borrower<W, S, A>
where
    W: WalletGateway,
    S: ContractService,
    A: PriceAggregator,
{
    pub fn new(config: BorrowConfig, wallet: W, service: S, aggregator: A) -> Self {
        Self {
            config,
            wallet,
            service,
            aggregator,
        }
    }

    pub fn config(&self) -> &BorrowConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    /// Borrow `request.amount` of the configured synthetic asset.
    ///
    /// The transaction is broadcast only if enabled in the configuration, in that case the
    /// result has the txid. There are no retries: the first failing step fails the operation.
    pub async fn borrow(&self, request: BorrowRequest) -> Result<BorrowResult, Error> {
        let mut state = BorrowState::Validating;
        match self.run(&request, &mut state).await {
            Ok(result) => {
                transition(&mut state, BorrowState::Done);
                log::info!("borrowed {}, txid {:?}", request.amount, result.txid);
                Ok(result)
            }
            Err(e) => {
                log::warn!("borrow failed while {state}: {e}");
                transition(&mut state, BorrowState::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &BorrowRequest,
        state: &mut BorrowState,
    ) -> Result<BorrowResult, Error> {
        log::debug!("borrow state: {state}");
        validate(request)?;
        let borrow_asset = self.config.borrow_asset_id()?;
        let collateral_asset = self.config.collateral_asset_id();

        transition(state, BorrowState::CheckingService);
        match self.service.ping().await {
            Ok(true) => (),
            Ok(false) => {
                return Err(Error::ServiceUnavailable(
                    "ping returned an error status".to_string(),
                ))
            }
            Err(e) => return Err(Error::ServiceUnavailable(e.to_string())),
        }

        transition(state, BorrowState::ResolvingPrice);
        let attestation = self.resolve_price(&request.oracles).await?;

        transition(state, BorrowState::DerivingAddress);
        let borrower = self.wallet.borrower_address().await?;
        log::debug!("borrower address {}", borrower.address);

        transition(state, BorrowState::Previewing);
        let preview = self
            .service
            .preview(
                request.amount,
                borrow_asset,
                &attestation.oracle_public_key,
                &borrower.x_only_public_key,
            )
            .await?;
        let contract_address = Address::from_str(&preview.address).map_err(|e| {
            Error::UnexpectedReturn(format!("invalid contract address {}: {e}", preview.address))
        })?;

        transition(state, BorrowState::Building);
        let collateral =
            collateral_from_ratio(request.amount, request.collateral_ratio, attestation.price)?;
        if collateral == 0 {
            return Err(Error::Validation(format!(
                "amount {} is too small to require any collateral",
                request.amount
            )));
        }
        log::debug!("collateral {collateral} at price {}", attestation.price);
        let built = CollateralTxBuilder::new(&self.wallet)
            .build(
                &contract_address,
                from_smallest_unit(collateral),
                collateral_asset,
            )
            .await?;

        transition(state, BorrowState::Proposing);
        let proposal = Proposal::commit(&built.pset, COVENANT_OUTPUT_INDEX)?;
        let propose = ProposeContractRequest {
            partial_transaction: built.pset.to_string(),
            borrower_address: borrower.address.to_string(),
            collateral_amount: collateral,
            collateral_asset: collateral_asset.to_string(),
            contract_params: preview.contract_params,
            attestation: Attestation::from_signature(&attestation.signature),
            covenant_output_index_in_transaction: proposal.covenant_index() as u32,
            blinders_of_collateral_inputs: built.unblind_descriptors,
        };
        let returned = self
            .service
            .propose_contract(&propose)
            .await
            .map_err(Error::into_remote_proposal)?;
        let returned = PartiallySignedTransaction::from_str(&returned).map_err(|e| {
            Error::RemoteProposal(format!("invalid partial transaction returned: {e}"))
        })?;
        proposal.verify(&returned)?;

        transition(state, BorrowState::Signing);
        let signed = CooperativeSigner::new(&self.wallet)
            .sign_and_finalize(returned)
            .await?;

        let txid = if self.config.is_broadcast() {
            transition(state, BorrowState::Broadcasting);
            Some(self.wallet.send_raw_transaction(&signed.transaction).await?)
        } else {
            None
        };

        Ok(BorrowResult {
            txid,
            hex: signed.hex,
        })
    }

    async fn resolve_price(&self, oracles: &[String]) -> Result<PriceAttestation, Error> {
        let attestation = self
            .aggregator
            .highest_price(oracles, self.config.currency_pair())
            .await
            .map_err(|e| match e {
                Error::Oracle(_) => e,
                e => Error::Oracle(e.to_string()),
            })?;
        if attestation.price <= Decimal::ZERO {
            return Err(Error::Oracle(format!("invalid price {}", attestation.price)));
        }
        log::debug!(
            "price {} from oracle {}",
            attestation.price,
            attestation.oracle_public_key
        );
        Ok(attestation)
    }

    /// Repay the borrowed amount and unlock the collateral
    pub async fn redeem(&self) -> Result<BorrowResult, Error> {
        Err(Error::NotImplemented("redeem"))
    }

    /// Move the contract to a different collateral ratio
    pub async fn update_collateral(
        &self,
        _collateral_ratio: Decimal,
    ) -> Result<BorrowResult, Error> {
        Err(Error::NotImplemented("update_collateral"))
    }
}

fn transition(state: &mut BorrowState, next: BorrowState) {
    log::debug!("borrow state: {state} -> {next}");
    *state = next;
}

fn validate(request: &BorrowRequest) -> Result<(), Error> {
    if request.amount == 0 {
        return Err(Error::Validation("amount must be positive".to_string()));
    }
    if request.collateral_ratio <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "collateral ratio must be positive, given {}",
            request.collateral_ratio
        )));
    }
    if request.oracles.is_empty() {
        return Err(Error::Validation("no oracles given".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn request(amount: u64, ratio: i64, oracles: &[&str]) -> BorrowRequest {
        BorrowRequest {
            amount,
            collateral_ratio: Decimal::from(ratio),
            oracles: oracles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate() {
        validate(&request(1, 150, &["@fuji/btc-usd"])).unwrap();
        for r in [
            request(0, 150, &["@fuji/btc-usd"]),
            request(1, 0, &["@fuji/btc-usd"]),
            request(1, -1, &["@fuji/btc-usd"]),
            request(1, 150, &[]),
        ] {
            assert!(matches!(validate(&r), Err(Error::Validation(_))));
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(BorrowState::ResolvingPrice.to_string(), "resolving price");
        let mut state = BorrowState::Validating;
        transition(&mut state, BorrowState::CheckingService);
        assert_eq!(state, BorrowState::CheckingService);
    }
}

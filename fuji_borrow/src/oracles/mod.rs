//! # Oracles
//!
//! Price attestations of the collateral against the borrowed asset, signed by oracles.
//!
//! A borrow asks several oracles at once and uses the attestation with the highest price.

mod sources;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use sources::{OracleName, PriceOracle};

use crate::Error;

/// A signed price, with the x-only public key of the oracle that signed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAttestation {
    pub price: Decimal,
    pub signature: String,

    /// Hex of the oracle x-only public key
    pub oracle_public_key: String,
}

/// Resolves a price from a set of oracles
#[async_trait]
pub trait PriceAggregator: Send + Sync {
    /// The attestation with the highest price among the ones of `oracles` for `pair`.
    ///
    /// Fails if any of the oracles fails.
    async fn highest_price(&self, oracles: &[String], pair: &str)
        -> Result<PriceAttestation, Error>;
}

/// The known oracles, queried over HTTP
pub struct OracleSet {
    client: reqwest::Client,
    oracles: HashMap<String, PriceOracle>,
}

impl OracleSet {
    /// The oracles currently available, see [`OracleName`]
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let mut set = Self::empty(timeout)?;
        set.register(PriceOracle::fuji());
        Ok(set)
    }

    /// A set with no oracles
    pub fn empty(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(OracleSet {
            client,
            oracles: HashMap::new(),
        })
    }

    /// Add an oracle, replacing one with the same name
    pub fn register(&mut self, oracle: PriceOracle) {
        self.oracles.insert(oracle.name().to_string(), oracle);
    }

    pub fn get(&self, name: &str) -> Result<&PriceOracle, Error> {
        self.oracles.get(name).ok_or_else(|| {
            Error::Oracle(format!(
                "Oracle {name} not available this time. It can be temporarily down or not \
                 supported yet for this network."
            ))
        })
    }
}

#[async_trait]
impl PriceAggregator for OracleSet {
    async fn highest_price(
        &self,
        oracles: &[String],
        pair: &str,
    ) -> Result<PriceAttestation, Error> {
        let oracles = oracles
            .iter()
            .map(|name| self.get(name))
            .collect::<Result<Vec<_>, _>>()?;

        let tasks: Vec<_> = oracles
            .into_iter()
            .map(|oracle| {
                let client = self.client.clone();
                async move { oracle.last_price_attestation(&client, pair).await }
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        let attestations = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        highest(attestations)
    }
}

/// The attestation with the highest price, the first one on ties
pub fn highest(attestations: Vec<PriceAttestation>) -> Result<PriceAttestation, Error> {
    let mut iter = attestations.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::Oracle("no oracles given".to_string()))?;
    Ok(iter.fold(first, |highest, current| {
        if current.price > highest.price {
            current
        } else {
            highest
        }
    }))
}

use std::str::FromStr;

use elements::{AddressParams, AssetId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::amount::from_smallest_unit;

const LIQUID_POLICY_ASSET_STR: &str =
    "6f0279e9ed041c3d710a9f57d0c02928416460c4b722ae3457a11eec381c526d";
const LIQUID_TESTNET_POLICY_ASSET_STR: &str =
    "144c654344aa716d6f3abcc1ca90e5641e4e2a7f633bc09fe3baf64585819a49";
const LIQUID_REGTEST_POLICY_ASSET_STR: &str =
    "5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225";

const LIQUID_TESTNET_FUSD_STR: &str =
    "0d86b2f6a8c3b02a8c7c8836b83a081e68b7e2b4bcdfc58981fc5486f59f7518";
const LIQUID_REGTEST_FUSD_STR: &str =
    "2dcf5a8834645654911964ec3602426fd3b9b4017554d3f9c19403e7fc1411d3";

/// Fee paid by the collateral transaction, in satoshi of the policy asset.
///
/// The fee is not estimated, every collateral transaction pays this amount.
pub const FIXED_FEE_SATS: u64 = 500;

/// [`FIXED_FEE_SATS`] in its fractional form (0.000005)
pub fn fixed_fee() -> rust_decimal::Decimal {
    from_smallest_unit(FIXED_FEE_SATS)
}

/// The network of the elements blockchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Liquid mainnet
    Liquid,
    /// Liquid testnet
    LiquidTestnet,
    /// Elements regtest, with the policy asset of the default regtest setup
    ElementsRegtest,
}

/// Assets a borrow operation deals with on a given network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTable {
    /// The collateral asset, always the policy asset (L-BTC)
    pub collateral: AssetId,

    /// The synthetic asset being borrowed (FUSD); not known on every network
    pub synthetic: Option<AssetId>,
}

impl Network {
    /// Return true if the network is mainnet.
    pub fn is_mainnet(&self) -> bool {
        self == &Self::Liquid
    }

    /// Return the policy asset for this network.
    pub fn policy_asset(&self) -> AssetId {
        let s = match self {
            Network::Liquid => LIQUID_POLICY_ASSET_STR,
            Network::LiquidTestnet => LIQUID_TESTNET_POLICY_ASSET_STR,
            Network::ElementsRegtest => LIQUID_REGTEST_POLICY_ASSET_STR,
        };
        AssetId::from_str(s).expect("can't fail on const")
    }

    /// Return the default synthetic asset, `None` on mainnet where it must be configured
    pub fn synthetic_asset(&self) -> Option<AssetId> {
        let s = match self {
            Network::Liquid => return None,
            Network::LiquidTestnet => LIQUID_TESTNET_FUSD_STR,
            Network::ElementsRegtest => LIQUID_REGTEST_FUSD_STR,
        };
        Some(AssetId::from_str(s).expect("can't fail on const"))
    }

    /// Return the default asset table for this network
    pub fn assets(&self) -> AssetTable {
        AssetTable {
            collateral: self.policy_asset(),
            synthetic: self.synthetic_asset(),
        }
    }

    /// Return the address parameters for this network to generate addresses compatible for this network.
    pub fn address_params(&self) -> &'static AddressParams {
        match self {
            Network::Liquid => &AddressParams::LIQUID,
            Network::LiquidTestnet => &AddressParams::LIQUID_TESTNET,
            Network::ElementsRegtest => &AddressParams::ELEMENTS,
        }
    }

    /// Map the `chain` field returned by the node `getblockchaininfo` call.
    ///
    /// Returns `None` if the name is not one of the known chain names.
    pub fn from_chain_name(chain: &str) -> Option<Network> {
        match chain {
            "liquidv1" => Some(Network::Liquid),
            "liquidtestnet" => Some(Network::LiquidTestnet),
            "liquidregtest" | "elementsregtest" => Some(Network::ElementsRegtest),
            _ => None,
        }
    }

    /// Like [`Network::from_chain_name()`] but falls back to look for "regtest" and "testnet" in
    /// the name, and finally to mainnet.
    pub fn detect(chain: &str) -> Network {
        if let Some(network) = Network::from_chain_name(chain) {
            return network;
        }
        let lower = chain.to_lowercase();
        if lower.contains("regtest") {
            Network::ElementsRegtest
        } else if lower.contains("testnet") {
            Network::LiquidTestnet
        } else {
            log::warn!("unknown chain name {chain:?}, assuming liquid mainnet");
            Network::Liquid
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Liquid => write!(f, "liquid"),
            Network::LiquidTestnet => write!(f, "liquid-testnet"),
            Network::ElementsRegtest => write!(f, "liquid-regtest"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liquid" => Ok(Network::Liquid),
            "liquid-testnet" => Ok(Network::LiquidTestnet),
            "liquid-regtest" => Ok(Network::ElementsRegtest),
            _ => Err(
                "invalid network, possible value are: 'liquid', 'liquid-testnet', 'liquid-regtest'"
                    .to_string(),
            ),
        }
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let string = String::deserialize(d)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use elements::hex::{FromHex, ToHex};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::PriceAttestation;
use crate::Error;

const FUJI_ORACLE_PUBLIC_KEY: &str =
    "c304c3b5805eecff054c319c545dc6ac2ad44eb70f79dd9570e284c5a62c0f9e";
const FUJI_ORACLE_BTC_USD: &str = "https://oracle.fuji.money/oracle/BTCUSD";

/// Names of the oracles a borrow request can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleName {
    FujiMoney,
    Bitfinex,
    Blockstream,
    Synonym,
}

impl OracleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleName::FujiMoney => "@fuji/btc-usd",
            OracleName::Bitfinex => "@bitfinex/btc-usd",
            OracleName::Blockstream => "@blockstream/btc-usd",
            OracleName::Synonym => "@synonym/btc-usd",
        }
    }
}

impl fmt::Display for OracleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            OracleName::FujiMoney,
            OracleName::Bitfinex,
            OracleName::Blockstream,
            OracleName::Synonym,
        ]
        .into_iter()
        .find(|n| n.as_str() == s)
        .ok_or_else(|| Error::Oracle(format!("Unknown oracle {s}")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttestationResponse {
    attestation: SignatureField,
    last_price: Decimal,
}

#[derive(Deserialize)]
struct SignatureField {
    signature: String,
}

/// An oracle publishing signed prices over HTTP, one endpoint per currency pair
#[derive(Debug, Clone)]
pub struct PriceOracle {
    name: String,
    x_only_public_key: [u8; 32],
    endpoints: HashMap<String, String>,
}

impl PriceOracle {
    /// Create a new oracle, `public_key` is either x-only (32 bytes) or compressed (33 bytes)
    pub fn new(
        name: &str,
        public_key: &[u8],
        endpoints: HashMap<String, String>,
    ) -> Result<Self, Error> {
        let x_only = match public_key.len() {
            32 => public_key,
            33 => &public_key[1..],
            n => {
                return Err(Error::Oracle(format!(
                    "Public key of oracle {name} must be 32 or 33 bytes, given {n}"
                )))
            }
        };
        let mut x_only_public_key = [0u8; 32];
        x_only_public_key.copy_from_slice(x_only);
        Ok(PriceOracle {
            name: name.to_string(),
            x_only_public_key,
            endpoints,
        })
    }

    /// The Fuji oracle
    pub fn fuji() -> Self {
        let public_key = Vec::<u8>::from_hex(FUJI_ORACLE_PUBLIC_KEY).expect("static");
        let endpoints = HashMap::from([("BTC/USD".to_string(), FUJI_ORACLE_BTC_USD.to_string())]);
        Self::new(OracleName::FujiMoney.as_str(), &public_key, endpoints).expect("static")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex of the x-only public key
    pub fn x_only_public_key(&self) -> String {
        self.x_only_public_key[..].to_hex()
    }

    /// Fetch the last signed price for `pair`
    pub async fn last_price_attestation(
        &self,
        client: &reqwest::Client,
        pair: &str,
    ) -> Result<PriceAttestation, Error> {
        let url = self.endpoints.get(pair).ok_or_else(|| {
            Error::Oracle(format!("Oracle {} does not support pair {pair}", self.name))
        })?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Oracle(e.to_string()))?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::Oracle(format!(
                "Oracle returned {} status code",
                response.status().as_u16()
            )));
        }
        let response: AttestationResponse = response
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Oracle {} invalid response: {e}", self.name)))?;
        log::debug!("oracle {} price {}", self.name, response.last_price);

        Ok(PriceAttestation {
            price: response.last_price,
            signature: response.attestation.signature,
            oracle_public_key: self.x_only_public_key(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names() {
        for name in [
            OracleName::FujiMoney,
            OracleName::Bitfinex,
            OracleName::Blockstream,
            OracleName::Synonym,
        ] {
            assert_eq!(OracleName::from_str(name.as_str()).unwrap(), name);
        }
        assert!(OracleName::from_str("@kraken/btc-usd").is_err());
    }

    #[test]
    fn test_public_key() {
        let fuji = PriceOracle::fuji();
        assert_eq!(fuji.x_only_public_key(), FUJI_ORACLE_PUBLIC_KEY);
        assert_eq!(fuji.name(), "@fuji/btc-usd");

        let mut compressed = vec![0x02];
        compressed.extend(Vec::<u8>::from_hex(FUJI_ORACLE_PUBLIC_KEY).unwrap());
        let oracle = PriceOracle::new("x", &compressed, HashMap::new()).unwrap();
        assert_eq!(oracle.x_only_public_key(), FUJI_ORACLE_PUBLIC_KEY);

        assert!(PriceOracle::new("x", &[0u8; 31], HashMap::new()).is_err());
    }
}

use std::time::Duration;

use async_trait::async_trait;
use elements::AssetId;

use super::{error_message, ContractService};
use crate::model::{Preview, ProposeContractRequest, ProposeContractResponse};
use crate::{BorrowConfig, Error};

/// HTTP client of the contract issuing service ("factory")
#[derive(Debug, Clone)]
pub struct FactoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl FactoryClient {
    /// Creates a new client using the given `url` as endpoint, eg `https://factory.fuji.money`
    pub fn new(url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BorrowConfig) -> Result<Self, Error> {
        Self::new(config.factory_endpoint(), config.http_timeout())
    }

    async fn error_from(response: reqwest::Response) -> Error {
        let status = response.status();
        match response.text().await {
            Ok(body) if !body.is_empty() => Error::Transport(error_message(&body)),
            _ => Error::Transport(format!("factory returned {status}")),
        }
    }
}

#[async_trait]
impl ContractService for FactoryClient {
    async fn ping(&self) -> Result<bool, Error> {
        let response = self
            .client
            .get(format!("{}/ping", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn preview(
        &self,
        amount: u64,
        asset: AssetId,
        oracle_public_key: &str,
        borrower_public_key: &str,
    ) -> Result<Preview, Error> {
        let url = format!("{}/preview", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("amount", amount.to_string()),
                ("asset", asset.to_string()),
                ("oracle", oracle_public_key.to_string()),
                ("borrower", borrower_public_key.to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| Error::UnexpectedReturn(format!("preview: {e}")))
    }

    async fn propose_contract(&self, request: &ProposeContractRequest) -> Result<String, Error> {
        let url = format!("{}/contracts", self.base_url);
        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let text = response.text().await?;
        let response: ProposeContractResponse = serde_json::from_str(&text)
            .map_err(|e| Error::UnexpectedReturn(format!("contracts: {e}")))?;
        Ok(response.partial_transaction)
    }
}

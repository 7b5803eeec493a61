/// REST client for UMI nodes
///
/// Talks to the node API and, on the current chain, the statistics service.
/// Endpoints and the send version come from an explicit [`NetworkConfig`].
use crate::api::types::{
    BalanceResponse, BalanceType, SendResponse, TransactionInfo, TransactionResponse,
    TransactionsResponse,
};
use crate::blockchain::{Address, Amount};
use crate::config_store::{Chain, NetworkConfig};
use crate::errors::{WalletError, WalletResult};
use crate::transaction::SignedTransaction;
use crate::wallet::Wallet;
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// HTTP client for a UMI node
pub struct UmiClient {
    client: Client,
    config: NetworkConfig,
}

impl UmiClient {
    pub fn new(config: NetworkConfig) -> WalletResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                WalletError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(UmiClient { client, config })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Account balance in minor units. An unknown account reads as zero.
    pub async fn get_balance(
        &self,
        address: &str,
        balance_type: BalanceType,
    ) -> WalletResult<BalanceResponse> {
        Address::decode(address)?;
        let url = format!("{}/api/addresses/{}/account", self.config.node_url(), address);
        let response = self.get_json(&url, &[]).await?;
        parse_balance(address, balance_type, &response)
    }

    pub async fn get_transactions(
        &self,
        address: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> WalletResult<TransactionsResponse> {
        Address::decode(address)?;
        let url = format!(
            "{}/api/addresses/{}/transactions",
            self.config.node_url(),
            address
        );
        let response = self.get_json(&url, &paging(limit, offset)).await?;
        parse_transactions(&response)
    }

    /// Incoming transfers, from the statistics service.
    pub async fn get_received_transactions(
        &self,
        address: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> WalletResult<TransactionsResponse> {
        self.stats_transactions(address, "received", limit, offset)
            .await
    }

    /// Outgoing transfers, from the statistics service.
    pub async fn get_sent_transactions(
        &self,
        address: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> WalletResult<TransactionsResponse> {
        self.stats_transactions(address, "sended", limit, offset)
            .await
    }

    pub async fn get_transaction(&self, hash: &str) -> WalletResult<TransactionResponse> {
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) || hash.is_empty() {
            return Err(WalletError::ValidationError(format!(
                "Invalid transaction hash: {}",
                hash
            )));
        }

        match self.config.chain {
            Chain::Legend => {
                let url = format!("{}/api/transactions/{}", self.config.node_url(), hash);
                let response = self.get_json(&url, &[]).await?;
                parse_node_transaction(&response)
            }
            Chain::Current => {
                let url = format!("{}/transactions/{}", self.config.stats_endpoint()?, hash);
                let response = self.get_json(&url, &[]).await?;
                Ok(serde_json::from_value(response)?)
            }
        }
    }

    /// Submit a signed transfer to the mempool.
    pub async fn send(&self, transaction: &SignedTransaction) -> WalletResult<SendResponse> {
        if transaction.version() != self.config.send_version() {
            log::warn!(
                "Sending {:?} transaction to a {:?} node",
                transaction.version(),
                self.config.chain
            );
        }

        let url = format!("{}/api/mempool", self.config.node_url());
        let body = serde_json::json!({ "data": transaction.to_base64() });
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response = read_json(status, response.text().await?)?;
        let reply: SendResponse = serde_json::from_value(response)?;

        match (&reply.error, reply.hash()) {
            (Some(error), _) => log::warn!("Node rejected transaction: {}", error.message),
            (None, Some(hash)) => log::info!("Transaction accepted: {}", hash),
            (None, None) => log::warn!("Node reply carries neither hash nor error"),
        }
        Ok(reply)
    }

    /// Build, sign and submit a transfer from the wallet's own address.
    pub async fn transfer(
        &self,
        wallet: &Wallet,
        to: &str,
        amount: Amount,
    ) -> WalletResult<SendResponse> {
        let signed = wallet.transfer(to, amount, self.config.send_version())?;
        self.send(&signed).await
    }

    async fn stats_transactions(
        &self,
        address: &str,
        direction: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> WalletResult<TransactionsResponse> {
        Address::decode(address)?;
        let url = format!(
            "{}/address/{}/transactions/{}",
            self.config.stats_endpoint()?,
            address,
            direction
        );
        let response = self.get_json(&url, &paging(limit, offset)).await?;
        parse_stats_transactions(&response)
    }

    async fn get_json(&self, url: &str, query: &[(&str, u32)]) -> WalletResult<Value> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        read_json(status, response.text().await?)
    }
}

fn paging(limit: Option<u32>, offset: Option<u32>) -> Vec<(&'static str, u32)> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
        query.push(("limit", limit));
    }
    if let Some(offset) = offset {
        query.push(("offset", offset));
    }
    query
}

/// The node reports failures in a JSON body, often with a non-2xx status.
fn read_json(status: StatusCode, body: String) -> WalletResult<Value> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => {
            Err(WalletError::NetworkError(format!("HTTP error: {}", status)))
        }
        Err(e) => Err(WalletError::InvalidResponse(format!(
            "Failed to parse response: {}",
            e
        ))),
    }
}

fn parse_balance(
    address: &str,
    balance_type: BalanceType,
    response: &Value,
) -> WalletResult<BalanceResponse> {
    let balance = if response.get("error").is_some() {
        Amount::ZERO
    } else {
        let minor_units = response
            .get("data")
            .and_then(|data| data.get(balance_type.field()))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                WalletError::InvalidResponse(format!("Missing {}", balance_type.field()))
            })?;
        Amount::from_minor_units(i128::from(minor_units))?
    };

    Ok(BalanceResponse {
        address: address.to_string(),
        balance_type,
        balance,
    })
}

fn parse_transactions(response: &Value) -> WalletResult<TransactionsResponse> {
    if response.get("error").is_some() {
        return Ok(TransactionsResponse::default());
    }

    let data = response
        .get("data")
        .ok_or_else(|| WalletError::InvalidResponse("Missing data".to_string()))?;
    Ok(serde_json::from_value(data.clone())?)
}

fn parse_stats_transactions(response: &Value) -> WalletResult<TransactionsResponse> {
    if response.get("status").and_then(Value::as_str) == Some("error") {
        return Ok(TransactionsResponse::default());
    }

    let items: Vec<TransactionInfo> = match response.get("data") {
        Some(data) => serde_json::from_value(data.clone())?,
        None => Vec::new(),
    };
    let total_count = response
        .get("limit")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);

    Ok(TransactionsResponse { total_count, items })
}

fn parse_node_transaction(response: &Value) -> WalletResult<TransactionResponse> {
    if response.get("error").is_some() {
        return Ok(TransactionResponse::not_found());
    }

    let data = response
        .get("data")
        .ok_or_else(|| WalletError::InvalidResponse("Missing data".to_string()))?;
    Ok(TransactionResponse::found(serde_json::from_value(
        data.clone(),
    )?))
}

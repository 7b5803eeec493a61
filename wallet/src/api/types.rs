use crate::blockchain::Amount;
use serde::{Deserialize, Serialize};

/// Which of the node's account balances to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceType {
    #[default]
    Confirmed,
    Unconfirmed,
    Composed,
}

impl BalanceType {
    /// Field name inside the node's account object.
    pub fn field(self) -> &'static str {
        match self {
            BalanceType::Confirmed => "confirmedBalance",
            BalanceType::Unconfirmed => "unconfirmedBalance",
            BalanceType::Composed => "composedBalance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: String,
    pub balance_type: BalanceType,
    pub balance: Amount,
}

/// A transaction as reported by the node or the statistics service.
///
/// Only the commonly used fields are typed; everything else is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub confirmed_at: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    /// Minor units.
    #[serde(default)]
    pub value: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<TransactionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendData {
    pub hash: String,
}

/// Node reply to a mempool submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub data: Option<SendData>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    pub fn hash(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.hash.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub status: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<TransactionInfo>,
}

impl TransactionResponse {
    pub fn not_found() -> Self {
        Self {
            status: "error".to_string(),
            code: Some(500),
            data: None,
        }
    }

    pub fn found(data: TransactionInfo) -> Self {
        Self {
            status: "success".to_string(),
            code: None,
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success" && self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_info_keeps_unknown_fields() {
        let info: TransactionInfo = serde_json::from_str(
            r#"{
                "hash": "ab12",
                "height": 7,
                "type": "send",
                "senderAddress": "umi1a",
                "recipientAddress": "umi1b",
                "value": 1,
                "fee": 0
            }"#,
        )
        .unwrap();

        assert_eq!(info.kind.as_deref(), Some("send"));
        assert_eq!(info.value, Some(1));
        assert_eq!(info.extra.get("fee"), Some(&serde_json::json!(0)));
        assert_eq!(info.confirmed_at, None);
    }

    #[test]
    fn test_send_response_variants() {
        let ok: SendResponse = serde_json::from_str(r#"{"data":{"hash":"ff00"}}"#).unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.hash(), Some("ff00"));

        let rejected: SendResponse =
            serde_json::from_str(r#"{"error":{"code":400,"message":"invalid signature"}}"#)
                .unwrap();
        assert!(!rejected.is_success());
        assert_eq!(rejected.error.unwrap().message, "invalid signature");
    }

    #[test]
    fn test_balance_type_fields() {
        assert_eq!(BalanceType::default().field(), "confirmedBalance");
        assert_eq!(BalanceType::Composed.field(), "composedBalance");
        assert_eq!(
            serde_json::to_value(BalanceType::Unconfirmed).unwrap(),
            "unconfirmed"
        );
    }
}

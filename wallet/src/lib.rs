// lib.rs - UMI wallet toolkit: keys, addresses, transfers and node access

pub mod api;
pub mod blockchain;
pub mod blockchain_client;
pub mod config_store;
pub mod crypto;
pub mod errors;
pub mod message;
pub mod transaction;
pub mod wallet;

// Re-export common types
pub use api::types::{
    BalanceResponse, BalanceType, SendResponse, TransactionInfo, TransactionResponse,
    TransactionsResponse,
};
pub use blockchain::{decode_address, encode_address, to_public_key, Address, Amount, Prefix};
pub use blockchain_client::UmiClient;
pub use config_store::{Chain, ConfigStore, Network, NetworkConfig};
pub use crypto::{generate, restore, KeyPair, Mnemonic};
pub use errors::{WalletError, WalletResult};
pub use message::{sign_message, verify_message};
pub use transaction::{
    build_and_sign, build_unsigned, build_unsigned_with_nonce, SignedTransaction, TransactionVersion,
    UnsignedTransaction,
};
pub use wallet::{Wallet, WalletExport};

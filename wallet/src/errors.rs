use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    // Codec errors
    InvalidMnemonic(String),
    InvalidAddress(String),
    InvalidAmount(String),
    UnsupportedVersion(u8),

    // Cryptographic errors
    CryptoError(String),
    InvalidKey(String),
    SignatureError(String),

    // Network errors
    NetworkError(String),
    InvalidResponse(String),

    // Storage errors
    StorageError(String),
    FileNotFound(String),
    PermissionDenied(String),

    // Validation errors
    ValidationError(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WalletError::InvalidMnemonic(msg) => write!(f, "Invalid mnemonic: {}", msg),
            WalletError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            WalletError::UnsupportedVersion(version) => {
                write!(f, "Unsupported transaction version: {}", version)
            }

            WalletError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            WalletError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            WalletError::SignatureError(msg) => write!(f, "Signature error: {}", msg),

            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            WalletError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),

            WalletError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            WalletError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            WalletError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),

            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

pub type WalletResult<T> = Result<T, WalletError>;

// Conversion helpers
impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => WalletError::FileNotFound(error.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                WalletError::PermissionDenied(error.to_string())
            }
            _ => WalletError::StorageError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(error: serde_json::Error) -> Self {
        WalletError::ValidationError(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            WalletError::InvalidResponse(error.to_string())
        } else {
            WalletError::NetworkError(error.to_string())
        }
    }
}

impl From<base64::DecodeError> for WalletError {
    fn from(error: base64::DecodeError) -> Self {
        WalletError::SignatureError(format!("Invalid base64: {}", error))
    }
}

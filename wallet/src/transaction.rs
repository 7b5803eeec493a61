/// Binary transfer transactions
///
/// Every supported version shares one fixed record:
///
/// ```text
/// 0      1         35          69       77      85          149   150
/// | ver  | sender  | recipient | amount | nonce | signature | rsv |
/// ```
///
/// Integers are big-endian. The signature covers bytes `0..85` and nothing else.
/// The reserved byte is always zero.
use crate::blockchain::{Address, Amount, Prefix, ADDRESS_BYTES_LEN, PUBLIC_KEY_LEN};
use crate::crypto::{verify_signature, KeyPair, SIGNATURE_LEN};
use crate::errors::{WalletError, WalletResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

const BASIC_UNSIGNED_LEN: usize = 1 + 2 * ADDRESS_BYTES_LEN + 8 + 8;
const RESERVED_LEN: usize = 1;

const SENDER_OFFSET: usize = 1;
const RECIPIENT_OFFSET: usize = SENDER_OFFSET + ADDRESS_BYTES_LEN;
const AMOUNT_OFFSET: usize = RECIPIENT_OFFSET + ADDRESS_BYTES_LEN;
const NONCE_OFFSET: usize = AMOUNT_OFFSET + 8;

/// Transaction layouts understood by this codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionVersion {
    /// Transfer on the legacy "legend" chain.
    Legend,
    /// Transfer on the current chain.
    #[default]
    Current,
}

impl TransactionVersion {
    /// Byte written at offset 0.
    pub const fn discriminator(self) -> u8 {
        match self {
            TransactionVersion::Legend => 1,
            TransactionVersion::Current => 8,
        }
    }

    pub fn from_discriminator(byte: u8) -> WalletResult<Self> {
        match byte {
            1 => Ok(TransactionVersion::Legend),
            8 => Ok(TransactionVersion::Current),
            other => Err(WalletError::UnsupportedVersion(other)),
        }
    }

    pub const fn unsigned_len(self) -> usize {
        match self {
            TransactionVersion::Legend | TransactionVersion::Current => BASIC_UNSIGNED_LEN,
        }
    }

    pub const fn signed_len(self) -> usize {
        self.unsigned_len() + SIGNATURE_LEN + RESERVED_LEN
    }
}

/// A transfer before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    version: TransactionVersion,
    sender: Address,
    recipient: Address,
    amount: Amount,
    nonce: u64,
}

impl UnsignedTransaction {
    /// Zero-value transfers are rejected.
    pub fn new(
        version: TransactionVersion,
        sender: Address,
        recipient: Address,
        amount: Amount,
        nonce: u64,
    ) -> WalletResult<Self> {
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        Ok(UnsignedTransaction {
            version,
            sender,
            recipient,
            amount,
            nonce,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self.version {
            TransactionVersion::Legend | TransactionVersion::Current => self.encode_basic(),
        }
    }

    /// Parse an unsigned record. The length must match the declared version exactly.
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        let first = bytes.first().ok_or_else(|| {
            WalletError::ValidationError("Transaction buffer is empty".to_string())
        })?;
        let version = TransactionVersion::from_discriminator(*first)?;

        if bytes.len() != version.unsigned_len() {
            return Err(WalletError::ValidationError(format!(
                "Invalid transaction length: expected {} bytes, got {}",
                version.unsigned_len(),
                bytes.len()
            )));
        }

        match version {
            TransactionVersion::Legend | TransactionVersion::Current => {
                Self::decode_basic(version, bytes)
            }
        }
    }

    fn encode_basic(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(BASIC_UNSIGNED_LEN);
        encoded.push(self.version.discriminator());
        encoded.extend_from_slice(&self.sender.to_bytes());
        encoded.extend_from_slice(&self.recipient.to_bytes());
        encoded.extend_from_slice(&self.amount.minor_units().to_be_bytes());
        encoded.extend_from_slice(&self.nonce.to_be_bytes());

        debug_assert_eq!(encoded.len(), BASIC_UNSIGNED_LEN);
        encoded
    }

    fn decode_basic(version: TransactionVersion, bytes: &[u8]) -> WalletResult<Self> {
        let sender = Address::from_bytes(&bytes[SENDER_OFFSET..RECIPIENT_OFFSET])?;
        let recipient = Address::from_bytes(&bytes[RECIPIENT_OFFSET..AMOUNT_OFFSET])?;

        let mut amount = [0u8; 8];
        amount.copy_from_slice(&bytes[AMOUNT_OFFSET..NONCE_OFFSET]);
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&bytes[NONCE_OFFSET..BASIC_UNSIGNED_LEN]);

        let amount = Amount::from_minor_units(i128::from(u64::from_be_bytes(amount)))?;
        Self::new(version, sender, recipient, amount, u64::from_be_bytes(nonce))
    }

    pub fn sign(&self, keypair: &KeyPair) -> SignedTransaction {
        SignedTransaction::assemble(self.version, &self.to_bytes(), keypair)
    }

    pub fn version(&self) -> TransactionVersion {
        self.version
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// A signed transfer frame, ready to hand to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    version: TransactionVersion,
    bytes: Vec<u8>,
}

impl SignedTransaction {
    fn assemble(version: TransactionVersion, unsigned: &[u8], keypair: &KeyPair) -> Self {
        let signature = keypair.sign(unsigned);

        let mut bytes = Vec::with_capacity(version.signed_len());
        bytes.extend_from_slice(unsigned);
        bytes.extend_from_slice(&signature);
        bytes.resize(version.signed_len(), 0);

        SignedTransaction { version, bytes }
    }

    /// Wrap a received frame after structural checks; the signature is not checked.
    pub fn from_bytes(bytes: Vec<u8>) -> WalletResult<Self> {
        let version = check_frame(&bytes)?;
        Ok(SignedTransaction { version, bytes })
    }

    /// Like [`SignedTransaction::from_bytes`], copying only a well-formed frame.
    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        let version = check_frame(bytes)?;
        Ok(SignedTransaction {
            version,
            bytes: bytes.to_vec(),
        })
    }

    pub fn version(&self) -> TransactionVersion {
        self.version
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The bytes covered by the signature.
    pub fn unsigned_bytes(&self) -> &[u8] {
        &self.bytes[..self.version.unsigned_len()]
    }

    pub fn signature(&self) -> [u8; SIGNATURE_LEN] {
        let start = self.version.unsigned_len();
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&self.bytes[start..start + SIGNATURE_LEN]);
        signature
    }

    pub fn transaction(&self) -> WalletResult<UnsignedTransaction> {
        UnsignedTransaction::from_bytes(self.unsigned_bytes())
    }

    /// Transport encoding for the node's mempool endpoint.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn verify(&self, public_key: &[u8; PUBLIC_KEY_LEN]) -> bool {
        verify(&self.bytes, public_key)
    }
}

fn check_frame(bytes: &[u8]) -> WalletResult<TransactionVersion> {
    let version = match bytes.first() {
        Some(first) => TransactionVersion::from_discriminator(*first)?,
        None => {
            return Err(WalletError::ValidationError(
                "Transaction buffer is empty".to_string(),
            ))
        }
    };

    if bytes.len() != version.signed_len() {
        return Err(WalletError::ValidationError(format!(
            "Invalid signed transaction length: expected {} bytes, got {}",
            version.signed_len(),
            bytes.len()
        )));
    }

    if bytes[version.unsigned_len() + SIGNATURE_LEN..]
        .iter()
        .any(|&b| b != 0)
    {
        return Err(WalletError::ValidationError(
            "Reserved transaction byte must be zero".to_string(),
        ));
    }

    UnsignedTransaction::from_bytes(&bytes[..version.unsigned_len()])?;
    Ok(version)
}

fn current_nonce() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Serialize a transfer between two binary addresses, nonce taken from the clock.
pub fn build_unsigned(
    sender: &Address,
    recipient: &Address,
    amount_minor_units: i128,
    version: TransactionVersion,
) -> WalletResult<Vec<u8>> {
    build_unsigned_with_nonce(
        sender,
        recipient,
        amount_minor_units,
        version,
        current_nonce(),
    )
}

/// Serialize a transfer with a caller-chosen nonce.
pub fn build_unsigned_with_nonce(
    sender: &Address,
    recipient: &Address,
    amount_minor_units: i128,
    version: TransactionVersion,
    nonce: u64,
) -> WalletResult<Vec<u8>> {
    let amount = Amount::from_minor_units(amount_minor_units)?;
    let transaction = UnsignedTransaction::new(version, *sender, *recipient, amount, nonce)?;
    Ok(transaction.to_bytes())
}

/// Sign a serialized unsigned record and append the signature.
pub fn sign(unsigned_bytes: &[u8], keypair: &KeyPair) -> WalletResult<SignedTransaction> {
    let transaction = UnsignedTransaction::from_bytes(unsigned_bytes)?;
    Ok(SignedTransaction::assemble(
        transaction.version,
        unsigned_bytes,
        keypair,
    ))
}

/// Check a signed frame against the sender's public key.
///
/// Never fails: malformed or foreign input simply does not verify.
pub fn verify(signed_bytes: &[u8], expected_public_key: &[u8; PUBLIC_KEY_LEN]) -> bool {
    let frame = match SignedTransaction::from_slice(signed_bytes) {
        Ok(frame) => frame,
        Err(e) => {
            log::debug!("Rejecting malformed transaction frame: {}", e);
            return false;
        }
    };

    match frame.transaction() {
        Ok(transaction) if transaction.sender.public_key() == expected_public_key => {}
        _ => return false,
    }

    verify_signature(expected_public_key, frame.unsigned_bytes(), &frame.signature())
        .unwrap_or(false)
}

/// Typed record of a signed frame. The signature is not checked.
pub fn parse(signed_bytes: &[u8]) -> WalletResult<UnsignedTransaction> {
    SignedTransaction::from_slice(signed_bytes)?.transaction()
}

/// Decode the recipient, build and sign a transfer from `keypair`.
///
/// All validation happens before anything is signed.
pub fn build_and_sign(
    keypair: &KeyPair,
    to_address: &str,
    amount_minor_units: i128,
    prefix: Prefix,
    version: TransactionVersion,
) -> WalletResult<SignedTransaction> {
    let recipient = Address::decode(to_address)?;
    let sender = keypair.address(prefix);
    let unsigned = build_unsigned(&sender, &recipient, amount_minor_units, version)?;

    log::debug!(
        "Signing {:?} transfer of {} minor units from {} to {}",
        version,
        amount_minor_units,
        sender,
        recipient
    );
    sign(&unsigned, keypair)
}

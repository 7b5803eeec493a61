/// Core ledger types for the UMI wallet
///
/// Addresses are Bech32 strings whose payload is the raw ed25519 public key:
/// `umi1` + 52 data characters + 6 checksum characters. Inside transactions the
/// same address travels as 34 bytes: a 2-byte prefix tag and the public key.
use crate::errors::{WalletError, WalletResult};
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of an ed25519 public key, which is also the address payload.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Length of the binary address form used in transactions.
pub const ADDRESS_BYTES_LEN: usize = 2 + PUBLIC_KEY_LEN;
/// Length of the textual address form.
pub const ADDRESS_TEXT_LEN: usize = 62;

const SEPARATOR: char = '1';

/// Three-letter chain identifier embedded in every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix([u8; 3]);

impl Prefix {
    /// Main UMI chain.
    pub const UMI: Prefix = Prefix(*b"umi");
    /// Glize sub-chain.
    pub const GLIZE: Prefix = Prefix(*b"gls");

    pub const LEN: usize = 3;

    /// Validate an arbitrary prefix: exactly three lowercase ASCII letters.
    pub fn new(value: &str) -> WalletResult<Self> {
        let bytes = value.as_bytes();
        if bytes.len() != Self::LEN {
            return Err(WalletError::InvalidAddress(format!(
                "Prefix must be {} letters, got {:?}",
                Self::LEN,
                value
            )));
        }

        if !bytes.iter().all(|b| b.is_ascii_lowercase()) {
            return Err(WalletError::InvalidAddress(format!(
                "Prefix must be lowercase ASCII letters, got {:?}",
                value
            )));
        }

        Ok(Prefix([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // Only lowercase ASCII can be stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Pack the letters into the 2-byte tag used by the binary address form.
    pub fn to_tag(self) -> u16 {
        self.0
            .iter()
            .fold(0u16, |tag, letter| (tag << 5) | u16::from(letter - b'a' + 1))
    }

    /// Unpack a binary address tag.
    pub fn from_tag(tag: u16) -> WalletResult<Self> {
        if tag & 0x8000 != 0 {
            return Err(WalletError::InvalidAddress(format!(
                "Prefix tag {tag:#06x} has the reserved bit set"
            )));
        }

        let mut letters = [0u8; 3];
        for (index, letter) in letters.iter_mut().enumerate() {
            let shift = 10 - 5 * index as u16;
            let value = ((tag >> shift) & 0x1f) as u8;
            if !(1..=26).contains(&value) {
                return Err(WalletError::InvalidAddress(format!(
                    "Prefix tag {tag:#06x} does not encode a letter"
                )));
            }
            *letter = b'a' + value - 1;
        }

        Ok(Prefix(letters))
    }

    fn hrp(&self) -> WalletResult<Hrp> {
        Hrp::parse(self.as_str())
            .map_err(|e| WalletError::InvalidAddress(format!("Invalid prefix: {}", e)))
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Prefix::UMI
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prefix {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::new(s)
    }
}

impl TryFrom<String> for Prefix {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prefix::new(&value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.as_str().to_string()
    }
}

/// A UMI address: a chain prefix bound to an ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    prefix: Prefix,
    public_key: [u8; PUBLIC_KEY_LEN],
}

impl Address {
    pub fn new(public_key: [u8; PUBLIC_KEY_LEN], prefix: Prefix) -> Self {
        Address { prefix, public_key }
    }

    /// Build an address from a public key slice, rejecting anything but 32 bytes.
    pub fn from_public_key(public_key: &[u8], prefix: Prefix) -> WalletResult<Self> {
        let public_key: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
            WalletError::InvalidKey(format!(
                "Invalid public key size: expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                public_key.len()
            ))
        })?;
        Ok(Address::new(public_key, prefix))
    }

    /// Parse the 34-byte binary form.
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != ADDRESS_BYTES_LEN {
            return Err(WalletError::InvalidAddress(format!(
                "Invalid address length: expected {} bytes, got {}",
                ADDRESS_BYTES_LEN,
                bytes.len()
            )));
        }

        let prefix = Prefix::from_tag(u16::from_be_bytes([bytes[0], bytes[1]]))?;
        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(&bytes[2..]);
        Ok(Address::new(public_key, prefix))
    }

    /// Serialize into the 34-byte binary form.
    pub fn to_bytes(&self) -> [u8; ADDRESS_BYTES_LEN] {
        let mut bytes = [0u8; ADDRESS_BYTES_LEN];
        bytes[..2].copy_from_slice(&self.prefix.to_tag().to_be_bytes());
        bytes[2..].copy_from_slice(&self.public_key);
        bytes
    }

    /// Encode as the Bech32 text form.
    pub fn encode(&self) -> WalletResult<String> {
        bech32::encode::<Bech32>(self.prefix.hrp()?, &self.public_key)
            .map_err(|e| WalletError::InvalidAddress(format!("Bech32 encoding failed: {}", e)))
    }

    /// Decode and verify the Bech32 text form.
    ///
    /// Only the canonical lowercase Bech32 (not Bech32m) encoding of a 32-byte
    /// payload is accepted; the checksum must match.
    pub fn decode(address: &str) -> WalletResult<Self> {
        let separator = address.rfind(SEPARATOR).ok_or_else(|| {
            WalletError::InvalidAddress("Missing prefix separator".to_string())
        })?;

        let prefix = Prefix::new(&address[..separator])?;

        if separator + 1 == address.len() {
            return Err(WalletError::InvalidAddress(
                "Empty data segment".to_string(),
            ));
        }

        if address.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(WalletError::InvalidAddress(
                "Address must be lowercase".to_string(),
            ));
        }

        if address.len() != ADDRESS_TEXT_LEN {
            return Err(WalletError::InvalidAddress(format!(
                "Invalid address length: expected {} characters, got {}",
                ADDRESS_TEXT_LEN,
                address.len()
            )));
        }

        let (_hrp, payload) = bech32::decode(address)
            .map_err(|e| WalletError::InvalidAddress(format!("Invalid Bech32: {}", e)))?;

        let decoded = Address::from_public_key(&payload, prefix).map_err(|_| {
            WalletError::InvalidAddress(format!(
                "Invalid payload length: expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                payload.len()
            ))
        })?;

        // Rejects Bech32m checksums and non-zero padding bits.
        if decoded.encode()? != address {
            return Err(WalletError::InvalidAddress(
                "Non-canonical address encoding".to_string(),
            ));
        }

        Ok(decoded)
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Same key, different chain.
    pub fn with_prefix(&self, prefix: Prefix) -> Self {
        Address::new(self.public_key, prefix)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode().map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::decode(s)
    }
}

impl TryFrom<String> for Address {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::decode(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Encode a public key under `prefix`.
pub fn encode_address(public_key: &[u8], prefix: Prefix) -> WalletResult<String> {
    Address::from_public_key(public_key, prefix)?.encode()
}

/// Split a textual address into its prefix and payload, verifying the checksum.
pub fn decode_address(address: &str) -> WalletResult<(Prefix, [u8; PUBLIC_KEY_LEN])> {
    let decoded = Address::decode(address)?;
    Ok((decoded.prefix, decoded.public_key))
}

/// Recover the public key an address was derived from.
pub fn to_public_key(address: &str) -> WalletResult<[u8; PUBLIC_KEY_LEN]> {
    decode_address(address).map(|(_, public_key)| public_key)
}

/// Represents an amount of UMI
///
/// Stored as integer minor units with two implied decimal places
/// (1 UMI = 100 minor units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    minor_units: u64,
}

impl Amount {
    /// Number of decimal places for UMI
    pub const DECIMALS: usize = 2;
    /// Minor units per UMI (10^2)
    pub const UNITS_PER_UMI: u64 = 100;
    /// Largest value the 8-byte amount field can carry
    pub const MAX_MINOR_UNITS: u64 = u64::MAX;

    pub const ZERO: Amount = Amount { minor_units: 0 };

    /// Create amount from minor units, rejecting negatives and field overflow.
    pub fn from_minor_units(minor_units: i128) -> WalletResult<Self> {
        if minor_units < 0 {
            return Err(WalletError::InvalidAmount(format!(
                "Amount cannot be negative: {}",
                minor_units
            )));
        }

        let minor_units = u64::try_from(minor_units).map_err(|_| {
            WalletError::InvalidAmount(format!(
                "Amount exceeds maximum of {} minor units",
                Self::MAX_MINOR_UNITS
            ))
        })?;

        Ok(Amount { minor_units })
    }

    /// Create amount from a display string such as `"0.01"` or `"12"`.
    pub fn from_string(amount_str: &str) -> WalletResult<Self> {
        if amount_str.is_empty() {
            return Err(WalletError::InvalidAmount(
                "Amount cannot be empty".to_string(),
            ));
        }

        let (whole_str, fractional_str) = match amount_str.split_once('.') {
            Some((whole, fractional)) => (whole, fractional),
            None => (amount_str, ""),
        };

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole_str.is_empty() || !is_digits(whole_str) || !is_digits(fractional_str) {
            return Err(WalletError::InvalidAmount(format!(
                "Invalid number format: {:?}",
                amount_str
            )));
        }

        if amount_str.contains('.') && fractional_str.is_empty() {
            return Err(WalletError::InvalidAmount(format!(
                "Invalid decimal format: {:?}",
                amount_str
            )));
        }

        if fractional_str.len() > Self::DECIMALS {
            return Err(WalletError::InvalidAmount(
                "Too many decimal places".to_string(),
            ));
        }

        let whole: u128 = whole_str
            .parse()
            .map_err(|_| WalletError::InvalidAmount("Amount overflow".to_string()))?;
        let fractional: u128 = if fractional_str.is_empty() {
            0
        } else {
            format!("{:0<width$}", fractional_str, width = Self::DECIMALS)
                .parse()
                .map_err(|_| WalletError::InvalidAmount("Invalid fractional part".to_string()))?
        };

        let total = whole
            .checked_mul(u128::from(Self::UNITS_PER_UMI))
            .and_then(|w| w.checked_add(fractional))
            .ok_or_else(|| WalletError::InvalidAmount("Amount overflow".to_string()))?;

        let total = i128::try_from(total)
            .map_err(|_| WalletError::InvalidAmount("Amount overflow".to_string()))?;
        Self::from_minor_units(total)
    }

    pub fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    /// Get amount as string with full precision, trailing zeros trimmed
    pub fn as_string(&self) -> String {
        let whole = self.minor_units / Self::UNITS_PER_UMI;
        let fractional = self.minor_units % Self::UNITS_PER_UMI;

        if fractional == 0 {
            whole.to_string()
        } else {
            let frac_str = format!("{:02}", fractional);
            format!("{}.{}", whole, frac_str.trim_end_matches('0'))
        }
    }

    pub fn checked_add(&self, other: &Amount) -> WalletResult<Amount> {
        self.minor_units
            .checked_add(other.minor_units)
            .map(|minor_units| Amount { minor_units })
            .ok_or_else(|| WalletError::InvalidAmount("Amount overflow".to_string()))
    }

    pub fn checked_sub(&self, other: &Amount) -> WalletResult<Amount> {
        self.minor_units
            .checked_sub(other.minor_units)
            .map(|minor_units| Amount { minor_units })
            .ok_or_else(|| WalletError::InvalidAmount("Amount underflow".to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl FromStr for Amount {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::from_string(s)
    }
}

/// Wallet key material
///
/// Recovery phrases are English BIP-39. The ed25519 secret is the SHA-256 of the
/// 64-byte BIP-39 seed (empty passphrase), so the same phrase always restores
/// the same key.
use crate::blockchain::{Address, Prefix, PUBLIC_KEY_LEN};
use crate::errors::{WalletError, WalletResult};
use bip39::Language;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Word count of freshly generated phrases.
pub const MNEMONIC_WORD_COUNT: usize = 24;
/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

const ENTROPY_BYTES: usize = 32;
const SECRET_KEY_LEN: usize = 32;
const KEYPAIR_LEN: usize = SECRET_KEY_LEN + PUBLIC_KEY_LEN;

/// A validated BIP-39 recovery phrase.
#[derive(Clone)]
pub struct Mnemonic {
    phrase: Zeroizing<String>,
    word_count: usize,
}

impl Mnemonic {
    /// Draw fresh entropy from the OS and build a 24-word phrase.
    pub fn generate() -> WalletResult<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
        OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| WalletError::CryptoError(format!("Failed to generate entropy: {}", e)))?;

        Self::from_entropy(&entropy[..])
    }

    pub fn from_entropy(entropy: &[u8]) -> WalletResult<Self> {
        let mnemonic = bip39::Mnemonic::from_entropy(entropy)
            .map_err(|e| WalletError::InvalidMnemonic(format!("Failed to create mnemonic: {}", e)))?;

        Ok(Mnemonic {
            word_count: mnemonic.word_count(),
            phrase: Zeroizing::new(mnemonic.to_string()),
        })
    }

    /// Validate a phrase against the English wordlist and its checksum.
    ///
    /// Any whitespace separates words and letter case is ignored.
    pub fn parse(phrase: &str) -> WalletResult<Self> {
        let normalized = Zeroizing::new(
            phrase
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" "),
        );

        let mnemonic = bip39::Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

        Ok(Mnemonic {
            word_count: mnemonic.word_count(),
            phrase: normalized,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// The 64-byte BIP-39 seed (empty passphrase).
    pub fn to_seed(&self) -> WalletResult<Zeroizing<[u8; 64]>> {
        let mnemonic = bip39::Mnemonic::parse_in_normalized(Language::English, &self.phrase)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Zeroizing::new(mnemonic.to_seed("")))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count)
            .field("phrase", &"<redacted>")
            .finish()
    }
}

impl FromStr for Mnemonic {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mnemonic::parse(s)
    }
}

/// An ed25519 keypair. The secret half is wiped when the value is dropped.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Random keypair with no recovery phrase behind it.
    pub fn generate() -> Self {
        KeyPair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive from seed material: a 32-byte seed is used as the secret,
    /// anything longer or shorter is hashed with SHA-256 first.
    pub fn from_seed(seed: &[u8]) -> WalletResult<Self> {
        if seed.is_empty() {
            return Err(WalletError::InvalidKey(
                "Seed material cannot be empty".to_string(),
            ));
        }

        let secret: Zeroizing<[u8; SECRET_KEY_LEN]> = if seed.len() == SECRET_KEY_LEN {
            let mut secret = Zeroizing::new([0u8; SECRET_KEY_LEN]);
            secret.copy_from_slice(seed);
            secret
        } else {
            Zeroizing::new(Sha256::digest(seed).into())
        };

        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    pub fn from_mnemonic(mnemonic: &Mnemonic) -> WalletResult<Self> {
        let seed = mnemonic.to_seed()?;
        Self::from_seed(&seed[..])
    }

    /// Import a private key: either the 32-byte secret or the 64-byte
    /// `secret ‖ public` form, whose public half must match the secret.
    pub fn from_private_key(bytes: &[u8]) -> WalletResult<Self> {
        match bytes.len() {
            SECRET_KEY_LEN => {
                let mut secret = Zeroizing::new([0u8; SECRET_KEY_LEN]);
                secret.copy_from_slice(bytes);
                Ok(KeyPair {
                    signing_key: SigningKey::from_bytes(&secret),
                })
            }
            KEYPAIR_LEN => {
                let mut keypair = Zeroizing::new([0u8; KEYPAIR_LEN]);
                keypair.copy_from_slice(bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair).map_err(|e| {
                    WalletError::InvalidKey(format!("Public half does not match secret: {}", e))
                })?;
                Ok(KeyPair { signing_key })
            }
            other => Err(WalletError::InvalidKey(format!(
                "Invalid private key size: expected {} or {} bytes, got {}",
                SECRET_KEY_LEN, KEYPAIR_LEN, other
            ))),
        }
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The 64-byte `secret ‖ public` private key.
    pub fn private_key(&self) -> Zeroizing<[u8; KEYPAIR_LEN]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    pub fn address(&self, prefix: Prefix) -> Address {
        Address::new(self.public_key(), prefix)
    }

    /// Detached signature over exactly `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Fresh phrase and the keypair it restores to.
pub fn generate() -> WalletResult<(Mnemonic, KeyPair)> {
    let mnemonic = Mnemonic::generate()?;
    let keypair = KeyPair::from_mnemonic(&mnemonic)?;
    log::debug!(
        "Generated {}-word wallet {}",
        mnemonic.word_count(),
        keypair.public_key_hex()
    );
    Ok((mnemonic, keypair))
}

/// Reproduce the keypair behind a recovery phrase.
pub fn restore(phrase: &str) -> WalletResult<KeyPair> {
    let mnemonic = Mnemonic::parse(phrase)?;
    KeyPair::from_mnemonic(&mnemonic)
}

/// Check a detached signature.
///
/// A public key that is not a valid curve point is an error; a signature that
/// simply does not match yields `Ok(false)`.
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_LEN],
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> WalletResult<bool> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| WalletError::InvalidKey(format!("Failed to create verifying key: {}", e)))?;
    let signature = Signature::from_bytes(signature);

    Ok(verifying_key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_generation_and_restoration() {
        let (mnemonic, keypair) = generate().unwrap();

        assert_eq!(mnemonic.word_count(), MNEMONIC_WORD_COUNT);
        assert_eq!(mnemonic.phrase().split_whitespace().count(), 24);

        let restored = restore(mnemonic.phrase()).unwrap();
        assert_eq!(keypair.public_key(), restored.public_key());
        assert_eq!(*keypair.private_key(), *restored.private_key());
    }

    #[test]
    fn generated_phrases_differ() {
        let (first, _) = generate().unwrap();
        let (second, _) = generate().unwrap();
        assert_ne!(first.phrase(), second.phrase());
    }

    #[test]
    fn test_known_seed_vector() {
        let mnemonic = Mnemonic::parse(ABANDON_12).unwrap();
        let seed = mnemonic.to_seed().unwrap();
        assert_eq!(hex::encode(&seed[..16]), "5eb00bbddcf069084889a8ab91555681");

        let keypair = KeyPair::from_mnemonic(&mnemonic).unwrap();
        assert_eq!(
            hex::encode(&keypair.private_key()[..32]),
            "62a772f85e4be6226108b56c0b1cf935c2490e434adec864fe47b189f1ed517d"
        );
        assert_eq!(
            keypair.public_key_hex(),
            "58032e75cd5ee0bbcacbed1e38c3da4bf0f162aba2d7513d2d2fba2184327bd3"
        );
    }

    #[test]
    fn phrase_whitespace_and_case_are_normalized() {
        let messy = format!("  {}  ", ABANDON_12.to_uppercase().replace(' ', "\t "));
        let restored = restore(&messy).unwrap();
        assert_eq!(restored.public_key(), restore(ABANDON_12).unwrap().public_key());
    }

    #[test]
    fn invalid_phrases_rejected() {
        let bad_checksum = ABANDON_12.replace("about", "abandon");
        let unknown_word = ABANDON_12.replace("about", "umibanana");
        let too_short = "abandon abandon abandon";

        for phrase in [bad_checksum.as_str(), unknown_word.as_str(), too_short, ""] {
            assert!(
                matches!(restore(phrase), Err(WalletError::InvalidMnemonic(_))),
                "accepted {phrase:?}"
            );
        }
    }

    #[test]
    fn private_key_import_forms() {
        let keypair = KeyPair::generate();
        let full = keypair.private_key();

        let from_full = KeyPair::from_private_key(&full[..]).unwrap();
        let from_secret = KeyPair::from_private_key(&full[..32]).unwrap();
        assert_eq!(from_full.public_key(), keypair.public_key());
        assert_eq!(from_secret.public_key(), keypair.public_key());
        assert_eq!(&full[32..], &keypair.public_key());

        let mut mismatched = *full;
        mismatched[40] ^= 0x01;
        assert!(KeyPair::from_private_key(&mismatched).is_err());
        assert!(KeyPair::from_private_key(&full[..31]).is_err());
    }

    #[test]
    fn seed_hashing_rule() {
        let short_seed = [9u8; 32];
        let direct = KeyPair::from_seed(&short_seed).unwrap();
        assert_eq!(&direct.private_key()[..32], &short_seed);

        let long_seed = [9u8; 64];
        let hashed = KeyPair::from_seed(&long_seed).unwrap();
        let expected: [u8; 32] = Sha256::digest(long_seed).into();
        assert_eq!(&hashed.private_key()[..32], &expected);

        assert!(KeyPair::from_seed(&[]).is_err());
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let data = b"Hello, UMI!";
        let signature = keypair.sign(data);

        assert!(verify_signature(&keypair.public_key(), data, &signature).unwrap());
        assert!(!verify_signature(&keypair.public_key(), b"Wrong message", &signature).unwrap());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let (mnemonic, keypair) = generate().unwrap();
        let rendered = format!("{:?} {:?}", mnemonic, keypair);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(mnemonic.phrase()));
        assert!(!rendered.contains(&hex::encode(&keypair.private_key()[..32])));
    }
}

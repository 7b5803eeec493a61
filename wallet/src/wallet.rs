/// Wallet facade
///
/// Holds one keypair, the phrase it came from (when known) and the address prefix
/// used for everything the wallet produces.
use crate::blockchain::{Address, Amount, Prefix, PUBLIC_KEY_LEN};
use crate::crypto::{self, KeyPair, Mnemonic};
use crate::errors::{WalletError, WalletResult};
use crate::message;
use crate::transaction::{self, SignedTransaction, TransactionVersion};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone)]
pub struct Wallet {
    keypair: KeyPair,
    mnemonic: Option<Mnemonic>,
    prefix: Prefix,
}

impl Wallet {
    /// New wallet from fresh entropy.
    pub fn generate(prefix: Prefix) -> WalletResult<Self> {
        let (mnemonic, keypair) = crypto::generate()?;
        Ok(Wallet {
            keypair,
            mnemonic: Some(mnemonic),
            prefix,
        })
    }

    pub fn restore(phrase: &str, prefix: Prefix) -> WalletResult<Self> {
        let mnemonic = Mnemonic::parse(phrase)?;
        let keypair = KeyPair::from_mnemonic(&mnemonic)?;
        log::debug!("Restored wallet {}", keypair.public_key_hex());

        Ok(Wallet {
            keypair,
            mnemonic: Some(mnemonic),
            prefix,
        })
    }

    /// Import a raw key. Such a wallet has no recovery phrase.
    pub fn from_private_key(private_key: &[u8], prefix: Prefix) -> WalletResult<Self> {
        Ok(Wallet {
            keypair: KeyPair::from_private_key(private_key)?,
            mnemonic: None,
            prefix,
        })
    }

    /// Same key, different address prefix.
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn address(&self) -> Address {
        self.keypair.address(self.prefix)
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(Mnemonic::phrase)
    }

    pub fn sign_message(&self, message: &[u8]) -> String {
        message::sign_message_with(&self.keypair, message)
    }

    /// Signed transfer from this wallet's own address.
    pub fn transfer(
        &self,
        to: &str,
        amount: Amount,
        version: TransactionVersion,
    ) -> WalletResult<SignedTransaction> {
        transaction::build_and_sign(
            &self.keypair,
            to,
            i128::from(amount.minor_units()),
            self.prefix,
            version,
        )
    }

    /// Signed transfer from `from`, which must be an address of this wallet's key
    /// under any prefix.
    pub fn transfer_from(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
        version: TransactionVersion,
    ) -> WalletResult<SignedTransaction> {
        let sender = Address::decode(from)?;
        if *sender.public_key() != self.public_key() {
            return Err(WalletError::InvalidAddress(format!(
                "{} does not belong to this wallet",
                from
            )));
        }

        let recipient = Address::decode(to)?;
        let unsigned = transaction::build_unsigned(
            &sender,
            &recipient,
            i128::from(amount.minor_units()),
            version,
        )?;
        transaction::sign(&unsigned, &self.keypair)
    }

    pub fn export(&self) -> WalletExport {
        WalletExport {
            address: self.address().to_string(),
            mnemonic: self.mnemonic().map(str::to_string),
            public_key: self.keypair.public_key_hex(),
            private_key: hex::encode(&self.keypair.private_key()[..]),
        }
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address().to_string())
            .field("has_mnemonic", &self.mnemonic.is_some())
            .finish()
    }
}

/// Everything needed to restore a wallet elsewhere.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletExport {
    pub address: String,
    pub mnemonic: Option<String>,
    /// Hex of the 32-byte public key.
    pub public_key: String,
    /// Hex of the 64-byte secret-then-public keypair.
    pub private_key: String,
}

impl fmt::Debug for WalletExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletExport")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("mnemonic", &"<redacted>")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const ABANDON_24_ADDRESS: &str =
        "umi1wa9an3fc53zhrlwtxn3u3usxsdfmtrxrus9788kvz8wch8et482qxwjlvv";

    #[test]
    fn test_restore_known_addresses() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        assert_eq!(
            wallet.address().to_string(),
            "umi1tqpjuawdtmsthjkta50r3s76f0c0zc4t5tt4z0fd97azrppj00fs5sfp7a"
        );

        let glize = wallet.with_prefix(Prefix::GLIZE);
        assert_eq!(
            glize.address().to_string(),
            "gls1tqpjuawdtmsthjkta50r3s76f0c0zc4t5tt4z0fd97azrppj00fszeurkh"
        );
        assert_eq!(glize.mnemonic(), Some(ABANDON_12));
    }

    #[test]
    fn test_generated_wallet_uses_prefix() {
        let wallet = Wallet::generate(Prefix::GLIZE).unwrap();
        let address = wallet.address().to_string();

        assert!(address.starts_with("gls1"));
        assert_eq!(Address::decode(&address).unwrap(), wallet.address());
        assert_eq!(wallet.mnemonic().map(|m| m.split(' ').count()), Some(24));
    }

    #[test]
    fn test_private_key_import_round_trip() {
        let original = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        let export = original.export();

        let bytes = hex::decode(&export.private_key).unwrap();
        let imported = Wallet::from_private_key(&bytes, Prefix::UMI).unwrap();

        assert_eq!(imported.address(), original.address());
        assert_eq!(imported.mnemonic(), None);
        assert_eq!(imported.export().mnemonic, None);
    }

    #[test]
    fn test_export_serializes_camel_case() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        let json = serde_json::to_value(wallet.export()).unwrap();

        assert_eq!(
            json["publicKey"],
            "58032e75cd5ee0bbcacbed1e38c3da4bf0f162aba2d7513d2d2fba2184327bd3"
        );
        assert_eq!(json["privateKey"].as_str().map(str::len), Some(128));
        assert_eq!(json["mnemonic"], ABANDON_12);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        let export = wallet.export();

        assert!(!format!("{:?}", wallet).contains("abandon"));
        let rendered = format!("{:?}", export);
        assert!(!rendered.contains("abandon"));
        assert!(!rendered.contains(&export.private_key));
    }

    #[test]
    fn test_transfer_signs_from_own_address() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        let amount = Amount::from_string("0.01").unwrap();

        let signed = wallet
            .transfer(ABANDON_24_ADDRESS, amount, TransactionVersion::Current)
            .unwrap();

        assert_eq!(signed.as_bytes().len(), 150);
        assert!(signed.verify(&wallet.public_key()));
        assert_eq!(*signed.transaction().unwrap().sender(), wallet.address());
    }

    #[test]
    fn test_transfer_from_other_prefix() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();
        let from = wallet.address().with_prefix(Prefix::GLIZE).to_string();

        let signed = wallet
            .transfer_from(
                &from,
                ABANDON_24_ADDRESS,
                Amount::from_minor_units(5).unwrap(),
                TransactionVersion::Legend,
            )
            .unwrap();

        let transaction = signed.transaction().unwrap();
        assert_eq!(transaction.sender().prefix(), Prefix::GLIZE);
        assert_eq!(transaction.version(), TransactionVersion::Legend);
        assert!(signed.verify(&wallet.public_key()));
    }

    #[test]
    fn test_transfer_from_foreign_address_is_rejected() {
        let wallet = Wallet::restore(ABANDON_12, Prefix::UMI).unwrap();

        assert!(matches!(
            wallet.transfer_from(
                ABANDON_24_ADDRESS,
                ABANDON_24_ADDRESS,
                Amount::from_minor_units(1).unwrap(),
                TransactionVersion::Current,
            ),
            Err(WalletError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_zero_transfer_is_rejected() {
        let wallet = Wallet::generate(Prefix::UMI).unwrap();

        assert!(matches!(
            wallet.transfer(ABANDON_24_ADDRESS, Amount::ZERO, TransactionVersion::Current),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_signed_message_verifies_against_address() {
        let wallet = Wallet::generate(Prefix::UMI).unwrap();
        let signature = wallet.sign_message(b"proof of ownership");

        assert!(message::verify_message(
            &signature,
            b"proof of ownership",
            &wallet.address().to_string()
        )
        .unwrap());
    }
}

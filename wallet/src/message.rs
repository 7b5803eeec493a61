/// Detached message signatures, text-encoded as base64.
use crate::blockchain::to_public_key;
use crate::crypto::{verify_signature, KeyPair, SIGNATURE_LEN};
use crate::errors::{WalletError, WalletResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Sign `message` with a raw private key (32-byte secret or 64-byte keypair).
pub fn sign_message(private_key: &[u8], message: &[u8]) -> WalletResult<String> {
    let keypair = KeyPair::from_private_key(private_key)?;
    Ok(sign_message_with(&keypair, message))
}

pub fn sign_message_with(keypair: &KeyPair, message: &[u8]) -> String {
    BASE64.encode(keypair.sign(message))
}

/// Verify a base64 signature against the key behind `address`.
///
/// Malformed input is an error. A signature that does not match is `Ok(false)`.
pub fn verify_message(signature: &str, message: &[u8], address: &str) -> WalletResult<bool> {
    let decoded = BASE64.decode(signature.trim())?;
    let signature: [u8; SIGNATURE_LEN] = decoded.as_slice().try_into().map_err(|_| {
        WalletError::SignatureError(format!(
            "Invalid signature length: expected {} bytes, got {}",
            SIGNATURE_LEN,
            decoded.len()
        ))
    })?;

    let public_key = to_public_key(address)?;
    verify_signature(&public_key, message, &signature)
}

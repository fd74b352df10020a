//! AES-256-GCM authenticated encryption for stored values
//!
//! Wire format: `{iv_hex}:{auth_tag_hex}:{ciphertext_hex}`
//! - IV: 12 bytes (96 bits) - standard for GCM
//! - Auth tag: 16 bytes (128 bits)
//!
//! The format is self-describing: `decrypt_string` needs nothing beyond the
//! serialized value and the key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use super::CipherKey;
use crate::error::{ClientError, Result};

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A single encrypted value: IV, auth tag, and ciphertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedValue {
    iv: [u8; IV_LEN],
    auth_tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl std::fmt::Display for EncryptedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            hex::encode(self.iv),
            hex::encode(self.auth_tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl std::str::FromStr for EncryptedValue {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let (iv, tag, ct) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(iv), Some(tag), Some(ct), None) => (iv, tag, ct),
            _ => {
                return Err(ClientError::Decryption(
                    "Invalid encrypted value: expected iv:tag:ciphertext".to_string(),
                ))
            }
        };

        Ok(Self {
            iv: decode_fixed(iv, "IV")?,
            auth_tag: decode_fixed(tag, "auth tag")?,
            ciphertext: hex::decode(ct)
                .map_err(|e| ClientError::Decryption(format!("Invalid ciphertext hex: {}", e)))?,
        })
    }
}

fn decode_fixed<const N: usize>(part: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(part)
        .map_err(|e| ClientError::Decryption(format!("Invalid {} hex: {}", what, e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        ClientError::Decryption(format!(
            "Invalid {} length: expected {}, got {}",
            what,
            N,
            bytes.len()
        ))
    })
}

/// Encrypt a string and return the serialized `iv:tag:ciphertext` form
pub fn encrypt_string(plaintext: &str, key: &CipherKey) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ClientError::Encryption(e.to_string()))?;

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    // aes-gcm appends the auth tag to the ciphertext
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| ClientError::Encryption(e.to_string()))?;

    if sealed.len() < TAG_LEN {
        return Err(ClientError::Encryption("Ciphertext too short".to_string()));
    }

    let tag_bytes = sealed.split_off(sealed.len() - TAG_LEN);
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&tag_bytes);

    Ok(EncryptedValue {
        iv,
        auth_tag,
        ciphertext: sealed,
    }
    .to_string())
}

/// Decrypt a serialized `iv:tag:ciphertext` value back to the plaintext
pub fn decrypt_string(serialized: &str, key: &CipherKey) -> Result<String> {
    let value: EncryptedValue = serialized.parse()?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ClientError::Decryption(e.to_string()))?;

    // Reassemble ciphertext with the tag appended (as expected by aes-gcm)
    let mut sealed = value.ciphertext;
    sealed.extend_from_slice(&value.auth_tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&value.iv), sealed.as_slice())
        .map_err(|e| ClientError::Decryption(e.to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| ClientError::Decryption(format!("Invalid UTF-8: {}", e)))
}

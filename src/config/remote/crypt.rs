//! Encrypted remote values.
//!
//! A keyring file holds one base64-encoded 256-bit key. An encrypted value is
//! `base64(nonce || ciphertext || tag)` sealed with AES-256-GCM and no
//! associated data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use std::fs;
use std::path::Path;

use crate::config::error::{ConfigError, ConfigResult};

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

fn failed(reason: impl Into<String>) -> ConfigError {
    ConfigError::RemoteDecryptionFailed(reason.into())
}

/// Read the key from a keyring file.
pub fn load_keyring(path: &Path) -> ConfigResult<LessSafeKey> {
    let encoded = fs::read_to_string(path)
        .map_err(|e| failed(format!("keyring {} unreadable: {}", path.display(), e)))?;
    key_from_base64(encoded.trim())
}

/// Build a key from its base64 form.
pub fn key_from_base64(encoded: &str) -> ConfigResult<LessSafeKey> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| failed(format!("keyring is not valid base64: {}", e)))?;
    if bytes.len() != KEY_LEN {
        return Err(failed(format!(
            "keyring holds {} bytes, expected {}",
            bytes.len(),
            KEY_LEN
        )));
    }
    let key = UnboundKey::new(&AES_256_GCM, &bytes).map_err(|_| failed("keyring rejected"))?;
    Ok(LessSafeKey::new(key))
}

/// Generate a fresh key in keyring-file form.
pub fn generate_key() -> Result<String, ring::error::Unspecified> {
    let mut bytes = [0u8; KEY_LEN];
    SystemRandom::new().fill(&mut bytes)?;
    Ok(STANDARD.encode(bytes))
}

/// Decrypt a sealed value.
pub fn open(key: &LessSafeKey, payload: &[u8]) -> ConfigResult<Vec<u8>> {
    let text = String::from_utf8_lossy(payload);
    let data = STANDARD
        .decode(text.trim())
        .map_err(|e| failed(format!("payload is not valid base64: {}", e)))?;
    if data.len() < NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(failed("payload too short"));
    }

    let (nonce, sealed) = data.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce).map_err(|_| failed("bad nonce"))?;
    let mut in_out = sealed.to_vec();
    let plain = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| failed("payload does not authenticate with this keyring"))?;
    Ok(plain.to_vec())
}

/// Encrypt `plaintext` into the form `open` expects.
pub fn seal(key: &LessSafeKey, plaintext: &[u8]) -> Result<String, ring::error::Unspecified> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new().fill(&mut nonce)?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut in_out)?;

    let mut out = nonce.to_vec();
    out.extend_from_slice(&in_out);
    Ok(STANDARD.encode(out))
}

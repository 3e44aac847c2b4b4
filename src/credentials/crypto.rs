//! Key derivation and AES-256-CFB decryption for the slackdump cache.
//!
//! The key is bound to the machine: an HMAC-SHA256 of [`APP_ID`] keyed by the
//! hardware identifier is hex-encoded and stretched with PBKDF2-HMAC-SHA512
//! over [`SALT`]. Both constants are part of the on-disk format and must match
//! the writer byte for byte. CFB carries no authentication tag, so a wrong key
//! yields garbage plaintext rather than an error.

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

use super::error::{CredentialError, CredentialErrorCode};

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

/// Derived key length in bytes.
pub const KEY_SIZE: usize = 32;

/// Initialization vector length in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 4096;

/// Application identifier mixed into the machine ID.
pub static APP_ID: &[u8] = b"slackdump";

/// Fixed key-derivation salt.
pub static SALT: [u8; 256] = [
    0xbc, 0xa2, 0x1e, 0x04, 0x33, 0x13, 0x23, 0x15, 0x3a, 0x8f, 0xa3, 0xce,
    0x82, 0x15, 0x4a, 0x25, 0x02, 0xb5, 0x87, 0x42, 0xb7, 0x0b, 0xbe, 0x96,
    0x40, 0xf1, 0xf6, 0x3f, 0x0b, 0x41, 0x57, 0x3d, 0x76, 0x22, 0x6a, 0xc6,
    0x85, 0xed, 0x24, 0x95, 0x08, 0xca, 0x3f, 0x00, 0x0c, 0x90, 0x82, 0x91,
    0x40, 0x34, 0x6f, 0x9c, 0xed, 0xad, 0xa0, 0x45, 0x9f, 0xae, 0xb5, 0xd6,
    0x14, 0x67, 0x62, 0x9c, 0x27, 0xe0, 0x80, 0x89, 0xa2, 0xe1, 0x39, 0xcc,
    0x9c, 0x8c, 0xa8, 0xcf, 0x56, 0x44, 0x68, 0x19, 0x46, 0xbd, 0xcb, 0xf7,
    0xc0, 0x97, 0x68, 0x86, 0xca, 0x64, 0xc2, 0x91, 0xf9, 0x3b, 0x95, 0xd8,
    0x8a, 0xae, 0x1e, 0x31, 0xa9, 0x8d, 0x27, 0x0c, 0x6d, 0x8e, 0x90, 0x0c,
    0x7b, 0xdb, 0xed, 0xbf, 0xac, 0xdc, 0x2c, 0x16, 0xa8, 0x10, 0x76, 0x38,
    0xbb, 0xac, 0x54, 0x4a, 0x9c, 0x5c, 0x6e, 0x67, 0x1b, 0x7e, 0x7a, 0xb0,
    0x09, 0x30, 0xdb, 0xc2, 0xfe, 0x28, 0x0a, 0x49, 0x7c, 0x97, 0x90, 0xe4,
    0x8f, 0xbf, 0xc1, 0xa7, 0x84, 0x49, 0xe0, 0xd5, 0x56, 0xb6, 0x5b, 0x42,
    0xbc, 0x19, 0xed, 0x48, 0xb2, 0xdc, 0xd8, 0x73, 0x0d, 0x7e, 0x54, 0xbf,
    0xe0, 0x32, 0xf3, 0x85, 0x87, 0x44, 0x42, 0xf4, 0xf1, 0x65, 0x3c, 0xed,
    0x2a, 0x79, 0x41, 0x90, 0xfc, 0x76, 0xdb, 0x84, 0xa8, 0xa8, 0xa8, 0x67,
    0xe4, 0x25, 0x58, 0x31, 0x31, 0xcb, 0x12, 0x26, 0x95, 0xe0, 0xdb, 0x27,
    0x53, 0x68, 0x1a, 0x90, 0xdb, 0xbe, 0xa5, 0x8b, 0xf8, 0x2f, 0x9f, 0xa5,
    0x23, 0xf5, 0x7a, 0x07, 0x5b, 0x78, 0x2c, 0xdf, 0x60, 0x58, 0x62, 0x7d,
    0x42, 0xf1, 0x3b, 0xd9, 0xaf, 0x5d, 0x6e, 0x38, 0xc2, 0x9a, 0xd3, 0xdc,
    0x94, 0x39, 0x58, 0x66, 0xd4, 0xf0, 0xb0, 0xfb, 0x18, 0xd6, 0x69, 0x7a,
    0xbc, 0xd3, 0x7d, 0x48,
];

/// Derive the 32-byte cache key for `machine_id`.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::DecryptFailed`] if the HMAC cannot be
/// initialized.
pub fn derive_key(machine_id: &str) -> Result<[u8; KEY_SIZE], CredentialError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(machine_id.as_bytes()).map_err(|err| {
        CredentialError::new(CredentialErrorCode::DecryptFailed, "failed to init hmac")
            .with_cause(err)
    })?;
    mac.update(APP_ID);
    let protected_id = hex::encode(mac.finalize().into_bytes());

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha512>(protected_id.as_bytes(), &SALT, PBKDF2_ROUNDS, &mut key);
    Ok(key)
}

/// Decrypt `data`, whose first [`IV_SIZE`] bytes are the IV.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::CiphertextTooShort`] when `data` is shorter
/// than the IV, or [`CredentialErrorCode::DecryptFailed`] if the cipher cannot
/// be initialized.
pub fn decrypt(data: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>, CredentialError> {
    if data.len() < IV_SIZE {
        return Err(CredentialError::new(
            CredentialErrorCode::CiphertextTooShort,
            format!("ciphertext is {} bytes, need at least {IV_SIZE}", data.len()),
        ));
    }
    let (iv, body) = data.split_at(IV_SIZE);
    let cipher = Aes256CfbDec::new_from_slices(key, iv).map_err(|err| {
        CredentialError::new(CredentialErrorCode::DecryptFailed, "failed to init cipher")
            .with_cause(err)
    })?;
    let mut plaintext = body.to_vec();
    cipher.decrypt(&mut plaintext);
    Ok(plaintext)
}

/// Encrypt `plaintext` and prefix the result with `iv`.
///
/// # Errors
///
/// Returns [`CredentialErrorCode::DecryptFailed`] if the cipher cannot be
/// initialized.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>, CredentialError> {
    let cipher = Aes256CfbEnc::new_from_slices(key, iv).map_err(|err| {
        CredentialError::new(CredentialErrorCode::DecryptFailed, "failed to init cipher")
            .with_cause(err)
    })?;
    let mut body = plaintext.to_vec();
    cipher.encrypt(&mut body);

    let mut out = Vec::with_capacity(IV_SIZE + body.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&body);
    Ok(out)
}

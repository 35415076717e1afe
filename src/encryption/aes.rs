//! AES-CBC helpers for the `/AESV2` and `/AESV3` crypt filters.
//!
//! Encrypted strings and streams start with a 16-byte IV and carry PKCS#7
//! padding.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::{Decryptor, Encryptor};

const BLOCK: usize = 16;

/// Decrypt IV-prefixed, padded data with a 16- or 32-byte key.
pub(crate) fn decrypt_payload(key: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < BLOCK {
        return Err("AES data shorter than its IV");
    }
    let (iv, ciphertext) = data.split_at(BLOCK);
    let plain = cbc_decrypt(key, iv, ciphertext)?;
    strip_padding(plain)
}

/// CBC-decrypt whole blocks without touching padding.
pub(crate) fn cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if iv.len() != BLOCK {
        return Err("AES IV must be 16 bytes");
    }
    if data.len() % BLOCK != 0 {
        return Err("AES data is not a whole number of blocks");
    }
    let mut buffer = data.to_vec();
    match key.len() {
        16 => Decryptor::<Aes128>::new(key.into(), iv[..].into())
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map_err(|_| "AES decryption failed")?,
        32 => Decryptor::<Aes256>::new(key.into(), iv[..].into())
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map_err(|_| "AES decryption failed")?,
        _ => return Err("AES key must be 16 or 32 bytes"),
    };
    Ok(buffer)
}

/// CBC-encrypt whole blocks with AES-128 and no padding.
pub(crate) fn cbc_encrypt_128(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, &'static str> {
    if key.len() != BLOCK || iv.len() != BLOCK {
        return Err("AES-128 key and IV must be 16 bytes");
    }
    if data.len() % BLOCK != 0 {
        return Err("AES data is not a whole number of blocks");
    }
    let mut buffer = data.to_vec();
    let len = buffer.len();
    Encryptor::<Aes128>::new(key.into(), iv[..].into())
        .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
        .map_err(|_| "AES encryption failed")?;
    Ok(buffer)
}

fn strip_padding(mut plain: Vec<u8>) -> Result<Vec<u8>, &'static str> {
    let pad = match plain.last() {
        Some(&pad) => pad as usize,
        None => return Ok(plain),
    };
    if pad == 0 || pad > BLOCK || pad > plain.len() {
        return Err("invalid PKCS#7 padding");
    }
    if plain[plain.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err("invalid PKCS#7 padding");
    }
    plain.truncate(plain.len() - pad);
    Ok(plain)
}

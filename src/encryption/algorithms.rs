//! Key derivation and user password checks for the Standard handler.

use super::aes;
use super::rc4::rc4_crypt;
use super::EncryptDict;
use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

/// Password padding string.
pub(crate) const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// The file key for `password` when it is the user password.
///
/// Returns `None` when the password does not match.
pub(crate) fn authenticate_user(dict: &EncryptDict, password: &[u8], file_id: &[u8]) -> Option<Vec<u8>> {
    if dict.revision >= 5 {
        return authenticate_user_r6(dict, password);
    }

    let key = file_key(dict, password, file_id);
    let expected = user_entry(&key, dict.revision, file_id);
    let compared = if dict.revision >= 3 { 16 } else { 32 };
    let stored = dict.user_key.get(..compared)?;
    constant_time_eq(stored, &expected[..compared]).then_some(key)
}

/// File key from a padded password (R2 to R4).
pub(crate) fn file_key(dict: &EncryptDict, password: &[u8], file_id: &[u8]) -> Vec<u8> {
    let length = dict.key_length.min(16);

    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(&dict.owner_key[..dict.owner_key.len().min(32)]);
    hasher.update(dict.permissions.to_le_bytes());
    hasher.update(file_id);
    if dict.revision >= 4 && !dict.encrypt_metadata {
        hasher.update([0xFF; 4]);
    }
    let mut hash = hasher.finalize().to_vec();

    if dict.revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..length]).to_vec();
        }
    }
    hash.truncate(length);
    hash
}

/// The `/U` value a file key produces (R2 to R4). Only the first 16
/// bytes are significant from R3 on.
pub(crate) fn user_entry(key: &[u8], revision: u32, file_id: &[u8]) -> Vec<u8> {
    if revision < 3 {
        return rc4_crypt(key, &PADDING);
    }

    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let mut hash = hasher.finalize().to_vec();
    for round in 0..20u8 {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        hash = rc4_crypt(&round_key, &hash);
    }
    hash.resize(32, 0);
    hash
}

/// Per-object key for RC4 and AES-128.
pub(crate) fn object_key(file_key: &[u8], id: u32, gen: u16, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&id.to_le_bytes()[..3]);
    hasher.update(gen.to_le_bytes());
    if aes {
        hasher.update(b"sAlT");
    }
    let hash = hasher.finalize();
    hash[..(file_key.len() + 5).min(16)].to_vec()
}

/// R5 and R6: check the validation salt, then unwrap `/UE`.
fn authenticate_user_r6(dict: &EncryptDict, password: &[u8]) -> Option<Vec<u8>> {
    let password = &password[..password.len().min(127)];
    let user = dict.user_key.get(..48)?;
    let (hash, validation_salt, key_salt) = (&user[..32], &user[32..40], &user[40..48]);

    if !constant_time_eq(&password_hash(dict.revision, password, validation_salt, &[]), hash) {
        return None;
    }

    let intermediate = password_hash(dict.revision, password, key_salt, &[]);
    let wrapped = dict.user_encryption.as_deref()?.get(..32)?;
    aes::cbc_decrypt(&intermediate, &[0; 16], wrapped).ok()
}

/// SHA-256 for R5; the iterated SHA-2/AES hash for R6.
pub(crate) fn password_hash(revision: u32, password: &[u8], salt: &[u8], user_data: &[u8]) -> Vec<u8> {
    let mut k = Sha256::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(user_data)
        .finalize()
        .to_vec();
    if revision < 6 {
        return k;
    }

    let mut round = 0usize;
    loop {
        let mut block = Vec::with_capacity(64 * (password.len() + k.len() + user_data.len()));
        for _ in 0..64 {
            block.extend_from_slice(password);
            block.extend_from_slice(&k);
            block.extend_from_slice(user_data);
        }
        // Block length is a multiple of 64, so encryption cannot fail.
        let encrypted = match aes::cbc_encrypt_128(&k[..16], &k[16..32], &block) {
            Ok(encrypted) => encrypted,
            Err(_) => return k[..32].to_vec(),
        };

        let selector: u32 = encrypted[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&encrypted).to_vec(),
            1 => Sha384::digest(&encrypted).to_vec(),
            _ => Sha512::digest(&encrypted).to_vec(),
        };

        round += 1;
        let last = encrypted[encrypted.len() - 1] as usize;
        if round >= 64 && last + 32 <= round {
            break;
        }
    }
    k.truncate(32);
    k
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

//! Standard security handler support for reading encrypted documents.
//!
//! Many PDFs are encrypted only to carry usage restrictions: the user
//! password is empty and any reader may open them. [`EncryptionHandler`]
//! authenticates with the empty user password and decrypts strings and
//! streams as objects are loaded. Documents that need a real password are
//! refused.
//!
//! Supported revisions:
//!
//! - R2 and R3 (RC4, 40 to 128 bit keys)
//! - R4 with `/V2` or `/AESV2` crypt filters
//! - R5 and R6 (AES-256, `/AESV3`)

use crate::error::{Error, Result};
use crate::object::{Dict, Object};

mod aes;
mod algorithms;
mod handler;
mod rc4;

pub use handler::EncryptionHandler;

#[cfg(test)]
pub(crate) use handler::tests as handler_tests;

/// How strings or streams are encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    /// Not encrypted (`/Identity` or `/None`)
    Identity,
    /// RC4 with a per-object key (`/V2`)
    Rc4,
    /// AES-128 CBC with a per-object key (`/AESV2`)
    Aes128,
    /// AES-256 CBC with the file key (`/AESV3`)
    Aes256,
}

impl CryptMethod {
    fn from_cfm(name: &str) -> Result<Self> {
        match name {
            "None" | "Identity" => Ok(CryptMethod::Identity),
            "V2" => Ok(CryptMethod::Rc4),
            "AESV2" => Ok(CryptMethod::Aes128),
            "AESV3" => Ok(CryptMethod::Aes256),
            other => Err(Error::InvalidPdf(format!("unsupported crypt filter method /{}", other))),
        }
    }
}

/// The trailer's `/Encrypt` dictionary, Standard handler only.
#[derive(Debug, Clone)]
pub struct EncryptDict {
    /// Algorithm version (`/V`)
    pub version: u32,
    /// Handler revision (`/R`)
    pub revision: u32,
    /// File key length in bytes
    pub key_length: usize,
    /// Owner password entry (`/O`)
    pub owner_key: Vec<u8>,
    /// User password entry (`/U`)
    pub user_key: Vec<u8>,
    /// Encrypted file key for the user password (`/UE`, R5 and later)
    pub user_encryption: Option<Vec<u8>>,
    /// Access permissions (`/P`)
    pub permissions: i32,
    /// Whether metadata streams are encrypted (`/EncryptMetadata`)
    pub encrypt_metadata: bool,
    /// Method applied to strings (`/StrF`)
    pub string_method: CryptMethod,
    /// Method applied to streams (`/StmF`)
    pub stream_method: CryptMethod,
}

impl EncryptDict {
    /// Read an `/Encrypt` dictionary.
    ///
    /// # Errors
    ///
    /// Fails for security handlers other than `/Standard`, for unknown
    /// versions and when a required entry is missing.
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        let filter = dict.get("Filter").and_then(Object::as_name).unwrap_or("");
        if filter != "Standard" {
            return Err(Error::InvalidPdf(format!("unsupported security handler /{}", filter)));
        }

        let integer = |key: &str| {
            dict.get(key)
                .and_then(Object::as_integer)
                .ok_or_else(|| Error::InvalidPdf(format!("Encrypt dictionary missing /{}", key)))
        };
        let bytes = |key: &str| dict.get(key).and_then(Object::as_string).map(<[u8]>::to_vec);

        let version = integer("V")? as u32;
        let revision = integer("R")? as u32;
        let permissions = integer("P")? as i32;
        let owner_key = bytes("O").ok_or_else(|| Error::InvalidPdf("Encrypt dictionary missing /O".to_string()))?;
        let user_key = bytes("U").ok_or_else(|| Error::InvalidPdf("Encrypt dictionary missing /U".to_string()))?;

        let (string_method, stream_method) = match version {
            1 | 2 => (CryptMethod::Rc4, CryptMethod::Rc4),
            4 | 5 => (crypt_filter(dict, "StrF")?, crypt_filter(dict, "StmF")?),
            other => {
                return Err(Error::InvalidPdf(format!("unsupported encryption version V={}", other)))
            },
        };

        let key_length = match version {
            1 => 5,
            5 => 32,
            _ => dict
                .get("Length")
                .and_then(Object::as_integer)
                .map(|bits| (bits / 8).clamp(5, 16) as usize)
                .unwrap_or(if version == 4 { 16 } else { 5 }),
        };

        Ok(Self {
            version,
            revision,
            key_length,
            owner_key,
            user_key,
            user_encryption: bytes("UE"),
            permissions,
            encrypt_metadata: dict.get("EncryptMetadata").and_then(Object::as_bool).unwrap_or(true),
            string_method,
            stream_method,
        })
    }
}

/// Method of the crypt filter named by `/StrF` or `/StmF`.
fn crypt_filter(dict: &Dict, key: &str) -> Result<CryptMethod> {
    let name = match dict.get(key).and_then(Object::as_name) {
        Some(name) => name,
        None => return Ok(CryptMethod::Identity),
    };
    if name == "Identity" {
        return Ok(CryptMethod::Identity);
    }
    let method = dict
        .get("CF")
        .and_then(Object::as_dict)
        .and_then(|filters| filters.get(name))
        .and_then(Object::as_dict)
        .and_then(|filter| filter.get("CFM"))
        .and_then(Object::as_name)
        .unwrap_or("None");
    CryptMethod::from_cfm(method)
}

//! Decrypting objects as they are loaded.

use super::{aes, algorithms, CryptMethod, EncryptDict};
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};

/// Decrypts strings and streams of a document opened with the empty user
/// password.
#[derive(Debug, Clone)]
pub struct EncryptionHandler {
    dict: EncryptDict,
    file_key: Vec<u8>,
    encrypt_ref: Option<ObjectRef>,
}

impl EncryptionHandler {
    /// Authenticate with the empty user password.
    ///
    /// `encrypt_ref` is the indirect reference of the `/Encrypt` dictionary,
    /// which is never itself encrypted.
    ///
    /// # Errors
    ///
    /// Fails when the handler or revision is unsupported, or when opening
    /// the document needs a real password.
    pub fn open(encrypt: &Dict, file_id: &[u8], encrypt_ref: Option<ObjectRef>) -> Result<Self> {
        let dict = EncryptDict::from_dict(encrypt)?;
        let file_key = algorithms::authenticate_user(&dict, b"", file_id)
            .ok_or_else(|| Error::InvalidPdf("document requires a password".to_string()))?;

        log::info!(
            "Opened encrypted document (V={}, R={}, {}-bit key)",
            dict.version,
            dict.revision,
            file_key.len() * 8
        );
        Ok(Self {
            dict,
            file_key,
            encrypt_ref,
        })
    }

    /// Handler revision (`/R`).
    pub fn revision(&self) -> u32 {
        self.dict.revision
    }

    /// Decrypt every string and stream inside the indirect object `obj_ref`.
    pub fn decrypt_object(&self, object: Object, obj_ref: ObjectRef) -> Result<Object> {
        if self.encrypt_ref == Some(obj_ref) {
            return Ok(object);
        }
        self.decrypt_value(object, obj_ref)
    }

    fn decrypt_value(&self, object: Object, obj_ref: ObjectRef) -> Result<Object> {
        Ok(match object {
            Object::String(bytes) => Object::String(self.decrypt_bytes(self.dict.string_method, &bytes, obj_ref)?),
            Object::Array(items) => Object::Array(
                items
                    .into_iter()
                    .map(|item| self.decrypt_value(item, obj_ref))
                    .collect::<Result<_>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.decrypt_dict(dict, obj_ref)?),
            Object::Stream { dict, data } => {
                let stream_type = dict.get("Type").and_then(Object::as_name);
                let plain_data = stream_type == Some("XRef")
                    || (stream_type == Some("Metadata") && !self.dict.encrypt_metadata);
                let data = if plain_data {
                    data
                } else {
                    self.decrypt_bytes(self.dict.stream_method, &data, obj_ref)?.into()
                };
                Object::Stream {
                    dict: self.decrypt_dict(dict, obj_ref)?,
                    data,
                }
            },
            other => other,
        })
    }

    fn decrypt_dict(&self, dict: Dict, obj_ref: ObjectRef) -> Result<Dict> {
        dict.into_iter()
            .map(|(key, value)| Ok((key, self.decrypt_value(value, obj_ref)?)))
            .collect()
    }

    fn decrypt_bytes(&self, method: CryptMethod, data: &[u8], obj_ref: ObjectRef) -> Result<Vec<u8>> {
        let failed = |reason: &str| Error::InvalidPdf(format!("cannot decrypt object {}: {}", obj_ref, reason));
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::Rc4 => {
                let key = algorithms::object_key(&self.file_key, obj_ref.id, obj_ref.gen, false);
                Ok(super::rc4::rc4_crypt(&key, data))
            },
            CryptMethod::Aes128 => {
                let key = algorithms::object_key(&self.file_key, obj_ref.id, obj_ref.gen, true);
                aes::decrypt_payload(&key, data).map_err(failed)
            },
            CryptMethod::Aes256 => aes::decrypt_payload(&self.file_key, data).map_err(failed),
        }
    }
}

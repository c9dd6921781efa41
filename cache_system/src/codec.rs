//! Value and key codecs
//!
//! Everything a cache stores is text. Typed values cross into the cache
//! through exactly one [`Codec`], which owns the conversion in both directions.

use crate::errors::CacheError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

/// Text encoding for cached values and memoization arguments
pub trait Codec: Send + Sync + 'static {
    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError>;

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CacheError>;
}

/// JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CacheError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// MessagePack, wrapped in base64 so arbitrary bytes survive as text
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError> {
        let bytes = rmp_serde::to_vec_named(value)?;
        Ok(STANDARD.encode(bytes))
    }

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CacheError> {
        let bytes = STANDARD.decode(text)?;
        Ok(rmp_serde::from_slice(&bytes)?)
    }
}

/// Fixed-length hex digest of an encoded key
pub fn hash_key(encoded: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())
}

//! Value codecs / 值编解码
//!
//! Structured values cross the store boundary as `serde_json::Value`; a codec
//! decides how they are laid out as bytes in the bucket.

use serde_json::Value;

use super::error::{StoreError, StoreResult};

/// Structured value <-> byte sequence conversion / 编解码器接口
pub trait Codec: Send + Sync {
    /// Codec name / 编解码器名称
    fn name(&self) -> &str;

    fn marshal(&self, value: &Value) -> StoreResult<Vec<u8>>;

    fn unmarshal(&self, data: &[u8]) -> StoreResult<Value>;
}

/// JSON codec (default) / JSON编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn marshal(&self, value: &Value) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn unmarshal(&self, data: &[u8]) -> StoreResult<Value> {
        serde_json::from_slice(data).map_err(|e| StoreError::Codec(e.to_string()))
    }
}

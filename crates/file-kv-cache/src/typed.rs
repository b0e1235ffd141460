//! Typed convenience forms layered over the byte-level cache
//!
//! The encoders and decoders here are plain functions with no knowledge of
//! storage or expiration; the `Cache` methods at the bottom only chain them
//! with `set`/`get`.

use crate::cache::Cache;
use crate::error::{CacheError, Result};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub fn encode_string(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

pub fn decode_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| CacheError::Encoding(format!("cached string is not UTF-8: {}", e)))
}

/// Property data must be a JSON object or array at the top level
pub fn encode_properties(value: &Value) -> Result<Vec<u8>> {
    if !(value.is_object() || value.is_array()) {
        return Err(CacheError::Encoding(
            "property data must be an object or an array".to_string(),
        ));
    }
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_properties(bytes: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(bytes)?;
    if !(value.is_object() || value.is_array()) {
        return Err(CacheError::Encoding(
            "cached property data is not an object or an array".to_string(),
        ));
    }
    Ok(value)
}

pub fn encode_object<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Image container formats recognised by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else if bytes.starts_with(b"BM") && bytes.len() >= 14 {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

/// Encoded image bytes together with their detected format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl CachedImage {
    /// Wrap encoded image bytes, rejecting anything that is not a known format
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            CacheError::Encoding("unrecognised image format".to_string())
        })?;
        Ok(Self { format, bytes })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Cache {
    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, &encode_string(value))
    }

    pub fn set_string_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.set_with_ttl(key, &encode_string(value), ttl)
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)?.map(decode_string).transpose()
    }

    /// Store JSON property data (an object or array)
    pub fn set_properties(&self, key: &str, value: &Value) -> Result<()> {
        self.set(key, &encode_properties(value)?)
    }

    pub fn set_properties_with_ttl(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.set_with_ttl(key, &encode_properties(value)?, ttl)
    }

    pub fn get_properties(&self, key: &str) -> Result<Option<Value>> {
        self.get(key)?
            .map(|bytes| decode_properties(&bytes))
            .transpose()
    }

    /// Store any serializable value as JSON
    pub fn set_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &encode_object(value)?)
    }

    pub fn set_object_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.set_with_ttl(key, &encode_object(value)?, ttl)
    }

    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)?
            .map(|bytes| decode_object(&bytes))
            .transpose()
    }

    pub fn set_image(&self, key: &str, image: &CachedImage) -> Result<()> {
        self.set(key, image.as_bytes())
    }

    pub fn set_image_with_ttl(&self, key: &str, image: &CachedImage, ttl: Duration) -> Result<()> {
        self.set_with_ttl(key, image.as_bytes(), ttl)
    }

    pub fn get_image(&self, key: &str) -> Result<Option<CachedImage>> {
        self.get(key)?.map(CachedImage::from_bytes).transpose()
    }
}

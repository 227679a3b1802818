//! Response body decompression
//!
//! The file host answers with gzip, deflate or brotli bodies depending on the
//! endpoint, sometimes without a `Content-Encoding` header. Bodies are decoded
//! here instead of inside reqwest so a broken stream surfaces as a
//! [`CtError::Decode`] for the single request that produced it.

use crate::error::CtError;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Supported content codings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
    Brotli,
}

impl ContentEncoding {
    /// Parse a `Content-Encoding` header value
    pub fn from_header(value: Option<&str>) -> Result<Self, CtError> {
        let value = match value {
            Some(value) => value.trim().to_ascii_lowercase(),
            None => return Ok(ContentEncoding::Identity),
        };

        match value.as_str() {
            "" | "identity" => Ok(ContentEncoding::Identity),
            "gzip" | "x-gzip" => Ok(ContentEncoding::Gzip),
            "deflate" => Ok(ContentEncoding::Deflate),
            "br" => Ok(ContentEncoding::Brotli),
            other => Err(CtError::Decode(format!(
                "Unsupported content encoding: {}",
                other
            ))),
        }
    }
}

/// Decode a raw body according to its `Content-Encoding` header
pub fn decode_body(encoding: Option<&str>, body: &[u8]) -> Result<Vec<u8>, CtError> {
    let mut encoding = ContentEncoding::from_header(encoding)?;

    // Some endpoints gzip without saying so
    if encoding == ContentEncoding::Identity && body.starts_with(&GZIP_MAGIC) {
        encoding = ContentEncoding::Gzip;
    }

    match encoding {
        ContentEncoding::Identity => Ok(body.to_vec()),
        ContentEncoding::Gzip => read_all(GzDecoder::new(body), "gzip"),
        ContentEncoding::Deflate => {
            // "deflate" is zlib-wrapped per RFC 9110, but raw streams are common
            read_all(ZlibDecoder::new(body), "deflate")
                .or_else(|_| read_all(DeflateDecoder::new(body), "deflate"))
        }
        ContentEncoding::Brotli => read_all(brotli::Decompressor::new(body, 4096), "br"),
    }
}

/// Decode a body and interpret it as UTF-8 text
pub fn decode_text(encoding: Option<&str>, body: &[u8]) -> Result<String, CtError> {
    let bytes = decode_body(encoding, body)?;
    String::from_utf8(bytes).map_err(|e| CtError::Decode(format!("Body is not UTF-8: {}", e)))
}

fn read_all<R: Read>(mut reader: R, name: &str) -> Result<Vec<u8>, CtError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| CtError::Decode(format!("Invalid {} stream: {}", name, e)))?;
    Ok(out)
}

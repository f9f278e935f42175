//! Decoding uploaded bytes into text.
//!
//! Detection order:
//! 1. Byte order mark (UTF-8, UTF-16 LE/BE)
//! 2. Valid UTF-8
//! 3. chardetng statistical guess for legacy encodings

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Upload could not be turned into text.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("file appears to be binary, not text")]
    Binary,

    #[error("file is not valid {encoding} text")]
    Malformed { encoding: &'static str },
}

/// Text recovered from an upload, with the encoding it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Decode raw bytes to a string. Empty input decodes to an empty string.
pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_strict(&bytes[bom_len..], encoding);
    }

    // NUL never occurs in text we can chunk; it marks binary or BOM-less UTF-16
    if bytes.contains(&0) {
        return Err(DecodeError::Binary);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedText {
            text: text.to_string(),
            encoding: UTF_8,
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    tracing::debug!(target: "decode", "upload is not UTF-8, decoding as {}", encoding.name());

    decode_strict(bytes, encoding)
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedText, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| DecodedText {
            text: text.into_owned(),
            encoding,
        })
        .ok_or(DecodeError::Malformed {
            encoding: encoding.name(),
        })
}

//! Base64 helpers behind the `encode` and `decode` commands.

use std::string::FromUtf8Error;

use base64::{
    Engine, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;

/// Standard alphabet; decoding tolerates non-zero trailing bits in the last symbol.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Why a `decode` argument could not be turned back into text.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input is not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

/// Encode the UTF-8 bytes of `text` with padding.
pub fn encode(text: &str) -> String {
    ENGINE.encode(text.as_bytes())
}

/// Decode `code`, padding it with `=` to a multiple of four characters first.
pub fn decode(code: &str) -> Result<String, DecodeError> {
    let mut padded = code.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let bytes = ENGINE.decode(padded)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_utf8_text() {
        assert_eq!(encode("yuzu"), "eXV6dQ==");
        assert_eq!(encode("ゆず"), "44KG44Ga");
    }

    #[test]
    fn decode_restores_missing_padding() {
        assert_eq!(decode("eXV6dQ").unwrap(), "yuzu");
        assert_eq!(decode("eXV6dQ==").unwrap(), "yuzu");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode("not base64!"), Err(DecodeError::Base64(_))));
        assert!(matches!(decode("abcde"), Err(DecodeError::Base64(_))));
        assert!(matches!(decode("//79"), Err(DecodeError::Utf8(_))));
    }
}

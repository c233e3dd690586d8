//! Unpadded base64url, the encoding of every token segment.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use crate::Result;

/// Encode bytes as base64url without padding.
pub fn encode_segment(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode an unpadded base64url segment.
///
/// Padding stripped by [`encode_segment`] is restored before decoding, so
/// already padded input is accepted as well.
pub fn decode_segment(data: &str) -> Result<Vec<u8>> {
    let missing = (4 - data.len() % 4) % 4;
    if missing == 0 {
        return Ok(URL_SAFE.decode(data)?);
    }

    let mut padded = String::with_capacity(data.len() + missing);
    padded.push_str(data);
    padded.extend(std::iter::repeat_n('=', missing));
    Ok(URL_SAFE.decode(padded)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn encode_strips_padding_and_uses_url_alphabet() {
        let encoded = encode_segment(&[0xfb, 0xff, 0xfe, 0x01]);
        assert_eq!(encoded, "-__-AQ");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn decode_restores_padding() {
        assert_eq!(decode_segment("eyJ0ZXN0IjoidGVzdCJ9").unwrap(), br#"{"test":"test"}"#);
        assert_eq!(decode_segment("YQ").unwrap(), b"a");
        assert_eq!(decode_segment("YQ==").unwrap(), b"a");
        assert_eq!(decode_segment("").unwrap(), b"");
    }

    #[test]
    fn decode_rejects_bad_input() {
        // Standard alphabet characters are not part of base64url.
        assert!(matches!(decode_segment("a+b/"), Err(Error::MalformedEncoding(_))));
        // A single leftover character can never be valid.
        assert!(matches!(decode_segment("abcde"), Err(Error::MalformedEncoding(_))));
        assert!(matches!(decode_segment("ab.c"), Err(Error::MalformedEncoding(_))));
    }
}

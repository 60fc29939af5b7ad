//! Percent-encoding of target URLs into a single path segment.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::ProxyError;

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped, so a whole URL
/// (including `/`, `?`, `#`, `:`) fits in one path segment.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Strict decoding: every `%` must start a two-digit hex escape and the
/// decoded bytes must be UTF-8.
pub fn decode_component(input: &str) -> Result<String, ProxyError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !escaped {
                return Err(ProxyError::Decode);
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ProxyError::Decode)
}

/// Gateway path routing to `url`: `/` + encoded absolute URL.
pub fn proxy_path(url: &Url) -> String {
    format!("/{}", encode_component(url.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(
            encode_component("https://a.com/x?y=1&z=2#top"),
            "https%3A%2F%2Fa.com%2Fx%3Fy%3D1%26z%3D2%23top"
        );
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
        assert_eq!(encode_component("ü €"), "%C3%BC%20%E2%82%AC");
    }

    #[test]
    fn test_decode_recovers_target() {
        for target in [
            "https://a.com/",
            "http://example.org:8080/path/to/file.png",
            "https://例え.jp/パス",
            "https://a.com/search?q=rust lang",
        ] {
            assert_eq!(decode_component(&encode_component(target)).unwrap(), target);
        }
    }

    #[test]
    fn test_decode_accepts_unencoded_input() {
        assert_eq!(decode_component("https://a.com/x").unwrap(), "https://a.com/x");
        assert_eq!(decode_component("%2f%2F").unwrap(), "//");
    }

    #[test]
    fn test_decode_rejects_malformed_escapes() {
        assert!(matches!(decode_component("%E0%A4%A"), Err(ProxyError::Decode)));
        assert!(matches!(decode_component("abc%"), Err(ProxyError::Decode)));
        assert!(matches!(decode_component("%zz"), Err(ProxyError::Decode)));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(decode_component("%E0%A4"), Err(ProxyError::Decode)));
        assert!(matches!(decode_component("%FF"), Err(ProxyError::Decode)));
    }

    #[test]
    fn test_proxy_path() {
        let url = Url::parse("https://a.com/login").unwrap();
        assert_eq!(proxy_path(&url), "/https%3A%2F%2Fa.com%2Flogin");
    }
}

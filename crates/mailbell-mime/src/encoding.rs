//! RFC 2047 encoded-word decoding.
//!
//! Header fields such as `From` and `Subject` carry non-ASCII text as
//! encoded words: `=?charset?encoding?encoded-text?=`, where the encoding
//! is `B` (Base64) or `Q` (a quoted-printable variant with `_` for space).

use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::Encoding;

/// Base64 engine that tolerates senders who drop the trailing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes bytes in the given charset into a string.
///
/// Charset labels are resolved the way browsers resolve them, so
/// `latin1` reads as windows-1252 and `gb2312` as GBK. An unknown label
/// is read as UTF-8 with invalid sequences replaced by U+FFFD.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    Encoding::for_label(charset.trim().as_bytes()).map_or_else(
        || String::from_utf8_lossy(bytes).into_owned(),
        |encoding| encoding.decode_without_bom_handling(bytes).0.into_owned(),
    )
}

/// Decodes a single encoded word, such as `=?UTF-8?Q?caf=C3=A9?=`.
///
/// # Errors
///
/// Returns an error if `word` is not a well-formed encoded word, names an
/// unknown encoding, or carries undecodable text.
pub fn decode_encoded_word(word: &str) -> Result<String> {
    let inner = word
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
        .ok_or_else(|| Error::InvalidEncodedWord(word.to_string()))?;

    let mut parts = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(text)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncodedWord(word.to_string()));
    };

    let decoded = EncodedWord::decode(charset, encoding, text)?;
    Ok(decode_charset(&decoded.bytes, &decoded.charset))
}

/// Decodes every encoded word in a header value, leaving plain text as is.
///
/// Whitespace between two adjacent encoded words is dropped, and adjacent
/// words in the same charset are joined before decoding, so a multi-byte
/// character split across words survives. Text that only looks like an
/// encoded word is kept verbatim.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<EncodedWord> = None;
    let mut rest = text;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        if let Some((word, remainder)) = EncodedWord::parse_prefix(candidate) {
            let joinable = before.chars().all(char::is_whitespace);
            let same_run = joinable
                && pending
                    .as_ref()
                    .is_some_and(|p| p.charset.eq_ignore_ascii_case(&word.charset));

            if same_run {
                if let Some(p) = pending.as_mut() {
                    p.bytes.extend_from_slice(&word.bytes);
                }
            } else {
                let follows_word = pending.is_some();
                flush(&mut out, pending.take());
                if !(joinable && follows_word) {
                    out.push_str(before);
                }
                pending = Some(word);
            }
            rest = remainder;
        } else {
            flush(&mut out, pending.take());
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
        }
    }

    flush(&mut out, pending.take());
    out.push_str(rest);
    out
}

fn flush(out: &mut String, word: Option<EncodedWord>) {
    if let Some(word) = word {
        out.push_str(&decode_charset(&word.bytes, &word.charset));
    }
}

/// Raw bytes of one (or several joined) encoded words.
#[derive(Debug)]
struct EncodedWord {
    charset: String,
    bytes: Vec<u8>,
}

impl EncodedWord {
    /// Parses an encoded word at the start of `text`, returning it with the
    /// text that follows.
    fn parse_prefix(text: &str) -> Option<(Self, &str)> {
        let body = text.strip_prefix("=?")?;

        let (charset, after_charset) = body.split_once('?')?;
        let (encoding, after_encoding) = after_charset.split_once('?')?;
        let end = after_encoding.find('?')?;
        if after_encoding.as_bytes().get(end + 1) != Some(&b'=') {
            return None;
        }
        let encoded = &after_encoding[..end];

        if charset.is_empty()
            || charset.contains(char::is_whitespace)
            || encoded.contains(char::is_whitespace)
        {
            return None;
        }

        let word = Self::decode(charset, encoding, encoded).ok()?;
        Some((word, &after_encoding[end + 2..]))
    }

    fn decode(charset: &str, encoding: &str, text: &str) -> Result<Self> {
        // RFC 2231 language suffix: `utf-8*en`
        let charset = charset.split_once('*').map_or(charset, |(c, _)| c);

        let bytes = match encoding {
            "B" | "b" => LENIENT_BASE64.decode(text)?,
            "Q" | "q" => decode_q(text)?,
            other => return Err(Error::UnknownEncoding(other.to_string())),
        };

        Ok(Self {
            charset: charset.to_string(),
            bytes,
        })
    }
}

/// Decodes the `Q` encoding (RFC 2047 section 4.2).
fn decode_q(text: &str) -> Result<Vec<u8>> {
    let input = text.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                let byte = input
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| Error::InvalidEscape(text[i..].chars().take(3).collect()))?;
                out.push(byte);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_b_word() {
        assert_eq!(
            decode_encoded_word("=?utf-8?B?SGVsbG8sIFdvcmxkIQ==?=").unwrap(),
            "Hello, World!"
        );
    }

    #[test]
    fn test_decode_b_word_without_padding() {
        assert_eq!(decode_encoded_word("=?UTF-8?B?SGk?=").unwrap(), "Hi");
    }

    #[test]
    fn test_decode_q_word() {
        assert_eq!(
            decode_encoded_word("=?UTF-8?Q?caf=C3=A9_au_lait?=").unwrap(),
            "café au lait"
        );
    }

    #[test]
    fn test_decode_latin1_word() {
        assert_eq!(
            decode_encoded_word("=?ISO-8859-1?Q?Entw=FCrfe?=").unwrap(),
            "Entwürfe"
        );
    }

    #[test]
    fn test_decode_unknown_encoding() {
        let err = decode_encoded_word("=?utf-8?X?abc?=").unwrap_err();
        assert!(matches!(err, Error::UnknownEncoding(ref e) if e == "X"));
    }

    #[test]
    fn test_decode_bad_escape() {
        let err = decode_encoded_word("=?utf-8?Q?bad=ZZ?=").unwrap_err();
        assert!(matches!(err, Error::InvalidEscape(_)));
    }

    #[test]
    fn test_decode_not_a_word() {
        assert!(matches!(
            decode_encoded_word("plain text"),
            Err(Error::InvalidEncodedWord(_))
        ));
    }

    #[test]
    fn test_rfc2047_plain_text_untouched() {
        assert_eq!(decode_rfc2047("Weekly report"), "Weekly report");
        assert_eq!(decode_rfc2047(""), "");
    }

    #[test]
    fn test_rfc2047_mixed_text_and_words() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?q?Gr=C3=BC=C3=9Fe?= from Berlin"),
            "Re: Grüße from Berlin"
        );
    }

    #[test]
    fn test_rfc2047_adjacent_words_drop_whitespace() {
        assert_eq!(
            decode_rfc2047("=?ISO-8859-1?Q?a?= =?ISO-8859-1?Q?b?="),
            "ab"
        );
        assert_eq!(
            decode_rfc2047("=?ISO-8859-1?Q?a?=\r\n\t=?UTF-8?Q?b?="),
            "ab"
        );
    }

    #[test]
    fn test_rfc2047_split_multibyte_character() {
        // "é" is C3 A9; each word carries one byte
        assert_eq!(decode_rfc2047("=?utf-8?Q?=C3?= =?utf-8?Q?=A9?="), "é");
    }

    #[test]
    fn test_rfc2047_space_between_word_and_text_kept() {
        assert_eq!(
            decode_rfc2047("=?utf-8?B?SGVsbG8=?= world"),
            "Hello world"
        );
    }

    #[test]
    fn test_rfc2047_malformed_word_kept() {
        assert_eq!(decode_rfc2047("a =?broken"), "a =?broken");
        assert_eq!(decode_rfc2047("=?utf-8?Q?x y?="), "=?utf-8?Q?x y?=");
        assert_eq!(decode_rfc2047("=?utf-8?Z?abc?= ok"), "=?utf-8?Z?abc?= ok");
    }

    #[test]
    fn test_rfc2047_unknown_charset_is_lossy() {
        assert_eq!(decode_rfc2047("=?x-unknown?Q?ok=FF?="), "ok\u{FFFD}");
    }

    #[test]
    fn test_rfc2047_language_suffix() {
        assert_eq!(decode_rfc2047("=?US-ASCII*EN?Q?Keith_Moore?="), "Keith Moore");
    }

    #[test]
    fn test_charset_latin1() {
        assert_eq!(decode_charset(&[0x63, 0x61, 0x66, 0xE9], "latin1"), "café");
        assert_eq!(decode_charset(b"plain", "us-ascii"), "plain");
    }

    #[test]
    fn test_charset_labels() {
        assert_eq!(decode_charset(&[0xA4], "ISO-8859-15"), "€");
        assert_eq!(decode_charset(&[0xA4], "iso-8859-1"), "¤");
        assert_eq!(decode_charset(&[0xB1, 0xB6], "ISO-8859-2"), "ąś");
        assert_eq!(decode_charset(&[0x93, 0x94], "cp1252"), "\u{201C}\u{201D}");
        assert_eq!(decode_charset("ok".as_bytes(), " UTF-8 "), "ok");
    }

    #[test]
    fn test_rfc2047_windows_1252() {
        assert_eq!(
            decode_rfc2047("=?windows-1252?Q?Caf=E9_=96_r=E9union?="),
            "Café – réunion"
        );
    }

    #[test]
    fn test_rfc2047_iso_8859_15() {
        assert_eq!(decode_rfc2047("=?ISO-8859-15?Q?Prix_=A4_100?="), "Prix € 100");
    }

    #[test]
    fn test_rfc2047_multibyte_charsets() {
        assert_eq!(decode_rfc2047("=?KOI8-R?B?8NLJ18XU?="), "Привет");
        assert_eq!(decode_rfc2047("=?Shift_JIS?B?k/qWe4zq?="), "日本語");
    }

    mod proptest_tests {
        use super::*;
        use base64::engine::general_purpose::STANDARD;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn b_word_roundtrip(s in "\\PC{0,40}") {
                let word = format!("=?utf-8?B?{}?=", STANDARD.encode(s.as_bytes()));
                prop_assert_eq!(decode_rfc2047(&word), s);
            }

            #[test]
            fn text_without_markers_is_unchanged(s in "[^=?]{0,60}") {
                prop_assert_eq!(decode_rfc2047(&s), s);
            }
        }
    }
}

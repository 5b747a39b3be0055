//! IMAP modified UTF-7 mailbox name encoding (RFC 3501 section 5.1.3).
//!
//! Printable ASCII stands for itself except `&`, which is written `&-`.
//! Everything else is UTF-16BE, base64-encoded with `,` in place of `/`,
//! without padding, between `&` and `-`.

use base64::Engine as _;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::NO_PAD;

const ENGINE: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

/// Decodes a modified UTF-7 mailbox name.
///
/// Returns `None` if a shifted section is malformed. Bytes outside the
/// printable ASCII range are passed through unchanged so that names from
/// servers that already send UTF-8 survive.
#[must_use]
pub fn decode(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let end = after.find('-')?;
        let shifted = &after[..end];

        if shifted.is_empty() {
            out.push('&');
        } else {
            let bytes = ENGINE.decode(shifted).ok()?;
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            for c in char::decode_utf16(units) {
                out.push(c.ok()?);
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Some(out)
}

/// Encodes a mailbox name into modified UTF-7.
#[must_use]
pub fn encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in input.chars() {
        if (' '..='~').contains(&c) {
            flush(&mut out, &mut pending);
            if c == '&' {
                out.push_str("&-");
            } else {
                out.push(c);
            }
        } else {
            let mut buf = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }

    flush(&mut out, &mut pending);
    out
}

fn flush(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|u| u.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&ENGINE.encode(bytes));
    out.push('-');
    pending.clear();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode("INBOX").unwrap(), "INBOX");
        assert_eq!(encode("[Gmail]/All Mail"), "[Gmail]/All Mail");
    }

    #[test]
    fn ampersand_escape() {
        assert_eq!(decode("Tom &- Jerry").unwrap(), "Tom & Jerry");
        assert_eq!(encode("Tom & Jerry"), "Tom &- Jerry");
    }

    #[test]
    fn rfc_example() {
        // RFC 3501 section 5.1.3
        assert_eq!(
            decode("~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap(),
            "~peter/mail/台北/日本語"
        );
        assert_eq!(
            encode("~peter/mail/台北/日本語"),
            "~peter/mail/&U,BTFw-/&ZeVnLIqe-"
        );
    }

    #[test]
    fn gmail_spanish_folders() {
        assert_eq!(decode("[Gmail]/Enviados").unwrap(), "[Gmail]/Enviados");
        assert_eq!(decode("[Gmail]/Papelera").unwrap(), "[Gmail]/Papelera");
        assert_eq!(decode("Borradores &AOE-").unwrap(), "Borradores á");
    }

    #[test]
    fn astral_plane_uses_surrogates() {
        let encoded = encode("📧");
        assert_eq!(decode(&encoded).unwrap(), "📧");
    }

    #[test]
    fn malformed_sections() {
        assert!(decode("&unterminated").is_none());
        assert!(decode("&AOE").is_none());
        assert!(decode("&***-").is_none());
    }

    #[test]
    fn raw_utf8_passes_through() {
        assert_eq!(decode("Entwürfe").unwrap(), "Entwürfe");
    }

    proptest! {
        #[test]
        fn encode_then_decode_is_identity(name in "\\PC{0,24}") {
            prop_assert_eq!(decode(&encode(&name)).unwrap(), name);
        }

        #[test]
        fn encoded_names_are_printable_ascii(name in "\\PC{0,24}") {
            prop_assert!(encode(&name).bytes().all(|b| (0x20..=0x7e).contains(&b)));
        }
    }
}

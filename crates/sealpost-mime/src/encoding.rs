//! Human-oriented base-32 encoding (z-base-32).
//!
//! Used to turn random nonces into boundary-safe text. The alphabet has
//! no characters that need quoting inside a MIME `boundary` parameter.

/// The z-base-32 alphabet.
const ALPHABET: &[u8; 32] = b"ybndrfg8ejkmcpqxot1uwisza345h769";

/// Encodes data with z-base-32.
///
/// Bits are consumed most significant first; the final group is
/// zero-padded. No padding characters are emitted, so the output has
/// `ceil(8 * data.len() / 5)` characters.
#[must_use]
pub fn encode_zbase32(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut acc: u16 = 0;
    let mut bits = 0u32;

    for &byte in data {
        acc = (acc << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[usize::from((acc >> bits) & 0x1f)]));
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(char::from(ALPHABET[usize::from((acc << (5 - bits)) & 0x1f)]));
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode_zbase32(&[0xf0, 0xbf, 0xc7]), "6n9hq");
        assert_eq!(encode_zbase32(&[0xd4, 0x7a, 0x04]), "4t7ye");
        assert_eq!(encode_zbase32(&[0x00]), "yy");
        assert_eq!(encode_zbase32(&[0xff]), "9h");
    }

    #[test]
    fn test_empty() {
        assert_eq!(encode_zbase32(&[]), "");
    }

    #[test]
    fn test_nonce_length() {
        assert_eq!(encode_zbase32(&[0u8; 8]).len(), 13);
        assert_eq!(encode_zbase32(&[0xa5u8; 12]).len(), 20);
    }

    #[test]
    fn test_alphabet_only() {
        let encoded = encode_zbase32(b"Hello, World!");
        assert!(encoded.bytes().all(|b| ALPHABET.contains(&b)));
    }
}

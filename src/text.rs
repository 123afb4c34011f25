//! In-game character set.
//!
//! Names are stored in the cartridge's own single-byte encoding, terminated
//! by `0xFF`.  Only the printable subset used by names is mapped; the raw
//! bytes are always kept next to the decoded text, so nothing is ever
//! re-encoded from a `String`.

pub const TERMINATOR: u8 = 0xFF;

fn decode_byte(byte: u8) -> char {
    match byte {
        0xA1..=0xAA => (b'0' + (byte - 0xA1)) as char,
        0xAB        => '!',
        0xAC        => '?',
        0xAD        => '.',
        0xAE        => '-',
        0xB8        => ',',
        0xBB..=0xD4 => (b'A' + (byte - 0xBB)) as char,
        0xD5..=0xEE => (b'a' + (byte - 0xD5)) as char,
        _           => ' ',
    }
}

/// Decode a fixed-width name field.  Stops at the terminator; unmapped
/// bytes become spaces and surrounding whitespace is trimmed.
pub fn decode(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .take_while(|&&b| b != TERMINATOR)
        .map(|&b| decode_byte(b))
        .collect();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_letters_and_digits() {
        assert_eq!(decode(&[0xCC, 0xBF, 0xBE, 0xFF, 0x00, 0x00]), "RED");
        assert_eq!(decode(&[0xC7, 0xD5, 0xF0, 0xA1, 0xAA]), "Ma 09");
        assert_eq!(decode(&[0xE2, 0xD9, 0xEE, 0xAB]), "nez!");
    }

    #[test]
    fn unmapped_bytes_become_trimmed_spaces() {
        assert_eq!(decode(&[0x00, 0xBB, 0x00]), "A");
        assert_eq!(decode(&[TERMINATOR, 0xBB]), "");
    }
}

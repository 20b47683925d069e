/// Text rendering of captured byte pairs.

use crate::transaction::BytePair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Hex,
    Decimal,
    Ascii,
    Binary,
}

/// Append one rendered byte. Hex and binary are not zero padded (`0x5`,
/// `0b101`). ASCII is the raw byte in quotes, control characters and bytes
/// above 0x7f included, so the output is not guaranteed to be UTF-8.
pub fn write_byte(out: &mut Vec<u8>, format: OutputFormat, byte: u8) {
    match format {
        OutputFormat::Hex => out.extend_from_slice(format!("0x{:x}", byte).as_bytes()),
        OutputFormat::Decimal => out.extend_from_slice(byte.to_string().as_bytes()),
        OutputFormat::Ascii => out.extend_from_slice(&[b'\'', byte, b'\'']),
        OutputFormat::Binary => out.extend_from_slice(format!("0b{:b}", byte).as_bytes()),
    }
}

pub fn format_byte(format: OutputFormat, byte: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    write_byte(&mut out, format, byte);
    out
}

fn write_pair(out: &mut Vec<u8>, format: OutputFormat, pair: BytePair) {
    write_byte(out, format, pair.mosi);
    out.extend_from_slice(b" --> <-- ");
    write_byte(out, format, pair.miso);
}

pub fn format_pair(format: OutputFormat, pair: BytePair) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    write_pair(&mut out, format, pair);
    out
}

/// Render a whole transaction as one block, one line per pair.
///
/// An empty transaction is a single blank line. A `(0x00, 0x00)` pair is also
/// rendered as a blank line, so a genuine all-zero exchange looks the same as
/// an idle slot.
pub fn format_transaction(format: OutputFormat, pairs: &[BytePair]) -> Vec<u8> {
    if pairs.is_empty() {
        return b"\n".to_vec();
    }

    let mut block = Vec::with_capacity(pairs.len() * 24);
    for pair in pairs {
        if !pair.is_idle() {
            write_pair(&mut block, format, *pair);
        }
        block.push(b'\n');
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_formats() {
        assert_eq!(format_byte(OutputFormat::Hex, 0x05), b"0x5".to_vec());
        assert_eq!(format_byte(OutputFormat::Hex, 0xA6), b"0xa6".to_vec());
        assert_eq!(format_byte(OutputFormat::Decimal, 0xA6), b"166".to_vec());
        assert_eq!(format_byte(OutputFormat::Ascii, b'A'), b"'A'".to_vec());
        assert_eq!(format_byte(OutputFormat::Binary, 0x05), b"0b101".to_vec());
        assert_eq!(format_byte(OutputFormat::Binary, 0x00), b"0b0".to_vec());
    }

    #[test]
    fn test_ascii_control_characters_are_raw() {
        let line = format_pair(OutputFormat::Ascii, BytePair::new(0x41, 0x00));
        assert_eq!(line, b"'A' --> <-- '\x00'".to_vec());
        assert_eq!(line.len(), "'A' --> <-- ''".len() + 1);
    }

    #[test]
    fn test_ascii_high_bytes_are_raw() {
        assert_eq!(format_byte(OutputFormat::Ascii, 0xE9), vec![b'\'', 0xE9, b'\'']);
        let line = format_pair(OutputFormat::Ascii, BytePair::new(0xFF, 0x80));
        assert_eq!(line, b"'\xff' --> <-- '\x80'".to_vec());
    }

    #[test]
    fn test_zero_pair_is_blank() {
        let block = format_transaction(OutputFormat::Ascii, &[BytePair::new(0, 0)]);
        assert_eq!(block, b"\n".to_vec());
    }

    #[test]
    fn test_empty_transaction_is_blank_line() {
        for format in [OutputFormat::Hex, OutputFormat::Decimal, OutputFormat::Ascii, OutputFormat::Binary] {
            assert_eq!(format_transaction(format, &[]), b"\n".to_vec());
        }
    }

    #[test]
    fn test_transaction_block() {
        let pairs = [
            BytePair::new(0x9F, 0xFF),
            BytePair::new(0x00, 0x00),
            BytePair::new(0x00, 0xEF),
        ];
        assert_eq!(
            format_transaction(OutputFormat::Hex, &pairs),
            b"0x9f --> <-- 0xff\n\n0x0 --> <-- 0xef\n".to_vec()
        );
        assert_eq!(
            format_transaction(OutputFormat::Decimal, &pairs),
            b"159 --> <-- 255\n\n0 --> <-- 239\n".to_vec()
        );
    }

    #[test]
    fn test_format_deserialize() {
        let format: OutputFormat = serde_yaml::from_str("binary").unwrap();
        assert_eq!(format, OutputFormat::Binary);
        assert!(serde_yaml::from_str::<OutputFormat>("octal").is_err());
    }
}

//! Code page 437 decoding.
//!
//! Info files are written for DOS-era terminals: every byte is one glyph.
//! The low half is ASCII (control bytes pass through unchanged), the high
//! half is the IBM PC set of accented letters, box drawing and shading.

/// Unicode code points for bytes 0x80..=0xFF.
const HIGH_HALF: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Decode one byte.
pub fn decode_byte(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        HIGH_HALF[(byte - 0x80) as usize]
    }
}

/// Decode a byte slice. Never fails: every byte has a mapping.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().copied().map(decode_byte).collect()
}

/// Split raw text into lines.
///
/// A line ends at `\r\n`, a lone `\r` or `\n`, or one of the control bytes
/// 0x0B, 0x0C, 0x1C, 0x1D and 0x1E. A terminator at the very end does not
/// produce an extra empty line.
pub fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let end = i;
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            b'\r' | b'\n' | 0x0b | 0x0c | 0x1c..=0x1e => i += 1,
            _ => {
                i += 1;
                continue;
            }
        }
        lines.push(&bytes[start..end]);
        start = i;
    }

    if start < bytes.len() {
        lines.push(&bytes[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode(b"Hello, NFO!"), "Hello, NFO!");
        assert_eq!(decode_byte(0x1b), '\u{1b}');
    }

    #[test]
    fn box_drawing_and_shading() {
        assert_eq!(decode(&[0xC9, 0xCD, 0xBB]), "╔═╗");
        assert_eq!(decode(&[0xB0, 0xB1, 0xB2, 0xDB]), "░▒▓█");
    }

    #[test]
    fn high_half_endpoints() {
        assert_eq!(decode_byte(0x80), 'Ç');
        assert_eq!(decode_byte(0xFE), '■');
        assert_eq!(decode_byte(0xFF), '\u{a0}');
    }

    #[test]
    fn decode_preserves_length_in_chars() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(decode(&bytes).chars().count(), 256);
    }

    #[test]
    fn split_lines_handles_crlf_and_trailing_terminator() {
        let lines = split_lines(b"one\r\ntwo\r\n\r\nfour\r\n");
        let expected: Vec<&[u8]> = vec![&b"one"[..], &b"two"[..], &b""[..], &b"four"[..]];
        assert_eq!(lines, expected);
    }

    #[test]
    fn split_lines_without_terminator() {
        assert_eq!(split_lines(b"solo"), vec![&b"solo"[..]]);
        let expected: Vec<&[u8]> = vec![&b"a"[..], &b"b"[..]];
        assert_eq!(split_lines(b"a\nb"), expected);
    }

    #[test]
    fn split_lines_empty_input() {
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"\n"), vec![&b""[..]]);
        assert_eq!(split_lines(b"\r\n"), vec![&b""[..]]);
    }

    #[test]
    fn split_lines_bare_carriage_returns() {
        let expected: Vec<&[u8]> = vec![&b"a"[..], &b"b"[..], &b"c"[..]];
        assert_eq!(split_lines(b"a\rb\rc"), expected);

        // `\r` then `\r\n` is two breaks, not one.
        let expected: Vec<&[u8]> = vec![&b"a"[..], &b""[..], &b"b"[..]];
        assert_eq!(split_lines(b"a\r\r\nb"), expected);

        // `\n\r` is two breaks as well.
        assert_eq!(split_lines(b"a\n\rb"), expected);
    }

    #[test]
    fn split_lines_control_separators() {
        for sep in [0x0b, 0x0c, 0x1c, 0x1d, 0x1e] {
            let text = [b'x', sep, b'y', sep];
            let expected: Vec<&[u8]> = vec![&b"x"[..], &b"y"[..]];
            assert_eq!(split_lines(&text), expected, "separator {sep:#04x}");
        }
        // 0x1F and 0x85 are glyphs in CP437, not breaks.
        assert_eq!(split_lines(b"a\x1fb\x85c").len(), 1);
    }
}

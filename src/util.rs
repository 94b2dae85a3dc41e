//! Bit-flag helpers and wire-level byte classification.

/// Operations on flag words.
pub trait FlagOperations<T> {
    /// Sets the given flag bits.
    fn set(&mut self, other: T);
    /// Clears the given flag bits.
    fn unset(&mut self, other: T);
    /// Returns true if any of the given flag bits are set.
    fn is_set(&self, other: T) -> bool;
}

impl FlagOperations<u64> for u64 {
    fn set(&mut self, other: u64) {
        *self |= other;
    }
    fn unset(&mut self, other: u64) {
        *self &= !other;
    }
    fn is_set(&self, other: u64) -> bool {
        self & other != 0
    }
}

/// Returns true if the byte is an RFC 9110 token character.
///
/// See <https://www.rfc-editor.org/rfc/rfc9110.html#section-5.6.2>
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// SP / HTAB
pub fn is_tab_or_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// CR / LF
pub fn is_line(c: u8) -> bool {
    c == b'\r' || c == b'\n'
}

/// Visible ASCII, the field-value character set minus SP/HTAB.
pub fn is_field_vchar(c: u8) -> bool {
    c > 0x20 && c < 0x7f
}

/// obs-text, tolerated in field values only by explicit flag.
pub fn is_obs_text(c: u8) -> bool {
    c >= 0x80
}

/// Returns true if the byte may appear in a request target.
///
/// Admits the RFC 3986 unreserved and reserved sets plus `%`.
pub fn is_uri_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b':'
                | b'/'
                | b'?'
                | b'#'
                | b'['
                | b']'
                | b'@'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b'%'
        )
}

/// Returns the slice with leading and trailing SP/HTAB removed.
pub fn trimmed(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|&c| !is_tab_or_space(c))
        .unwrap_or(input.len());
    let end = input
        .iter()
        .rposition(|&c| !is_tab_or_space(c))
        .map(|p| p + 1)
        .unwrap_or(start);
    &input[start..end]
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b'a', true)]
    #[case(b'Z', true)]
    #[case(b'0', true)]
    #[case(b'~', true)]
    #[case(b'|', true)]
    #[case(b':', false)]
    #[case(b' ', false)]
    #[case(b'(', false)]
    #[case(b'\\', false)]
    #[case(0x80, false)]
    fn test_token_char(#[case] input: u8, #[case] expected: bool) {
        assert_eq!(is_token_char(input), expected);
    }

    #[rstest]
    #[case(b"value", b"value")]
    #[case(b"  value", b"value")]
    #[case(b"value\t ", b"value")]
    #[case(b" \t value \t ", b"value")]
    #[case(b"\t \t", b"")]
    #[case(b"", b"")]
    fn test_trimmed(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(trimmed(input), expected);
    }

    #[test]
    fn test_flag_operations() {
        let mut flags = 0u64;
        flags.set(0x6);
        assert!(flags.is_set(0x2));
        assert!(flags.is_set(0x4));
        assert!(!flags.is_set(0x1));
        flags.unset(0x2);
        assert!(!flags.is_set(0x2));
        assert!(flags.is_set(0x4));
    }
}

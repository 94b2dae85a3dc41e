//! Complete (non-incremental) sub-grammars used by the semantic scans.
//!
//! The incremental machines hand fully delimited slices to these parsers:
//! a version token, a header value, a method range. Anything that has to
//! survive suspension mid-token lives in the state machines instead.

use crate::util::is_token_char;
use nom::{
    bytes::complete::{tag, take_while_m_n},
    combinator::all_consuming,
    sequence::{preceded, separated_pair},
    IResult,
};

fn version_digit(input: &[u8]) -> IResult<&[u8], u8> {
    let (rest, digit) = take_while_m_n(1, 1, |c: u8| c.is_ascii_digit())(input)?;
    Ok((rest, digit[0] - b'0'))
}

/// `HTTP/<d>.<d>`
pub fn http_version(input: &[u8]) -> IResult<&[u8], (u8, u8)> {
    preceded(
        tag("HTTP/"),
        separated_pair(version_digit, tag("."), version_digit),
    )(input)
}

/// Parses a version token that must be exactly `HTTP/<d>.<d>`.
pub fn parse_http_version(input: &[u8]) -> Option<(u8, u8)> {
    all_consuming(http_version)(input)
        .map(|(_, version)| version)
        .ok()
}

/// Parses a decimal `Content-Length` value. The whole input must be
/// digits; anything else (including overflow) is rejected.
pub fn parse_content_length(input: &[u8]) -> Option<u64> {
    if input.is_empty() || !input.iter().all(u8::is_ascii_digit) {
        return None;
    }
    input.iter().try_fold(0u64, |acc, &c| {
        acc.checked_mul(10)?.checked_add(u64::from(c - b'0'))
    })
}

/// Returns true if `token` appears as a whole element of the list-typed
/// field value. Elements are token runs; commas, semicolons and optional
/// whitespace separate them.
pub fn token_list_contains(value: &[u8], token: &[u8]) -> bool {
    value
        .split(|&c| !is_token_char(c))
        .any(|element| element.eq_ignore_ascii_case(token))
}

/// `close` / `keep-alive` membership of a `Connection` value.
pub fn connection_options(value: &[u8]) -> (bool, bool) {
    (
        token_list_contains(value, b"close"),
        token_list_contains(value, b"keep-alive"),
    )
}

/// Methods defined to carry no body unless a flag says otherwise.
pub fn is_no_body_method(method: &[u8]) -> bool {
    method == b"GET" || method == b"HEAD" || method == b"OPTIONS" || method == b"TRACE"
}

/// Statuses defined to carry no body: 1xx, 204, 304.
pub fn is_no_body_status(code: u16) -> bool {
    (100..200).contains(&code) || code == 204 || code == 304
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"HTTP/1.1", Some((1, 1)))]
    #[case(b"HTTP/1.0", Some((1, 0)))]
    #[case(b"HTTP/2.0", Some((2, 0)))]
    #[case(b"HTTP/0.9", Some((0, 9)))]
    #[case(b"HTTP/1.", None)]
    #[case(b"HTTP/1.1 ", None)]
    #[case(b"HTTP/11.1", None)]
    #[case(b"http/1.1", None)]
    #[case(b"HTTP/hey", None)]
    #[case(b"", None)]
    fn test_parse_http_version(#[case] input: &[u8], #[case] expected: Option<(u8, u8)>) {
        assert_eq!(parse_http_version(input), expected);
    }

    #[rstest]
    #[case(b"0", Some(0))]
    #[case(b"10", Some(10))]
    #[case(b"18446744073709551615", Some(u64::MAX))]
    #[case(b"18446744073709551616", None)]
    #[case(b"12a", None)]
    #[case(b" 12", None)]
    #[case(b"", None)]
    #[case(b"-1", None)]
    fn test_parse_content_length(#[case] input: &[u8], #[case] expected: Option<u64>) {
        assert_eq!(parse_content_length(input), expected);
    }

    #[rstest]
    #[case(b"chunked", true)]
    #[case(b"Chunked", true)]
    #[case(b"gzip, chunked", true)]
    #[case(b"  chunked", true)]
    #[case(b"chunked;q=1", true)]
    #[case(b"gzip", false)]
    #[case(b"chunkedish", false)]
    #[case(b"", false)]
    fn test_chunked_token(#[case] value: &[u8], #[case] expected: bool) {
        assert_eq!(token_list_contains(value, b"chunked"), expected);
    }

    #[rstest]
    #[case(b"close", (true, false))]
    #[case(b"Close", (true, false))]
    #[case(b"keep-alive", (false, true))]
    #[case(b"Keep-Alive", (false, true))]
    #[case(b"keep-alive, close", (true, true))]
    #[case(b"upgrade", (false, false))]
    fn test_connection_options(#[case] value: &[u8], #[case] expected: (bool, bool)) {
        assert_eq!(connection_options(value), expected);
    }

    #[rstest]
    #[case(&b"GET"[..], true)]
    #[case(&b"HEAD"[..], true)]
    #[case(&b"OPTIONS"[..], true)]
    #[case(&b"TRACE"[..], true)]
    #[case(&b"POST"[..], false)]
    #[case(&b"DELETE"[..], false)]
    #[case(&b"GETX"[..], false)]
    fn test_no_body_method(#[case] method: &[u8], #[case] expected: bool) {
        assert_eq!(is_no_body_method(method), expected);
    }

    #[rstest]
    #[case(100, true)]
    #[case(101, true)]
    #[case(199, true)]
    #[case(204, true)]
    #[case(304, true)]
    #[case(200, false)]
    #[case(205, false)]
    #[case(404, false)]
    fn test_no_body_status(#[case] code: u16, #[case] expected: bool) {
        assert_eq!(is_no_body_status(code), expected);
    }
}

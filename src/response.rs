//! Status-line codec: `VERSION SP STATUS SP REASON CRLF`.

use crate::bstr::Bstr;
use crate::config::{ReadFlags, WriteFlags};
use crate::context::{read_eol, ReadContext, WriteContext};
use crate::error::HeaderError;
use crate::headers::parse_common;
use crate::parsers::parse_http_version;
use crate::scanner::Scanner;
use crate::sink::{FieldSink, Range, ValueSink};
use crate::state::{ReadState, WriteState};
use crate::util::is_line;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Parses the status line, emitting version, status and reason phrase
/// through the given sinks.
///
/// The status token is exactly three digits; `ROUGH_STATUS_CODE` loosens
/// the digit requirement and `ROUGH_STATUS_CODE_LENGTH` additionally
/// drops the length requirement. The reason phrase may be empty; see
/// <https://www.rfc-editor.org/rfc/rfc9112.html#section-4>.
pub fn parse_status_line<V, S, P>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    version: &mut V,
    status: &mut S,
    phrase: &mut P,
) -> Result<(), HeaderError>
where
    V: ValueSink,
    S: ValueSink,
    P: ValueSink,
{
    ctx.prepare_read(seq, ReadState::ResponseVersionInit);
    loop {
        match ctx.state() {
            ReadState::ResponseVersionInit => {
                ctx.change_state(ReadState::ResponseVersion, seq.pos());
            }
            ReadState::ResponseVersion => {
                if ctx.is_flag(ReadFlags::ROUGH_RESPONSE_VERSION) {
                    loop {
                        match seq.current() {
                            Some(b' ') => break,
                            Some(_) => seq.consume(),
                            None => {
                                ctx.save_pos(seq.pos());
                                return Err(HeaderError::InvalidVersion);
                            }
                        }
                    }
                } else {
                    if seq.remain() < 8 {
                        ctx.save_pos(seq.pos());
                        return Err(HeaderError::InvalidVersion);
                    }
                    let window = seq.slice(seq.pos(), seq.pos() + 8);
                    match parse_http_version(window) {
                        Some((major, minor)) => {
                            ctx.scan_http_version(major, minor);
                            let end = seq.pos() + 8;
                            seq.set_pos(end);
                        }
                        None => {
                            ctx.fail_pos(seq.pos());
                            return Err(HeaderError::InvalidVersion);
                        }
                    }
                }
                let end = seq.pos();
                version.accept_range(seq.as_bytes(), Range::new(ctx.start_pos(), end));
                seq.set_pos(end);
                ctx.change_state(ReadState::ResponseVersionSpace, end);
            }
            ReadState::ResponseVersionSpace => {
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                if !seq.consume_if(b' ') {
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                ctx.change_state(ReadState::StatusCode, seq.pos());
            }
            ReadState::StatusCode => {
                if ctx.is_flag(ReadFlags::ROUGH_STATUS_CODE) {
                    let length_ok = |len: usize, on_suspend: bool, ctx: &ReadContext| {
                        if ctx.is_flag(ReadFlags::ROUGH_STATUS_CODE_LENGTH) || len == 3 {
                            true
                        } else if on_suspend {
                            // a short token may still grow
                            len < 3
                        } else {
                            false
                        }
                    };
                    loop {
                        match seq.current() {
                            Some(b' ') => break,
                            Some(_) => seq.consume(),
                            None => {
                                if !length_ok(seq.pos() - ctx.start_pos(), true, ctx) {
                                    ctx.fail_pos(seq.pos());
                                } else {
                                    ctx.save_pos(seq.pos());
                                }
                                return Err(HeaderError::InvalidStatusCode);
                            }
                        }
                    }
                    if !length_ok(seq.pos() - ctx.start_pos(), false, ctx) {
                        ctx.fail_pos(seq.pos());
                        return Err(HeaderError::InvalidStatusCode);
                    }
                } else {
                    if seq.remain() < 3 {
                        ctx.save_pos(seq.pos());
                        return Err(HeaderError::InvalidStatusCode);
                    }
                    let mut code: u16 = 0;
                    for _ in 0..3 {
                        match seq.current() {
                            Some(c) if c.is_ascii_digit() => {
                                code = code * 10 + u16::from(c - b'0');
                                seq.consume();
                            }
                            _ => {
                                ctx.fail_pos(seq.pos());
                                return Err(HeaderError::InvalidStatusCode);
                            }
                        }
                    }
                    ctx.scan_status_code(code);
                }
                let end = seq.pos();
                status.accept_range(seq.as_bytes(), Range::new(ctx.start_pos(), end));
                seq.set_pos(end);
                ctx.change_state(ReadState::StatusCodeSpace, end);
            }
            ReadState::StatusCodeSpace => {
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                if !seq.consume_if(b' ') {
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                ctx.change_state(ReadState::ReasonPhrase, seq.pos());
            }
            ReadState::ReasonPhrase => {
                loop {
                    match seq.current() {
                        Some(c) if is_line(c) => break,
                        Some(_) => seq.consume(),
                        None => {
                            ctx.save_pos(seq.pos());
                            return Err(HeaderError::InvalidReasonPhrase);
                        }
                    }
                }
                let end = seq.pos();
                phrase.accept_range(seq.as_bytes(), Range::new(ctx.start_pos(), end));
                seq.set_pos(end);
                ctx.change_state(ReadState::ReasonPhraseLineOneByte, end);
            }
            ReadState::ReasonPhraseLineOneByte | ReadState::ReasonPhraseLineTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::ReasonPhraseLineOneByte,
                    ReadState::ReasonPhraseLineTwoByte,
                    ReadState::HeaderInit,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
                return Ok(());
            }
            _ => return Ok(()),
        }
    }
}

/// Parses a full response head: status line, then the header block.
pub fn parse_response<V, S, P, H>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    version: &mut V,
    status: &mut S,
    phrase: &mut P,
    header: &mut H,
) -> Result<(), HeaderError>
where
    V: ValueSink,
    S: ValueSink,
    P: ValueSink,
    H: FieldSink,
{
    parse_status_line(ctx, seq, version, status, phrase)?;
    parse_common(ctx, seq, header)
}

/// Renders a status line and enters the header write state.
pub fn render_status_line(
    ctx: &mut WriteContext,
    out: &mut Bstr,
    status: u16,
    phrase: &[u8],
    version_str: &str,
) -> Result<(), HeaderError> {
    if ctx.state() != WriteState::Uninit {
        return Err(HeaderError::InvalidState);
    }
    ctx.set_server(true);
    if status < 100 || status > 599 {
        return Err(HeaderError::InvalidStatusCode);
    }
    ctx.scan_status_code(status);
    if !ctx.is_flag(WriteFlags::TRUST_VERSION) {
        match parse_http_version(version_str.as_bytes()) {
            Some((major, minor)) => ctx.scan_http_version(major, minor),
            None => return Err(HeaderError::InvalidVersion),
        }
    }
    if !ctx.is_flag(WriteFlags::TRUST_PHRASE)
        && phrase.iter().any(|&c| c == b'\r' || c == b'\n')
    {
        return Err(HeaderError::InvalidReasonPhrase);
    }
    out.add(version_str);
    out.push(b' ');
    let code = [
        b'0' + (status / 100) as u8,
        b'0' + (status % 100 / 10) as u8,
        b'0' + (status % 10) as u8,
    ];
    out.add(&code[..]);
    out.push(b' ');
    out.add(phrase);
    out.add("\r\n");
    ctx.set_state(WriteState::Header);
    Ok(())
}

lazy_static! {
    static ref REASON_PHRASES: HashMap<u16, &'static str> = [
        (100, "Continue"),
        (101, "Switching Protocols"),
        (102, "Processing"),
        (103, "Early Hints"),
        (200, "OK"),
        (201, "Created"),
        (202, "Accepted"),
        (203, "Non-Authoritative Information"),
        (204, "No Content"),
        (205, "Reset Content"),
        (206, "Partial Content"),
        (207, "Multi-Status"),
        (208, "Already Reported"),
        (226, "IM Used"),
        (300, "Multiple Choices"),
        (301, "Moved Permanently"),
        (302, "Found"),
        (303, "See Other"),
        (304, "Not Modified"),
        (305, "Use Proxy"),
        (307, "Temporary Redirect"),
        (308, "Permanent Redirect"),
        (400, "Bad Request"),
        (401, "Unauthorized"),
        (402, "Payment Required"),
        (403, "Forbidden"),
        (404, "Not Found"),
        (405, "Method Not Allowed"),
        (406, "Not Acceptable"),
        (407, "Proxy Authentication Required"),
        (408, "Request Timeout"),
        (409, "Conflict"),
        (410, "Gone"),
        (411, "Length Required"),
        (412, "Precondition Failed"),
        (413, "Content Too Large"),
        (414, "URI Too Long"),
        (415, "Unsupported Media Type"),
        (416, "Range Not Satisfiable"),
        (417, "Expectation Failed"),
        (418, "I'm a teapot"),
        (421, "Misdirected Request"),
        (422, "Unprocessable Content"),
        (423, "Locked"),
        (424, "Failed Dependency"),
        (425, "Too Early"),
        (426, "Upgrade Required"),
        (428, "Precondition Required"),
        (429, "Too Many Requests"),
        (431, "Request Header Fields Too Large"),
        (451, "Unavailable For Legal Reasons"),
        (500, "Internal Server Error"),
        (501, "Not Implemented"),
        (502, "Bad Gateway"),
        (503, "Service Unavailable"),
        (504, "Gateway Timeout"),
        (505, "HTTP Version Not Supported"),
        (506, "Variant Also Negotiates"),
        (507, "Insufficient Storage"),
        (508, "Loop Detected"),
        (510, "Not Extended"),
        (511, "Network Authentication Required"),
    ]
    .iter()
    .copied()
    .collect();
}

/// The canonical reason phrase for a status code, or the empty string
/// for codes without one.
pub fn reason_phrase(status: u16) -> &'static str {
    REASON_PHRASES.get(&status).copied().unwrap_or("")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sink::StatusCode;
    use crate::table::Table;
    use rstest::rstest;

    struct Parsed {
        ctx: ReadContext,
        version: Bstr,
        status: StatusCode,
        phrase: Bstr,
        headers: Table<Bstr>,
        result: Result<(), HeaderError>,
    }

    fn parse(flags: u64, input: &[u8]) -> Parsed {
        let mut ctx = ReadContext::with_flags(flags);
        let mut seq = Scanner::new(input);
        let mut version = Bstr::new();
        let mut status = StatusCode::new();
        let mut phrase = Bstr::new();
        let mut headers: Table<Bstr> = Table::new();
        let result = parse_response(
            &mut ctx,
            &mut seq,
            &mut version,
            &mut status,
            &mut phrase,
            &mut headers,
        );
        Parsed {
            ctx,
            version,
            status,
            phrase,
            headers,
            result,
        }
    }

    #[rstest]
    #[case(b"HTTP/1.1 200 OK\r\n\r\n", "HTTP/1.1", 200, "OK", 0)]
    #[case(b"HTTP/1.1 200 \r\n\r\n", "HTTP/1.1", 200, "", 0)]
    #[case(b"HTTP/1.0 404 Not Found\r\n\r\n", "HTTP/1.0", 404, "Not Found", 0)]
    #[case(b"HTTP/1.1 200 OK\r\nkey: value\r\n\r\n", "HTTP/1.1", 200, "OK", 1)]
    #[case(
        b"HTTP/1.1 200 OK\r\nkey: value\r\nkey2: value2\r\n\r\n",
        "HTTP/1.1",
        200,
        "OK",
        2
    )]
    fn parse_success(
        #[case] input: &[u8],
        #[case] version: &str,
        #[case] status: u16,
        #[case] phrase: &str,
        #[case] header_count: usize,
    ) {
        let parsed = parse(0, input);
        assert_eq!(parsed.result, Ok(()));
        assert_eq!(parsed.ctx.state(), ReadState::BodyInit);
        assert_eq!(parsed.version, version);
        assert_eq!(parsed.status.get(), status);
        assert_eq!(parsed.phrase, phrase);
        assert_eq!(parsed.headers.size(), header_count);
        assert!(!parsed.ctx.scanning_request());
    }

    #[rstest]
    #[case(b"HTTP/1.1 0 OK\r\n\r\n", HeaderError::InvalidStatusCode, ReadState::StatusCode)]
    #[case(b"HTTP/1.1 2x0 OK\r\n\r\n", HeaderError::InvalidStatusCode, ReadState::StatusCode)]
    #[case(b"HTTX/1.1 200 OK\r\n\r\n", HeaderError::InvalidVersion, ReadState::ResponseVersion)]
    #[case(b"HTTP/1.1 200 OK\r\nkey\r\n\r\n", HeaderError::NotColon, ReadState::HeaderColon)]
    #[case(
        b"HTTP/1.1 200 OK\r\nkey: \r\n\r\n",
        HeaderError::InvalidHeaderValue,
        ReadState::HeaderValue
    )]
    fn parse_fatal(
        #[case] input: &[u8],
        #[case] expected: HeaderError,
        #[case] expected_state: ReadState,
    ) {
        let parsed = parse(0, input);
        assert_eq!(parsed.result, Err(expected));
        assert!(!parsed.ctx.is_resumable());
        assert_eq!(parsed.ctx.state(), expected_state);
    }

    #[test]
    fn parse_no_body_statuses() {
        let cases: [(&[u8], bool); 4] = [
            (b"HTTP/1.1 204 No Content\r\n\r\n", true),
            (b"HTTP/1.1 304 Not Modified\r\n\r\n", true),
            (b"HTTP/1.1 100 Continue\r\n\r\n", true),
            (b"HTTP/1.1 200 OK\r\n\r\n", false),
        ];
        for (input, expected) in cases.iter() {
            let parsed = parse(0, input);
            assert_eq!(parsed.result, Ok(()));
            assert_eq!(parsed.ctx.require_no_body(), *expected);
        }
    }

    #[test]
    fn parse_suspends_in_value() {
        let parsed = parse(0, b"HTTP/1.1 200 OK\r\nkey: value");
        assert_eq!(parsed.result, Err(HeaderError::InvalidHeaderValue));
        assert!(parsed.ctx.is_resumable());
        assert_eq!(parsed.ctx.adjusted_offset(), 17);
    }

    #[test]
    fn parse_rough_status_code() {
        // three-digit requirement still applies without the length flag
        let parsed = parse(ReadFlags::ROUGH_STATUS_CODE, b"HTTP/1.1 20x OK\r\n\r\n");
        assert_eq!(parsed.result, Ok(()));
        assert_eq!(parsed.status.get(), 20);

        let parsed = parse(ReadFlags::ROUGH_STATUS_CODE, b"HTTP/1.1 2000 OK\r\n\r\n");
        assert_eq!(parsed.result, Err(HeaderError::InvalidStatusCode));
        assert!(!parsed.ctx.is_resumable());

        let parsed = parse(
            ReadFlags::ROUGH_STATUS_CODE | ReadFlags::ROUGH_STATUS_CODE_LENGTH,
            b"HTTP/1.1 2000 OK\r\n\r\n",
        );
        assert_eq!(parsed.result, Ok(()));
        assert_eq!(parsed.status.get(), 200);
    }

    fn render(
        flags: u64,
        status: u16,
        phrase: &[u8],
        version: &str,
    ) -> (WriteContext, Bstr, Result<(), HeaderError>) {
        let mut ctx = WriteContext::with_flags(flags);
        let mut out = Bstr::new();
        let result = render_status_line(&mut ctx, &mut out, status, phrase, version);
        (ctx, out, result)
    }

    #[test]
    fn render_status_line_basics() {
        let (ctx, out, result) = render(0, 200, b"OK", "HTTP/1.1");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "HTTP/1.1 200 OK\r\n");
        assert_eq!(ctx.state(), WriteState::Header);
        assert!(ctx.is_server());
        assert!(!ctx.no_body());

        let (ctx, out, result) = render(0, 204, b"No Content", "HTTP/1.1");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "HTTP/1.1 204 No Content\r\n");
        assert!(ctx.no_body());
    }

    #[rstest]
    #[case(99, &b"x"[..], "HTTP/1.1", HeaderError::InvalidStatusCode)]
    #[case(600, &b"x"[..], "HTTP/1.1", HeaderError::InvalidStatusCode)]
    #[case(200, &b"O\rK"[..], "HTTP/1.1", HeaderError::InvalidReasonPhrase)]
    #[case(200, &b"OK"[..], "HTTP/eleven", HeaderError::InvalidVersion)]
    fn render_status_line_rejects(
        #[case] status: u16,
        #[case] phrase: &[u8],
        #[case] version: &str,
        #[case] expected: HeaderError,
    ) {
        let (_, _, result) = render(0, status, phrase, version);
        assert_eq!(result, Err(expected));
    }

    #[rstest]
    #[case(200, "OK")]
    #[case(204, "No Content")]
    #[case(404, "Not Found")]
    #[case(418, "I'm a teapot")]
    #[case(599, "")]
    fn test_reason_phrase(#[case] status: u16, #[case] expected: &str) {
        assert_eq!(reason_phrase(status), expected);
    }
}

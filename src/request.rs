//! Request-line codec: `METHOD SP TARGET SP VERSION CRLF`.

use crate::bstr::Bstr;
use crate::config::{ReadFlags, WriteFlags};
use crate::context::{read_eol, ReadContext, WriteContext};
use crate::error::HeaderError;
use crate::headers::{is_valid_key, parse_common};
use crate::parsers::parse_http_version;
use crate::scanner::Scanner;
use crate::sink::{FieldSink, Range, ValueSink};
use crate::state::{ReadState, WriteState};
use crate::util::{is_line, is_token_char, is_uri_char};

/// Parses the request line, emitting method, target and version through
/// the given sinks.
///
/// With `LEGACY_HTTP_0_9`, a line terminator where the version would
/// start is accepted as a versionless HTTP/0.9 request and the message
/// ends immediately after the line.
pub fn parse_request_line<M, P, V>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    method: &mut M,
    path: &mut P,
    version: &mut V,
) -> Result<(), HeaderError>
where
    M: ValueSink,
    P: ValueSink,
    V: ValueSink,
{
    ctx.prepare_read(seq, ReadState::MethodInit);
    loop {
        match ctx.state() {
            ReadState::MethodInit => {
                ctx.change_state(ReadState::Method, seq.pos());
            }
            ReadState::Method => {
                loop {
                    let current = match seq.current() {
                        Some(c) => c,
                        None => {
                            ctx.save_pos(seq.pos());
                            return Err(HeaderError::InvalidMethod);
                        }
                    };
                    let stop = if ctx.is_flag(ReadFlags::ROUGH_METHOD) {
                        current == b' '
                    } else {
                        !is_token_char(current)
                    };
                    if stop {
                        break;
                    }
                    seq.consume();
                }
                if seq.pos() == ctx.start_pos() {
                    // empty method
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::InvalidMethod);
                }
                let end = seq.pos();
                let range = Range::new(ctx.start_pos(), end);
                ctx.scan_method(range.slice(seq.as_bytes()));
                method.accept_range(seq.as_bytes(), range);
                seq.set_pos(end);
                ctx.change_state(ReadState::MethodSpace, end);
            }
            ReadState::MethodSpace => {
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                if !seq.consume_if(b' ') {
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                ctx.change_state(ReadState::Path, seq.pos());
            }
            ReadState::Path => {
                loop {
                    let current = match seq.current() {
                        Some(c) => c,
                        None => {
                            ctx.save_pos(seq.pos());
                            return Err(HeaderError::InvalidPath);
                        }
                    };
                    let stop = if ctx.is_flag(ReadFlags::ROUGH_PATH) {
                        current == b' '
                    } else {
                        !is_uri_char(current)
                    };
                    if stop {
                        break;
                    }
                    seq.consume();
                }
                if seq.pos() == ctx.start_pos() {
                    // empty target
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::InvalidPath);
                }
                let end = seq.pos();
                path.accept_range(seq.as_bytes(), Range::new(ctx.start_pos(), end));
                seq.set_pos(end);
                ctx.change_state(ReadState::PathSpace, end);
            }
            ReadState::PathSpace => {
                let current = match seq.current() {
                    Some(c) => c,
                    None => {
                        ctx.save_pos(seq.pos());
                        return Err(HeaderError::NotSpace);
                    }
                };
                if !seq.consume_if(b' ') {
                    if ctx.is_flag(ReadFlags::LEGACY_HTTP_0_9) && is_line(current) {
                        ctx.scan_http_version(0, 9);
                        ctx.change_state(ReadState::RequestVersionLineOneByte, seq.pos());
                        continue;
                    }
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::NotSpace);
                }
                ctx.change_state(ReadState::RequestVersion, seq.pos());
            }
            ReadState::RequestVersion => {
                if ctx.is_flag(ReadFlags::ROUGH_REQUEST_VERSION) {
                    loop {
                        let current = match seq.current() {
                            Some(c) => c,
                            None => {
                                ctx.save_pos(seq.pos());
                                return Err(HeaderError::InvalidVersion);
                            }
                        };
                        if is_line(current) {
                            break;
                        }
                        seq.consume();
                    }
                } else {
                    // the token is fixed-width: HTTP/x.x
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
                ctx.change_state(ReadState::RequestVersionLineOneByte, end);
            }
            ReadState::RequestVersionLineOneByte | ReadState::RequestVersionLineTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::RequestVersionLineOneByte,
                    ReadState::RequestVersionLineTwoByte,
                    ReadState::HeaderInit,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
                if ctx.is_flag(ReadFlags::LEGACY_HTTP_0_9)
                    && ctx.http_major_version() == 0
                    && ctx.http_minor_version() == 9
                {
                    // bare METHOD PATH: no headers, no body
                    ctx.change_state(ReadState::BodyEnd, seq.pos());
                }
                return Ok(());
            }
            _ => return Ok(()),
        }
    }
}

/// Parses a full request head: request line, then the header block.
pub fn parse_request<M, P, V, H>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    method: &mut M,
    path: &mut P,
    version: &mut V,
    header: &mut H,
) -> Result<(), HeaderError>
where
    M: ValueSink,
    P: ValueSink,
    V: ValueSink,
    H: FieldSink,
{
    parse_request_line(ctx, seq, method, path, version)?;
    if ctx.state() == ReadState::BodyEnd {
        // HTTP/0.9 has no header block
        return Ok(());
    }
    parse_common(ctx, seq, header)
}

/// Renders a request line and enters the header write state.
///
/// `version_str` of `None` renders a versionless HTTP/0.9 line, which
/// needs `LEGACY_HTTP_0_9`.
pub fn render_request_line(
    ctx: &mut WriteContext,
    out: &mut Bstr,
    method: &[u8],
    path: &[u8],
    version_str: Option<&str>,
) -> Result<(), HeaderError> {
    if ctx.state() != WriteState::Uninit {
        return Err(HeaderError::InvalidState);
    }
    ctx.set_server(false);
    if ctx.is_flag(WriteFlags::ROUGH_METHOD) {
        if method
            .iter()
            .any(|&c| c == b' ' || c == b'\r' || c == b'\n')
        {
            return Err(HeaderError::InvalidMethod);
        }
    } else if !is_valid_key(method, false) {
        return Err(HeaderError::InvalidMethod);
    }
    if ctx.is_flag(WriteFlags::ROUGH_PATH) {
        if path.iter().any(|&c| c == b' ' || c == b'\r' || c == b'\n') {
            return Err(HeaderError::InvalidPath);
        }
    } else if path.is_empty() || !path.iter().all(|&c| is_uri_char(c)) {
        return Err(HeaderError::InvalidPath);
    }
    match version_str {
        None => {
            if !ctx.is_flag(WriteFlags::LEGACY_HTTP_0_9) {
                return Err(HeaderError::InvalidVersion);
            }
        }
        Some(version) => {
            if !ctx.is_flag(WriteFlags::TRUST_VERSION) {
                match parse_http_version(version.as_bytes()) {
                    Some((major, minor)) => ctx.scan_http_version(major, minor),
                    None => return Err(HeaderError::InvalidVersion),
                }
            }
        }
    }
    ctx.scan_method(method);
    out.add(method);
    out.push(b' ');
    out.add(path);
    if let Some(version) = version_str {
        out.push(b' ');
        out.add(version);
    }
    out.add("\r\n");
    ctx.set_state(WriteState::Header);
    Ok(())
}

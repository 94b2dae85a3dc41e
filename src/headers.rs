//! Field-block codec: parses and renders header and trailer lines.
//!
//! One machine serves both blocks; the state pairs (`HeaderKey` /
//! `TrailerKey`, ...) differ only in where the final empty line leads:
//! end of headers enters the body, end of trailers ends the message.

use crate::bstr::Bstr;
use crate::config::{ReadFlags, WriteFlags};
use crate::context::{read_eol, ReadContext, WriteContext};
use crate::error::HeaderError;
use crate::scanner::Scanner;
use crate::sink::{FieldRange, FieldSink, Range};
use crate::state::{ReadState, WriteState};
use crate::util::{is_field_vchar, is_line, is_obs_text, is_tab_or_space, is_token_char};

/// Parses header or trailer lines until the blank line that ends the
/// block.
///
/// Each field is scanned semantically, then handed to `sink`; the sink
/// sees a field exactly once even across suspensions. Returns `Err` with
/// a resumable context when input runs out mid-field, and a fatal context
/// on a grammar violation.
pub fn parse_common<H: FieldSink>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    sink: &mut H,
) -> Result<(), HeaderError> {
    ctx.prepare_read(seq, ReadState::HeaderInit);
    loop {
        match ctx.state() {
            ReadState::HeaderInit | ReadState::TrailerInit => {
                let in_header = ctx.state() == ReadState::HeaderInit;
                let current = match seq.current() {
                    Some(c) => c,
                    None => {
                        ctx.save_pos(seq.pos());
                        return Err(HeaderError::InvalidHeader);
                    }
                };
                if is_line(current) {
                    let next = if in_header {
                        ReadState::HeaderLastEolOneByte
                    } else {
                        ReadState::TrailerLastEolOneByte
                    };
                    ctx.change_state(next, seq.pos());
                } else {
                    let next = if in_header {
                        ReadState::HeaderKey
                    } else {
                        ReadState::TrailerKey
                    };
                    ctx.change_state(next, seq.pos());
                }
            }
            ReadState::HeaderKey | ReadState::TrailerKey => {
                let in_header = ctx.state() == ReadState::HeaderKey;
                loop {
                    let current = match seq.current() {
                        Some(c) => c,
                        None => {
                            ctx.save_pos(seq.pos());
                            return Err(HeaderError::InvalidHeaderKey);
                        }
                    };
                    let stop = if ctx.is_flag(ReadFlags::ROUGH_HEADER_KEY) {
                        current == b':'
                    } else {
                        !is_token_char(current)
                    };
                    if stop {
                        break;
                    }
                    seq.consume();
                }
                if seq.pos() == ctx.start_pos() {
                    // empty key
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::InvalidHeaderKey);
                }
                ctx.save_header_key(ctx.start_pos(), seq.pos());
                let next = if in_header {
                    ReadState::HeaderColon
                } else {
                    ReadState::TrailerColon
                };
                ctx.change_state(next, seq.pos());
            }
            ReadState::HeaderColon | ReadState::TrailerColon => {
                let in_header = ctx.state() == ReadState::HeaderColon;
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return Err(HeaderError::NotColon);
                }
                if !seq.consume_if(b':') {
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::NotColon);
                }
                let next = if in_header {
                    ReadState::HeaderPreSpace
                } else {
                    ReadState::TrailerPreSpace
                };
                ctx.change_state(next, seq.pos());
            }
            ReadState::HeaderPreSpace | ReadState::TrailerPreSpace => {
                let in_header = ctx.state() == ReadState::HeaderPreSpace;
                if !ctx.is_flag(ReadFlags::NOT_TRIM_PRE_SPACE) {
                    loop {
                        let current = match seq.current() {
                            Some(c) => c,
                            None => {
                                ctx.save_pos(seq.pos());
                                return Err(HeaderError::InvalidHeaderValue);
                            }
                        };
                        if !is_tab_or_space(current) {
                            break;
                        }
                        seq.consume();
                    }
                }
                let next = if in_header {
                    ReadState::HeaderValue
                } else {
                    ReadState::TrailerValue
                };
                ctx.change_state(next, seq.pos());
            }
            ReadState::HeaderValue | ReadState::TrailerValue => {
                let in_header = ctx.state() == ReadState::HeaderValue;
                loop {
                    let current = match seq.current() {
                        Some(c) => c,
                        None => {
                            ctx.save_pos(seq.pos());
                            return Err(HeaderError::InvalidHeaderValue);
                        }
                    };
                    let stop = if ctx.is_flag(ReadFlags::ROUGH_HEADER_VALUE) {
                        is_line(current)
                    } else if ctx.is_flag(ReadFlags::ALLOW_OBS_TEXT) {
                        !is_field_vchar(current)
                            && !is_tab_or_space(current)
                            && !is_obs_text(current)
                    } else {
                        !is_field_vchar(current) && !is_tab_or_space(current)
                    };
                    if stop {
                        break;
                    }
                    seq.consume();
                }
                let save = seq.pos();
                if !ctx.is_flag(ReadFlags::NOT_TRIM_POST_SPACE) && ctx.start_pos() != seq.pos() {
                    seq.backto();
                    while seq.current().map_or(false, is_tab_or_space) {
                        seq.backto();
                    }
                    seq.consume();
                }
                if seq.pos() == ctx.start_pos() {
                    // empty value
                    ctx.fail_pos(seq.pos());
                    return Err(HeaderError::InvalidHeaderValue);
                }
                let range = FieldRange {
                    key: ctx.header_key(),
                    value: Range::new(ctx.start_pos(), seq.pos()),
                };
                let src = seq.as_bytes();
                ctx.scan_header(range.key.slice(src), range.value.slice(src));
                // scan first so that a sink error still leaves the
                // semantic observations coherent
                if let Err(err) = sink.accept_range(src, range) {
                    seq.set_pos(save);
                    ctx.fail_pos(seq.pos());
                    return Err(err);
                }
                seq.set_pos(save);
                let next = if in_header {
                    ReadState::HeaderEolOneByte
                } else {
                    ReadState::TrailerEolOneByte
                };
                ctx.change_state(next, seq.pos());
            }
            ReadState::HeaderEolOneByte | ReadState::HeaderEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::HeaderEolOneByte,
                    ReadState::HeaderEolTwoByte,
                    ReadState::HeaderInit,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
            }
            ReadState::TrailerEolOneByte | ReadState::TrailerEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::TrailerEolOneByte,
                    ReadState::TrailerEolTwoByte,
                    ReadState::TrailerInit,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
            }
            ReadState::HeaderLastEolOneByte | ReadState::HeaderLastEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::HeaderLastEolOneByte,
                    ReadState::HeaderLastEolTwoByte,
                    ReadState::BodyInit,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
                if ctx.require_host()
                    && !ctx.has_host()
                    && !ctx.is_flag(ReadFlags::ALLOW_NO_HOST)
                {
                    return Err(HeaderError::NoHost);
                }
                return Ok(());
            }
            ReadState::TrailerLastEolOneByte | ReadState::TrailerLastEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::TrailerLastEolOneByte,
                    ReadState::TrailerLastEolTwoByte,
                    ReadState::BodyEnd,
                ) {
                    return Err(HeaderError::NotEndOfLine);
                }
                return Ok(());
            }
            // anything else: the block is already behind us
            _ => return Ok(()),
        }
    }
}

/// Returns true if `key` is a valid field name.
pub fn is_valid_key(key: &[u8], allow_empty: bool) -> bool {
    if key.is_empty() {
        return allow_empty;
    }
    key.iter().all(|&c| is_token_char(c))
}

/// Returns true if `value` is a valid field value.
pub fn is_valid_value(value: &[u8], allow_empty: bool) -> bool {
    if value.is_empty() {
        return allow_empty;
    }
    value.iter().all(|&c| is_field_vchar(c) || is_tab_or_space(c))
}

/// The validator `render_header_common` callers use unless they have
/// looser requirements: token key, visible-ASCII value, neither empty.
pub fn default_validate(key: &[u8], value: &[u8]) -> bool {
    is_valid_key(key, false) && is_valid_value(value, false)
}

/// Renders a header or trailer block and selects the next write state.
///
/// Fields failing `validate` abort the render with `ValidationError`
/// unless `ignore_invalid` is set, in which case they are skipped. The
/// post-header state is chosen from the semantic observations collected
/// while emitting; see the table on [`WriteState`].
pub fn render_header_common<I, K, V, F>(
    ctx: &mut WriteContext,
    out: &mut Bstr,
    headers: I,
    validate: F,
    ignore_invalid: bool,
) -> Result<(), HeaderError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
    F: Fn(&[u8], &[u8]) -> bool,
{
    if ctx.state() != WriteState::Header && ctx.state() != WriteState::Trailer {
        return Err(HeaderError::InvalidState);
    }
    for (key, value) in headers {
        let (key, value) = (key.as_ref(), value.as_ref());
        if !validate(key, value) {
            if ignore_invalid {
                continue;
            }
            return Err(HeaderError::ValidationError);
        }
        ctx.scan_header(key, value);
        out.add(key);
        out.add(": ");
        out.add(value);
        out.add("\r\n");
    }
    out.add("\r\n");
    if ctx.require_host() && !ctx.has_host() && !ctx.is_flag(WriteFlags::ALLOW_NO_HOST) {
        return Err(HeaderError::NoHost);
    }
    if ctx.is_invalid_content_length()
        && !ctx.is_flag(WriteFlags::ALLOW_INVALID_CONTENT_LENGTH)
    {
        return Err(HeaderError::InvalidContentLength);
    }
    if ctx.state() == WriteState::Trailer {
        ctx.set_state(WriteState::End);
    } else if ctx.no_body() {
        let allow =
            ctx.is_flag(WriteFlags::ALLOW_UNEXPECTED_CONTENT_LENGTH_OR_CHUNKED_WITH_NO_BODY);
        if ctx.has_chunked() && !allow {
            return Err(HeaderError::InvalidContentLength);
        }
        if ctx.has_content_length() && ctx.remain_content_length() != 0 && !allow {
            return Err(HeaderError::InvalidContentLength);
        }
        ctx.set_state(WriteState::End);
    } else if ctx.has_chunked() {
        if ctx.has_content_length() {
            if !ctx.is_flag(WriteFlags::ALLOW_BOTH_CHUNKED_AND_CONTENT_LENGTH) {
                return Err(HeaderError::InvalidContentLength);
            }
            ctx.set_state(WriteState::ContentLengthChunkedBody);
        } else {
            ctx.set_state(WriteState::ChunkedBody);
        }
    } else if ctx.has_content_length() {
        if ctx.remain_content_length() == 0 {
            ctx.set_state(WriteState::End);
        } else {
            ctx.set_state(WriteState::ContentLengthBody);
        }
    } else {
        if !ctx.is_flag(WriteFlags::ALLOW_NO_LENGTH_INFO_BODY) {
            return Err(HeaderError::InvalidContentLength);
        }
        if ctx.is_keep_alive() && !ctx.is_flag(WriteFlags::ALLOW_NO_LENGTH_EVEN_IF_KEEP_ALIVE) {
            return Err(HeaderError::InvalidContentLength);
        }
        ctx.set_state(WriteState::BestEffortBody);
    }
    Ok(())
}

/// Rewrites a field name into canonical casing: first letter and every
/// letter after a `-` upper, the rest lower. `content-TYPE` becomes
/// `Content-Type`.
pub fn canonical_key(input: &[u8], output: &mut Bstr) {
    let mut first = true;
    for &c in input {
        if first {
            output.push(c.to_ascii_uppercase());
            first = false;
        } else {
            output.push(c.to_ascii_lowercase());
            if c == b'-' {
                first = true;
            }
        }
    }
}

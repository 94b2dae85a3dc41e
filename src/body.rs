//! Body codec: counted, chunked, unframed, and the cross-checked hybrid.

use crate::bstr::Bstr;
use crate::config::ReadFlags;
use crate::context::{read_eol, ReadContext, WriteContext};
use crate::error::BodyResult;
use crate::scanner::Scanner;
use crate::sink::{Range, ValueSink};
use crate::state::{BodyType, ReadState, WriteState};
use crate::util::{is_line, is_tab_or_space};

fn hex_value(c: u8) -> u64 {
    match c {
        b'0'..=b'9' => u64::from(c - b'0'),
        b'a'..=b'f' => u64::from(c - b'a' + 10),
        _ => u64::from(c - b'A' + 10),
    }
}

/// Reads the message body according to the framing observed during
/// header parsing.
///
/// Body bytes are delivered incrementally into `body`; chunk extensions
/// go to `extension`. Returns [`BodyResult::Incomplete`] with a resumable
/// context whenever the input runs out, [`BodyResult::Full`] once the
/// framing says the body is over, and [`BodyResult::BestEffort`] when no
/// framing was advertised and everything available was delivered.
pub fn read_body<B, E>(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    body: &mut B,
    extension: &mut E,
) -> BodyResult
where
    B: ValueSink,
    E: ValueSink,
{
    ctx.prepare_read(seq, ReadState::BodyInit);
    let consistent = ctx.is_flag(ReadFlags::CONSISTENT_CHUNKED_CONTENT_LENGTH);
    loop {
        match ctx.state() {
            ReadState::BodyInit => {
                match ctx.body_type() {
                    BodyType::NoInfo => {
                        // no framing: hand over whatever is there
                        let start = seq.pos();
                        let end = seq.size();
                        body.accept_range(seq.as_bytes(), Range::new(start, end));
                        seq.set_pos(end);
                        return BodyResult::BestEffort;
                    }
                    BodyType::ContentLength => {
                        ctx.change_state(ReadState::BodyContentLengthInit, seq.pos());
                    }
                    BodyType::Chunked => {
                        ctx.change_state(ReadState::BodyChunkedInit, seq.pos());
                    }
                    BodyType::ChunkedContentLength => {
                        let as_chunked =
                            ctx.is_flag(ReadFlags::CHUNKED_CONTENT_LENGTH_AS_CHUNKED);
                        if as_chunked && consistent {
                            return BodyResult::InvalidState;
                        }
                        if !as_chunked && !consistent {
                            return BodyResult::InvalidHeader;
                        }
                        ctx.change_state(ReadState::BodyChunkedInit, seq.pos());
                    }
                }
            }
            ReadState::BodyContentLengthInit => {
                if ctx.content_length() == 0 {
                    ctx.change_state(ReadState::BodyEnd, seq.pos());
                    return BodyResult::Full;
                }
                ctx.save_remain_content_length(ctx.content_length());
                ctx.change_state(ReadState::BodyContentLength, seq.pos());
            }
            ReadState::BodyContentLength => {
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return BodyResult::Incomplete;
                }
                let remain_content = ctx.remain_content_length();
                let remain_input = seq.remain() as u64;
                let base = seq.pos();
                if remain_input < remain_content {
                    body.accept_range(
                        seq.as_bytes(),
                        Range::new(base, base + remain_input as usize),
                    );
                    seq.set_pos(base + remain_input as usize);
                    ctx.save_remain_content_length(remain_content - remain_input);
                    ctx.save_pos(seq.pos());
                    return BodyResult::Incomplete;
                }
                body.accept_range(
                    seq.as_bytes(),
                    Range::new(base, base + remain_content as usize),
                );
                seq.set_pos(base + remain_content as usize);
                ctx.save_remain_content_length(0);
                ctx.change_state(ReadState::BodyEnd, seq.pos());
                return BodyResult::Full;
            }
            ReadState::BodyChunkedInit => {
                ctx.save_remain_chunk_size(0);
                if ctx.body_type() == BodyType::ChunkedContentLength && consistent {
                    ctx.save_remain_content_length(ctx.content_length());
                }
                ctx.change_state(ReadState::BodyChunkedSize, seq.pos());
            }
            ReadState::BodyChunkedSize => {
                let mut size = ctx.remain_chunk_size();
                loop {
                    let current = match seq.current() {
                        Some(c) => c,
                        None => {
                            ctx.save_remain_chunk_size(size);
                            ctx.save_pos(seq.pos());
                            return BodyResult::Incomplete;
                        }
                    };
                    if !current.is_ascii_hexdigit() {
                        break;
                    }
                    size = match size
                        .checked_mul(16)
                        .and_then(|s| s.checked_add(hex_value(current)))
                    {
                        Some(s) => s,
                        None => {
                            ctx.fail_pos(seq.pos());
                            return BodyResult::BadLine;
                        }
                    };
                    seq.consume();
                }
                ctx.save_remain_chunk_size(size);
                if ctx.body_type() == BodyType::ChunkedContentLength
                    && consistent
                    && size > ctx.remain_content_length()
                {
                    // a single chunk already exceeds the advertised length
                    return BodyResult::LengthMismatch;
                }
                ctx.change_state(ReadState::BodyChunkedExtensionInit, seq.pos());
            }
            ReadState::BodyChunkedExtensionInit => {
                loop {
                    match seq.current() {
                        Some(c) if is_tab_or_space(c) => seq.consume(),
                        Some(_) => break,
                        None => {
                            ctx.save_pos(seq.pos());
                            return BodyResult::Incomplete;
                        }
                    }
                }
                if !seq.consume_if(b';') {
                    if seq.pos() != ctx.start_pos() {
                        // BWS is only valid in front of an extension
                        return BodyResult::BadSpace;
                    }
                    ctx.change_state(ReadState::BodyChunkedSizeEolOneByte, seq.pos());
                    continue;
                }
                ctx.change_state(ReadState::BodyChunkedExtension, seq.pos());
            }
            ReadState::BodyChunkedExtension => {
                loop {
                    match seq.current() {
                        Some(c) if is_line(c) => break,
                        Some(_) => seq.consume(),
                        None => {
                            ctx.save_pos(seq.pos());
                            return BodyResult::Incomplete;
                        }
                    }
                }
                extension.accept_range(
                    seq.as_bytes(),
                    Range::new(ctx.start_pos(), seq.pos()),
                );
                ctx.change_state(ReadState::BodyChunkedSizeEolOneByte, seq.pos());
            }
            ReadState::BodyChunkedSizeEolOneByte | ReadState::BodyChunkedSizeEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::BodyChunkedSizeEolOneByte,
                    ReadState::BodyChunkedSizeEolTwoByte,
                    ReadState::BodyChunkedDataInit,
                ) {
                    return if ctx.is_resumable() {
                        BodyResult::Incomplete
                    } else {
                        BodyResult::BadLine
                    };
                }
            }
            ReadState::BodyChunkedDataInit => {
                if ctx.remain_chunk_size() == 0 {
                    // terminal chunk
                    if ctx.body_type() == BodyType::ChunkedContentLength
                        && consistent
                        && ctx.remain_content_length() != 0
                    {
                        return BodyResult::LengthMismatch;
                    }
                    if ctx.is_flag(ReadFlags::NOT_STRICT_TRAILER) || ctx.has_trailer() {
                        ctx.change_state(ReadState::TrailerInit, seq.pos());
                        return BodyResult::Full;
                    }
                    ctx.change_state(ReadState::TrailerLastEolOneByte, seq.pos());
                    continue;
                }
                ctx.change_state(ReadState::BodyChunkedData, seq.pos());
            }
            ReadState::BodyChunkedData => {
                if seq.eos() {
                    ctx.save_pos(seq.pos());
                    return BodyResult::Incomplete;
                }
                let remain_chunk = ctx.remain_chunk_size();
                let remain_input = seq.remain() as u64;
                let base = seq.pos();
                if remain_input < remain_chunk {
                    body.accept_range(
                        seq.as_bytes(),
                        Range::new(base, base + remain_input as usize),
                    );
                    seq.set_pos(base + remain_input as usize);
                    ctx.save_remain_chunk_size(remain_chunk - remain_input);
                    if ctx.body_type() == BodyType::ChunkedContentLength && consistent {
                        let remain = ctx.remain_content_length() - remain_input;
                        ctx.save_remain_content_length(remain);
                    }
                    ctx.save_pos(seq.pos());
                    return BodyResult::Incomplete;
                }
                body.accept_range(
                    seq.as_bytes(),
                    Range::new(base, base + remain_chunk as usize),
                );
                seq.set_pos(base + remain_chunk as usize);
                ctx.save_remain_chunk_size(0);
                if ctx.body_type() == BodyType::ChunkedContentLength && consistent {
                    let remain = ctx.remain_content_length() - remain_chunk;
                    ctx.save_remain_content_length(remain);
                }
                ctx.change_state(ReadState::BodyChunkedDataEolOneByte, seq.pos());
                if ctx.is_flag(ReadFlags::SUSPEND_ON_CHUNKED) {
                    ctx.save_pos(seq.pos());
                    return BodyResult::Incomplete;
                }
            }
            ReadState::BodyChunkedDataEolOneByte | ReadState::BodyChunkedDataEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::BodyChunkedDataEolOneByte,
                    ReadState::BodyChunkedDataEolTwoByte,
                    ReadState::BodyChunkedSize,
                ) {
                    return if ctx.is_resumable() {
                        BodyResult::Incomplete
                    } else {
                        BodyResult::BadLine
                    };
                }
            }
            // terminal CRLF of a chunked body with no trailer
            ReadState::TrailerLastEolOneByte | ReadState::TrailerLastEolTwoByte => {
                if !read_eol(
                    ctx,
                    seq,
                    ReadState::TrailerLastEolOneByte,
                    ReadState::TrailerLastEolTwoByte,
                    ReadState::BodyEnd,
                ) {
                    return if ctx.is_resumable() {
                        BodyResult::Incomplete
                    } else {
                        BodyResult::BadLine
                    };
                }
                return BodyResult::Full;
            }
            ReadState::BodyEnd => return BodyResult::Full,
            _ => return BodyResult::InvalidState,
        }
    }
}

/// Writes `data` against an advertised `Content-Length`.
pub fn render_length_body(ctx: &mut WriteContext, buf: &mut Bstr, data: &[u8]) -> BodyResult {
    if ctx.state() != WriteState::ContentLengthBody {
        return BodyResult::InvalidState;
    }
    let size = data.len() as u64;
    if ctx.remain_content_length() < size {
        ctx.set_state(WriteState::Failed);
        return BodyResult::LengthMismatch;
    }
    buf.add(data);
    ctx.save_remain_content_length(ctx.remain_content_length() - size);
    if ctx.remain_content_length() == 0 {
        ctx.set_state(WriteState::End);
        return BodyResult::Full;
    }
    BodyResult::Incomplete
}

/// Writes one chunk: `<hex-size>[;extension]\r\n<data>\r\n`.
///
/// A zero-size call writes the terminal chunk; the message then either
/// ends with an immediate blank line or moves to the trailer state when a
/// `Trailer` header was advertised.
pub fn render_chunked_body(
    ctx: &mut WriteContext,
    buf: &mut Bstr,
    data: &[u8],
    extension: &[u8],
) -> BodyResult {
    if ctx.state() != WriteState::ChunkedBody
        && ctx.state() != WriteState::ContentLengthChunkedBody
    {
        return BodyResult::InvalidState;
    }
    let size = data.len() as u64;
    if ctx.state() == WriteState::ContentLengthChunkedBody {
        if ctx.remain_content_length() < size {
            ctx.set_state(WriteState::Failed);
            return BodyResult::LengthMismatch;
        }
        ctx.save_remain_content_length(ctx.remain_content_length() - size);
    }
    buf.add(format!("{:x}", size).as_bytes());
    if !extension.is_empty() {
        buf.push(b';');
        buf.add(extension);
    }
    buf.add("\r\n");
    if size == 0 {
        if ctx.state() == WriteState::ContentLengthChunkedBody
            && ctx.remain_content_length() != 0
        {
            ctx.set_state(WriteState::Failed);
            return BodyResult::LengthMismatch;
        }
        if !ctx.has_trailer() {
            buf.add("\r\n");
            ctx.set_state(WriteState::End);
        } else {
            ctx.set_state(WriteState::Trailer);
        }
        BodyResult::Full
    } else {
        buf.add(data);
        buf.add("\r\n");
        BodyResult::Incomplete
    }
}

/// Writes body data in whatever mode the header render selected.
pub fn render_body(ctx: &mut WriteContext, buf: &mut Bstr, data: &[u8]) -> BodyResult {
    match ctx.state() {
        WriteState::BestEffortBody => {
            buf.add(data);
            BodyResult::BestEffort
        }
        WriteState::ContentLengthBody => render_length_body(ctx, buf, data),
        WriteState::ChunkedBody | WriteState::ContentLengthChunkedBody => {
            render_chunked_body(ctx, buf, data, b"")
        }
        _ => BodyResult::InvalidState,
    }
}

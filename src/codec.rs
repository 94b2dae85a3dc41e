//! Connection facade: buffers plus contexts, one per connection.

use crate::body::{read_body, render_body, render_chunked_body};
use crate::bstr::Bstr;
use crate::context::{ReadContext, WriteContext};
use crate::error::{BodyResult, HeaderError, HttpReadError, HttpWriteError};
use crate::headers::{default_validate, parse_common, render_header_common};
use crate::request::{parse_request, parse_request_line, render_request_line};
use crate::response::{parse_response, parse_status_line, reason_phrase, render_status_line};
use crate::scanner::Scanner;
use crate::sink::{Discard, FieldSink, ValueSink};
use crate::state::{HttpState, ReadState, WriteState};
use log::{debug, trace};

/// Message codec for one connection.
///
/// Owns the inbound and outbound byte buffers and the read and write
/// contexts. The caller pumps raw bytes in with [`Codec::add_input`] and
/// out from [`Codec::output`]; everything in between is pure state
/// machine. A resumable failure from a read operation means "feed more
/// input and call the same operation again".
#[derive(Default)]
pub struct Codec {
    input: Bstr,
    output: Bstr,
    read_ctx: ReadContext,
    write_ctx: WriteContext,
}

impl Codec {
    pub fn new() -> Self {
        Self {
            input: Bstr::new(),
            output: Bstr::new(),
            read_ctx: ReadContext::new(),
            write_ctx: WriteContext::new(),
        }
    }

    /// Makes a codec with read and write flags configured up front.
    pub fn with_flags(read_flags: u64, write_flags: u64) -> Self {
        Self {
            input: Bstr::new(),
            output: Bstr::new(),
            read_ctx: ReadContext::with_flags(read_flags),
            write_ctx: WriteContext::with_flags(write_flags),
        }
    }

    pub fn read_ctx(&self) -> &ReadContext {
        &self.read_ctx
    }

    pub fn read_ctx_mut(&mut self) -> &mut ReadContext {
        &mut self.read_ctx
    }

    pub fn write_ctx(&self) -> &WriteContext {
        &self.write_ctx
    }

    pub fn write_ctx_mut(&mut self) -> &mut WriteContext {
        &mut self.write_ctx
    }

    /// Appends received bytes to the input buffer.
    pub fn add_input(&mut self, data: &[u8]) {
        self.input.add(data);
    }

    pub fn input(&self) -> &[u8] {
        self.input.as_slice()
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn output(&self) -> &[u8] {
        self.output.as_slice()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Hands the rendered bytes to the caller, leaving the buffer empty.
    pub fn take_output(&mut self) -> Bstr {
        std::mem::replace(&mut self.output, Bstr::new())
    }

    pub fn read_state(&self) -> ReadState {
        self.read_ctx.state()
    }

    pub fn write_state(&self) -> WriteState {
        self.write_ctx.state()
    }

    /// Coarse progress of the message being read.
    pub fn http_state(&self) -> HttpState {
        self.read_ctx.http_state()
    }

    /// Whether the connection persists after the message being read.
    pub fn is_keep_alive(&self) -> bool {
        self.read_ctx.is_keep_alive()
    }

    /// Resets the read side for the next message. Input bytes stay.
    pub fn reset_read(&mut self) {
        self.read_ctx.reset();
    }

    /// Resets the write side for the next message. Output bytes stay.
    pub fn reset_write(&mut self) {
        self.write_ctx.reset();
    }

    pub fn reset(&mut self) {
        self.reset_read();
        self.reset_write();
    }

    fn read_error(
        &self,
        header_error: Option<HeaderError>,
        body_error: Option<BodyResult>,
    ) -> HttpReadError {
        let err = HttpReadError {
            state: self.read_ctx.state(),
            pos: self.read_ctx.suspend_pos(),
            header_error,
            body_error,
            is_resumable: self.read_ctx.is_resumable(),
        };
        if err.is_resumable {
            trace!("read suspended: {}", err);
        } else {
            debug!("read failed: {}", err);
        }
        err
    }

    /// Parses a request head from the input buffer.
    ///
    /// On suspension the unconsumed suffix stays buffered; add more input
    /// and call again.
    pub fn read_request<M, P, V, H>(
        &mut self,
        method: &mut M,
        path: &mut P,
        version: &mut V,
        header: &mut H,
    ) -> Result<(), HttpReadError>
    where
        M: ValueSink,
        P: ValueSink,
        V: ValueSink,
        H: FieldSink,
    {
        let mut seq = Scanner::new(self.input.as_slice());
        parse_request(&mut self.read_ctx, &mut seq, method, path, version, header)
            .map_err(|err| self.read_error(Some(err), None))
    }

    /// Parses a response head from the input buffer.
    pub fn read_response<V, S, P, H>(
        &mut self,
        version: &mut V,
        status: &mut S,
        phrase: &mut P,
        header: &mut H,
    ) -> Result<(), HttpReadError>
    where
        V: ValueSink,
        S: ValueSink,
        P: ValueSink,
        H: FieldSink,
    {
        let mut seq = Scanner::new(self.input.as_slice());
        parse_response(&mut self.read_ctx, &mut seq, version, status, phrase, header)
            .map_err(|err| self.read_error(Some(err), None))
    }

    /// Parses only the request line.
    pub fn read_request_line<M, P, V>(
        &mut self,
        method: &mut M,
        path: &mut P,
        version: &mut V,
    ) -> Result<(), HttpReadError>
    where
        M: ValueSink,
        P: ValueSink,
        V: ValueSink,
    {
        let mut seq = Scanner::new(self.input.as_slice());
        parse_request_line(&mut self.read_ctx, &mut seq, method, path, version)
            .map_err(|err| self.read_error(Some(err), None))
    }

    /// Parses only the status line.
    pub fn read_status_line<V, S, P>(
        &mut self,
        version: &mut V,
        status: &mut S,
        phrase: &mut P,
    ) -> Result<(), HttpReadError>
    where
        V: ValueSink,
        S: ValueSink,
        P: ValueSink,
    {
        let mut seq = Scanner::new(self.input.as_slice());
        parse_status_line(&mut self.read_ctx, &mut seq, version, status, phrase)
            .map_err(|err| self.read_error(Some(err), None))
    }

    /// Parses a header block.
    pub fn read_header<H: FieldSink>(&mut self, header: &mut H) -> Result<(), HttpReadError> {
        let mut seq = Scanner::new(self.input.as_slice());
        parse_common(&mut self.read_ctx, &mut seq, header)
            .map_err(|err| self.read_error(Some(err), None))
    }

    /// Parses the trailer block after a chunked body.
    pub fn read_trailer<H: FieldSink>(&mut self, header: &mut H) -> Result<(), HttpReadError> {
        self.read_header(header)
    }

    /// Reads body bytes into `body` according to the observed framing.
    ///
    /// `Ok(Full)` means the framed body is complete; `Ok(BestEffort)`
    /// that everything available was delivered with no framing. A
    /// message that must not carry a body completes immediately.
    pub fn read_body<B: ValueSink>(&mut self, body: &mut B) -> Result<BodyResult, HttpReadError> {
        self.read_body_with_extension(body, &mut Discard)
    }

    /// [`Codec::read_body`], capturing chunk extensions too.
    pub fn read_body_with_extension<B, E>(
        &mut self,
        body: &mut B,
        extension: &mut E,
    ) -> Result<BodyResult, HttpReadError>
    where
        B: ValueSink,
        E: ValueSink,
    {
        if self.read_ctx.follows_no_body_semantics() {
            return Ok(BodyResult::Full);
        }
        let mut seq = Scanner::new(self.input.as_slice());
        let result = read_body(&mut self.read_ctx, &mut seq, body, extension);
        match result {
            BodyResult::Full | BodyResult::BestEffort => Ok(result),
            other => Err(self.read_error(None, Some(other))),
        }
    }

    /// Discards the input prefix the read context no longer needs.
    ///
    /// This is the only place the input buffer moves; saved ranges are
    /// reconciled so parsing resumes correctly afterwards. Returns the
    /// number of bytes removed.
    pub fn adjust_input(&mut self) -> usize {
        let delta = self.read_ctx.adjust_offset_to_start();
        self.input.shift_front(delta);
        delta
    }

    /// Renders an HTTP/1.1 request head into the output buffer.
    pub fn write_request<I, K, V>(
        &mut self,
        method: &[u8],
        path: &[u8],
        headers: I,
    ) -> Result<(), HttpWriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.write_request_with_version(method, path, headers, Some("HTTP/1.1"))
    }

    /// [`Codec::write_request`] with an explicit version token. `None`
    /// renders a versionless HTTP/0.9 line.
    pub fn write_request_with_version<I, K, V>(
        &mut self,
        method: &[u8],
        path: &[u8],
        headers: I,
        version_str: Option<&str>,
    ) -> Result<(), HttpWriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        render_request_line(&mut self.write_ctx, &mut self.output, method, path, version_str)
            .and_then(|_| {
                render_header_common(
                    &mut self.write_ctx,
                    &mut self.output,
                    headers,
                    default_validate,
                    false,
                )
            })
            .map_err(|err| {
                debug!("request render failed: {}", err);
                HttpWriteError::from(err)
            })
    }

    /// Renders an HTTP/1.1 response head into the output buffer.
    ///
    /// A `reason` of `None` uses the canonical phrase for the status.
    pub fn write_response<I, K, V>(
        &mut self,
        status: u16,
        reason: Option<&str>,
        headers: I,
    ) -> Result<(), HttpWriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.write_response_with_version(status, reason, headers, "HTTP/1.1")
    }

    /// [`Codec::write_response`] with an explicit version token.
    pub fn write_response_with_version<I, K, V>(
        &mut self,
        status: u16,
        reason: Option<&str>,
        headers: I,
        version_str: &str,
    ) -> Result<(), HttpWriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let phrase = reason.unwrap_or_else(|| reason_phrase(status));
        render_status_line(
            &mut self.write_ctx,
            &mut self.output,
            status,
            phrase.as_bytes(),
            version_str,
        )
        .and_then(|_| {
            render_header_common(
                &mut self.write_ctx,
                &mut self.output,
                headers,
                default_validate,
                false,
            )
        })
        .map_err(|err| {
            debug!("response render failed: {}", err);
            HttpWriteError::from(err)
        })
    }

    /// Renders the trailer block after a chunked body.
    pub fn write_trailer<I, K, V>(&mut self, headers: I) -> Result<(), HttpWriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        render_header_common(
            &mut self.write_ctx,
            &mut self.output,
            headers,
            default_validate,
            false,
        )
        .map_err(HttpWriteError::from)
    }

    /// Writes body bytes in the mode the header render selected.
    pub fn write_body(&mut self, data: &[u8]) -> BodyResult {
        render_body(&mut self.write_ctx, &mut self.output, data)
    }

    /// Writes one chunk with an extension.
    pub fn write_chunk(&mut self, data: &[u8], extension: &[u8]) -> BodyResult {
        render_chunked_body(&mut self.write_ctx, &mut self.output, data, extension)
    }

    /// Writes the terminal chunk.
    pub fn write_end_of_chunk(&mut self) -> BodyResult {
        self.write_chunk(b"", b"")
    }
}

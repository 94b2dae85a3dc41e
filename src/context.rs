//! Read and write contexts: everything a suspended parse or render needs
//! to continue later.

use crate::config::{ReadFlags, WriteFlags};
use crate::parsers::{
    connection_options, is_no_body_method, is_no_body_status, parse_content_length,
    token_list_contains,
};
use crate::scanner::Scanner;
use crate::sink::Range;
use crate::state::{is_keep_alive, BodyType, HttpState, ReadState, WriteState};
use crate::util::{trimmed, FlagOperations};

/// State-dependent scratch storage.
///
/// While a field value is being parsed the context must remember where
/// the key sits; while a body is being read it must remember how much is
/// left. The two needs never overlap, and the variant is selected by the
/// state class, so the discrimination is carried in the type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Scratch {
    None,
    /// Key range of the field line currently being parsed.
    HeaderKey(Range),
    /// Byte counters for the body currently being read.
    Body {
        remain_content: u64,
        remain_chunk: u64,
    },
}

/// Incremental parse state for one message.
///
/// A context starts at [`ReadState::Uninit`], is driven by the header and
/// body codecs, and is `reset` between messages. Flags survive the reset;
/// positions and per-message observations do not.
#[derive(Clone, Debug)]
pub struct ReadContext {
    start_pos: usize,
    suspend_pos: usize,
    scratch: Scratch,
    content_length: u64,
    flags: u64,
    state: ReadState,
    body_type: BodyType,
    resumable: bool,
    has_keep_alive: bool,
    has_close: bool,
    has_host: bool,
    has_trailer: bool,
    require_no_body: bool,
    scan_request: bool,
    http_major: u8,
    http_minor: u8,
}

impl Default for ReadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadContext {
    pub fn new() -> Self {
        Self {
            start_pos: 0,
            suspend_pos: 0,
            scratch: Scratch::None,
            content_length: 0,
            flags: 0,
            state: ReadState::Uninit,
            body_type: BodyType::NoInfo,
            resumable: false,
            has_keep_alive: false,
            has_close: false,
            has_host: false,
            has_trailer: false,
            require_no_body: false,
            scan_request: false,
            http_major: 0,
            http_minor: 0,
        }
    }

    pub fn with_flags(flags: u64) -> Self {
        let mut ctx = Self::new();
        ctx.flags = flags;
        ctx
    }

    /// Resets everything except the configured flags.
    pub fn reset(&mut self) {
        let flags = self.flags;
        *self = Self::new();
        self.flags = flags;
    }

    pub fn is_flag(&self, flag: u64) -> bool {
        self.flags.is_set(flag)
    }

    pub fn set_flags(&mut self, flags: u64) {
        self.flags = flags;
    }

    pub fn add_flag(&mut self, flag: u64) {
        self.flags.set(flag);
    }

    pub fn remove_flag(&mut self, flag: u64) {
        self.flags.unset(flag);
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    pub fn suspend_pos(&self) -> usize {
        self.suspend_pos
    }

    /// True if the last failure was a suspension: the same call can be
    /// repeated with more input and will continue where it stopped.
    pub fn is_resumable(&self) -> bool {
        self.resumable
    }

    /// True while a request is being parsed, false for a response.
    pub fn scanning_request(&self) -> bool {
        self.scan_request
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Installs body framing directly, bypassing header scanning. Used by
    /// callers that learned the framing elsewhere.
    pub fn set_body_info(&mut self, body_type: BodyType, content_length: u64) {
        self.body_type = body_type;
        self.content_length = content_length;
    }

    pub fn http_major_version(&self) -> u8 {
        self.http_major
    }

    pub fn http_minor_version(&self) -> u8 {
        self.http_minor
    }

    pub fn has_host(&self) -> bool {
        self.has_host
    }

    pub fn has_trailer(&self) -> bool {
        self.has_trailer
    }

    pub fn has_close(&self) -> bool {
        self.has_close
    }

    pub fn has_keep_alive(&self) -> bool {
        self.has_keep_alive
    }

    pub fn require_no_body(&self) -> bool {
        self.require_no_body
    }

    /// HTTP/1.1 requests must carry `Host`.
    pub fn require_host(&self) -> bool {
        self.http_major == 1 && self.http_minor == 1 && self.scan_request
    }

    /// Whether the connection persists after this message.
    ///
    /// See <https://www.rfc-editor.org/rfc/rfc9112#name-persistence>
    pub fn is_keep_alive(&self) -> bool {
        is_keep_alive(
            self.state == ReadState::BodyEnd,
            self.has_close,
            self.has_keep_alive,
            self.http_major,
            self.http_minor,
        )
    }

    /// Coarse progress for multi-version callers.
    pub fn http_state(&self) -> HttpState {
        if self.state.is_start() {
            HttpState::Init
        } else if self.state.is_first_line() {
            HttpState::FirstLine
        } else if self.state.is_header_line() {
            HttpState::Header
        } else if self.state.is_body_in_progress() {
            HttpState::Body
        } else if self.state.is_trailer_line() {
            HttpState::Trailer
        } else {
            HttpState::End
        }
    }

    /// Positions the scanner for a (possibly resumed) read, entering
    /// `initial_state` on the first call.
    pub fn prepare_read(&mut self, seq: &mut Scanner, initial_state: ReadState) {
        if self.state == ReadState::Uninit {
            self.state = initial_state;
            self.start_pos = seq.pos();
            self.suspend_pos = seq.pos();
        }
        self.resumable = false;
        seq.set_pos(self.suspend_pos);
    }

    /// Enters `new_state` with both positions at `pos`.
    pub fn change_state(&mut self, new_state: ReadState, pos: usize) {
        self.state = new_state;
        self.start_pos = pos;
        self.suspend_pos = pos;
    }

    /// Records a suspension: more input may continue the parse.
    pub fn save_pos(&mut self, pos: usize) {
        self.suspend_pos = pos;
        self.resumable = true;
    }

    /// Records a fatal stop.
    pub fn fail_pos(&mut self, pos: usize) {
        self.suspend_pos = pos;
        self.resumable = false;
    }

    pub(crate) fn save_header_key(&mut self, start: usize, end: usize) {
        self.scratch = Scratch::HeaderKey(Range::new(start, end));
    }

    pub(crate) fn header_key(&self) -> Range {
        match self.scratch {
            Scratch::HeaderKey(range) => range,
            _ => Range::default(),
        }
    }

    pub(crate) fn save_remain_content_length(&mut self, remain: u64) {
        match &mut self.scratch {
            Scratch::Body { remain_content, .. } => *remain_content = remain,
            _ => {
                self.scratch = Scratch::Body {
                    remain_content: remain,
                    remain_chunk: 0,
                }
            }
        }
    }

    pub(crate) fn remain_content_length(&self) -> u64 {
        match self.scratch {
            Scratch::Body { remain_content, .. } => remain_content,
            _ => 0,
        }
    }

    pub(crate) fn save_remain_chunk_size(&mut self, remain: u64) {
        match &mut self.scratch {
            Scratch::Body { remain_chunk, .. } => *remain_chunk = remain,
            _ => {
                self.scratch = Scratch::Body {
                    remain_content: 0,
                    remain_chunk: remain,
                }
            }
        }
    }

    pub(crate) fn remain_chunk_size(&self) -> u64 {
        match self.scratch {
            Scratch::Body { remain_chunk, .. } => remain_chunk,
            _ => 0,
        }
    }

    /// Settles the no-body case: a message whose body phase begins with
    /// no framing advertised has ended. Returns true if the message is
    /// (now) at its end.
    pub fn on_no_body_semantics(&mut self) -> bool {
        if self.state == ReadState::BodyInit && self.body_type == BodyType::NoInfo {
            self.state = ReadState::BodyEnd;
            return true;
        }
        self.state == ReadState::BodyEnd
    }

    /// True if the message must not carry a body and indeed has none.
    pub fn follows_no_body_semantics(&mut self) -> bool {
        self.require_no_body && self.on_no_body_semantics()
    }

    /// The smallest input index the caller may discard without
    /// invalidating state the context still needs. Does not modify state.
    pub fn adjusted_offset(&self) -> usize {
        if self.state.is_header_key_reserved() {
            if let Scratch::HeaderKey(range) = self.scratch {
                return range.start;
            }
        }
        self.start_pos
    }

    /// Trims all stored positions by [`ReadContext::adjusted_offset`] and
    /// returns the delta. The caller must remove exactly that many bytes
    /// from the front of the input buffer.
    pub fn adjust_offset_to_start(&mut self) -> usize {
        if self.state.is_header_key_reserved() {
            if let Scratch::HeaderKey(range) = self.scratch {
                let delta = range.start;
                self.scratch = Scratch::HeaderKey(Range::new(0, range.end - delta));
                self.start_pos -= delta;
                self.suspend_pos -= delta;
                return delta;
            }
        }
        let delta = self.start_pos;
        self.start_pos = 0;
        self.suspend_pos -= delta;
        delta
    }

    /// Derives the body policy from the request method.
    pub fn scan_method(&mut self, method: &[u8]) {
        if is_no_body_method(method)
            || (!self.is_flag(ReadFlags::DELETE_METHOD_HAS_BODY) && method == b"DELETE")
        {
            self.require_no_body = true;
        }
        self.scan_request = true;
    }

    /// Derives the body policy from the response status.
    pub fn scan_status_code(&mut self, code: u16) {
        if is_no_body_status(code) {
            self.require_no_body = true;
        }
        self.scan_request = false;
    }

    pub fn scan_http_version(&mut self, major: u8, minor: u8) {
        self.http_major = major;
        self.http_minor = minor;
    }

    /// Recognizes the semantic headers while the field block is parsed
    /// syntactically. Called once per field, before the sink sees it.
    pub fn scan_header(&mut self, key: &[u8], value: &[u8]) {
        if key.eq_ignore_ascii_case(b"host") {
            self.has_host = true;
            return;
        }
        if !self.is_flag(ReadFlags::NOT_SCAN_TRAILER_HEADER)
            && key.eq_ignore_ascii_case(b"trailer")
        {
            self.has_trailer = true;
            return;
        }
        if !self.is_flag(ReadFlags::NOT_SCAN_CONNECTION_HEADER)
            && key.eq_ignore_ascii_case(b"connection")
        {
            let (close, keep_alive) = connection_options(value);
            if close {
                self.has_close = true;
            }
            if keep_alive {
                self.has_keep_alive = true;
            }
            return;
        }
        if self.is_flag(ReadFlags::NOT_SCAN_BODY_INFO) {
            return;
        }
        if self.body_type != BodyType::ChunkedContentLength
            && self.body_type != BodyType::ContentLength
            && key.eq_ignore_ascii_case(b"content-length")
        {
            if let Some(num) = parse_content_length(value) {
                self.body_type = if self.body_type == BodyType::Chunked {
                    BodyType::ChunkedContentLength
                } else {
                    BodyType::ContentLength
                };
                self.content_length = num;
            }
        } else if self.body_type != BodyType::ChunkedContentLength
            && self.body_type != BodyType::Chunked
            && key.eq_ignore_ascii_case(b"transfer-encoding")
            && token_list_contains(value, b"chunked")
        {
            self.body_type = if self.body_type == BodyType::ContentLength {
                BodyType::ChunkedContentLength
            } else {
                BodyType::Chunked
            };
        }
    }
}

/// Shared end-of-line sub-machine.
///
/// Consumes CRLF (or a bare terminator when a flag allows it) across the
/// two EOL states and enters `next`. Returns false when it could not:
/// either suspended at end of input (resumable) or on a terminator
/// violation (fatal); the context distinguishes the two.
pub(crate) fn read_eol(
    ctx: &mut ReadContext,
    seq: &mut Scanner,
    one_byte: ReadState,
    two_byte: ReadState,
    next: ReadState,
) -> bool {
    if ctx.state() == one_byte {
        if seq.eos() {
            ctx.save_pos(seq.pos());
            return false;
        }
        if ctx.is_flag(ReadFlags::ALLOW_ONLY_N) && seq.consume_if(b'\n') {
            ctx.change_state(next, seq.pos());
            return true;
        }
        if !seq.consume_if(b'\r') {
            ctx.fail_pos(seq.pos());
            return false;
        }
        ctx.change_state(two_byte, seq.pos());
    }
    if ctx.state() == two_byte {
        if seq.eos() {
            ctx.save_pos(seq.pos());
            return false;
        }
        if !seq.consume_if(b'\n') {
            if ctx.is_flag(ReadFlags::ALLOW_ONLY_R) {
                ctx.change_state(next, seq.pos());
                return true;
            }
            ctx.fail_pos(seq.pos());
            return false;
        }
        ctx.change_state(next, seq.pos());
    }
    true
}

/// Render state for one message: the same semantic observations the read
/// side collects, gathered while headers are emitted, deciding how the
/// body may be written afterwards.
#[derive(Clone, Debug)]
pub struct WriteContext {
    content_length: u64,
    flags: u64,
    state: WriteState,
    has_chunked: bool,
    has_content_length: bool,
    has_trailer: bool,
    require_no_body: bool,
    invalid_content_length: bool,
    is_server: bool,
    has_close: bool,
    has_keep_alive: bool,
    has_host: bool,
    http_major: u8,
    http_minor: u8,
}

impl Default for WriteContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteContext {
    pub fn new() -> Self {
        Self {
            content_length: 0,
            flags: 0,
            state: WriteState::Uninit,
            has_chunked: false,
            has_content_length: false,
            has_trailer: false,
            require_no_body: false,
            invalid_content_length: false,
            is_server: false,
            has_close: false,
            has_keep_alive: false,
            has_host: false,
            http_major: 0,
            http_minor: 0,
        }
    }

    pub fn with_flags(flags: u64) -> Self {
        let mut ctx = Self::new();
        ctx.flags = flags;
        ctx
    }

    /// Resets everything except the configured flags.
    pub fn reset(&mut self) {
        let flags = self.flags;
        *self = Self::new();
        self.flags = flags;
    }

    pub fn is_flag(&self, flag: u64) -> bool {
        self.flags.is_set(flag)
    }

    pub fn set_flags(&mut self, flags: u64) {
        self.flags = flags;
    }

    pub fn add_flag(&mut self, flag: u64) {
        self.flags.set(flag);
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    pub fn set_state(&mut self, state: WriteState) {
        self.state = state;
    }

    pub fn has_chunked(&self) -> bool {
        self.has_chunked
    }

    pub fn has_content_length(&self) -> bool {
        self.has_content_length
    }

    pub fn is_invalid_content_length(&self) -> bool {
        self.invalid_content_length
    }

    pub fn has_trailer(&self) -> bool {
        self.has_trailer
    }

    pub fn has_host(&self) -> bool {
        self.has_host
    }

    pub fn has_close(&self) -> bool {
        self.has_close
    }

    pub fn has_keep_alive(&self) -> bool {
        self.has_keep_alive
    }

    pub fn no_body(&self) -> bool {
        self.require_no_body
    }

    pub fn is_server(&self) -> bool {
        self.is_server
    }

    pub fn set_server(&mut self, is_server: bool) {
        self.is_server = is_server;
    }

    pub fn http_major_version(&self) -> u8 {
        self.http_major
    }

    pub fn http_minor_version(&self) -> u8 {
        self.http_minor
    }

    pub fn remain_content_length(&self) -> u64 {
        self.content_length
    }

    pub fn save_remain_content_length(&mut self, len: u64) {
        self.content_length = len;
    }

    /// HTTP/1.1 requests must carry `Host`.
    pub fn require_host(&self) -> bool {
        !self.is_server && self.http_major == 1 && self.http_minor == 1
    }

    /// Keep-alive as the rendered message will be understood by a reader.
    pub fn is_keep_alive(&self) -> bool {
        is_keep_alive(
            true,
            self.has_close,
            self.has_keep_alive,
            self.http_major,
            self.http_minor,
        )
    }

    pub fn scan_method(&mut self, method: &[u8]) {
        if is_no_body_method(method)
            || (!self.is_flag(WriteFlags::DELETE_METHOD_HAS_BODY) && method == b"DELETE")
        {
            self.require_no_body = true;
        }
    }

    pub fn scan_status_code(&mut self, code: u16) {
        if is_no_body_status(code) {
            self.require_no_body = true;
        }
    }

    pub fn scan_http_version(&mut self, major: u8, minor: u8) {
        self.http_major = major;
        self.http_minor = minor;
    }

    /// Same semantic scan as the read side, applied to each emitted
    /// field.
    pub fn scan_header(&mut self, key: &[u8], value: &[u8]) {
        if key.eq_ignore_ascii_case(b"transfer-encoding") {
            if token_list_contains(value, b"chunked") {
                self.has_chunked = true;
            }
            return;
        }
        if key.eq_ignore_ascii_case(b"content-length") {
            if self.has_content_length {
                // a second Content-Length is ambiguous
                self.invalid_content_length = true;
            }
            self.has_content_length = true;
            match parse_content_length(trimmed(value)) {
                Some(num) => self.content_length = num,
                None => {
                    self.content_length = 0;
                    self.invalid_content_length = true;
                }
            }
            return;
        }
        if key.eq_ignore_ascii_case(b"trailer") {
            self.has_trailer = true;
            return;
        }
        if key.eq_ignore_ascii_case(b"connection") {
            let (close, keep_alive) = connection_options(value);
            if close {
                self.has_close = true;
            }
            if keep_alive {
                self.has_keep_alive = true;
            }
            return;
        }
        if key.eq_ignore_ascii_case(b"host") {
            self.has_host = true;
        }
    }
}

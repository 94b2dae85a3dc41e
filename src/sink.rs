//! Sinks: where parsed tokens, fields and body bytes go.
//!
//! The codecs emit through two small traits instead of dispatching on
//! container shape. Both traits have a range entry point, fed by the
//! parser with the full input and byte ranges, and a byte entry point the
//! default range implementation forwards to. Sinks accumulate: token
//! sinks receive each token exactly once, body sinks receive data
//! incrementally across resumed calls.

use crate::bstr::Bstr;
use crate::error::HeaderError;
use crate::table::Table;

/// Byte range into the current input buffer.
///
/// Ranges are invalidated when the facade trims its input; see
/// [`crate::context::ReadContext::adjusted_offset`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The bytes this range covers.
    pub fn slice<'a>(&self, src: &'a [u8]) -> &'a [u8] {
        &src[self.start..self.end]
    }
}

/// Key and value ranges of one field line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldRange {
    pub key: Range,
    pub value: Range,
}

/// Receiver for a single token or for body bytes.
pub trait ValueSink {
    /// Accepts a range of the input. Defaults to forwarding the bytes.
    fn accept_range(&mut self, src: &[u8], range: Range) {
        self.accept(range.slice(src));
    }

    /// Accepts bytes, appending to anything accepted before.
    fn accept(&mut self, bytes: &[u8]);
}

impl ValueSink for Bstr {
    fn accept(&mut self, bytes: &[u8]) {
        self.add(bytes);
    }
}

impl<F: FnMut(&[u8])> ValueSink for F {
    fn accept(&mut self, bytes: &[u8]) {
        self(bytes)
    }
}

/// Range-only sink: records where the token sits instead of copying it.
impl ValueSink for Range {
    fn accept_range(&mut self, _src: &[u8], range: Range) {
        *self = range;
    }

    fn accept(&mut self, _bytes: &[u8]) {}
}

/// Receiver for parsed field lines.
pub trait FieldSink {
    /// Accepts one field as ranges into the input. Defaults to slicing
    /// and forwarding to [`FieldSink::accept_kv`].
    fn accept_range(&mut self, src: &[u8], range: FieldRange) -> Result<(), HeaderError> {
        self.accept_kv(range.key.slice(src), range.value.slice(src))
    }

    /// Accepts one field as key and value bytes. Returning an error stops
    /// the parse with the read context positioned on this field.
    fn accept_kv(&mut self, key: &[u8], value: &[u8]) -> Result<(), HeaderError>;
}

impl FieldSink for Table<Bstr> {
    fn accept_kv(&mut self, key: &[u8], value: &[u8]) -> Result<(), HeaderError> {
        self.add(Bstr::from(key), Bstr::from(value));
        Ok(())
    }
}

impl<F: FnMut(&[u8], &[u8]) -> Result<(), HeaderError>> FieldSink for F {
    fn accept_kv(&mut self, key: &[u8], value: &[u8]) -> Result<(), HeaderError> {
        self(key, value)
    }
}

/// Sink that drops everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct Discard;

impl ValueSink for Discard {
    fn accept(&mut self, _bytes: &[u8]) {}
}

impl FieldSink for Discard {
    fn accept_kv(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), HeaderError> {
        Ok(())
    }
}

/// Sink that folds status digits into a numeric code as they arrive.
///
/// When rough flags let the status token exceed three digits, the first
/// three are kept.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCode {
    code: u16,
}

impl StatusCode {
    pub fn new() -> Self {
        Self { code: 0 }
    }

    pub fn get(&self) -> u16 {
        self.code
    }
}

impl ValueSink for StatusCode {
    fn accept(&mut self, bytes: &[u8]) {
        for &c in bytes {
            if !c.is_ascii_digit() {
                continue;
            }
            self.code = self.code * 10 + u16::from(c - b'0');
            if self.code >= 1000 {
                self.code /= 10;
            }
        }
    }
}

/// Where the pieces of a parsed request line sit in the input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Range,
    pub path: Range,
    pub version: Range,
}

impl RequestLine {
    pub fn get_method<'a>(&self, full_request: &'a [u8]) -> &'a [u8] {
        self.method.slice(full_request)
    }

    pub fn get_path<'a>(&self, full_request: &'a [u8]) -> &'a [u8] {
        self.path.slice(full_request)
    }

    pub fn get_version<'a>(&self, full_request: &'a [u8]) -> &'a [u8] {
        self.version.slice(full_request)
    }
}

/// Where the pieces of a parsed status line sit in the input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Range,
    pub status_code: Range,
    pub reason_phrase: Range,
}

impl StatusLine {
    pub fn get_version<'a>(&self, full_response: &'a [u8]) -> &'a [u8] {
        self.version.slice(full_response)
    }

    pub fn get_status_code<'a>(&self, full_response: &'a [u8]) -> &'a [u8] {
        self.status_code.slice(full_response)
    }

    pub fn get_reason_phrase<'a>(&self, full_response: &'a [u8]) -> &'a [u8] {
        self.reason_phrase.slice(full_response)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn value_sinks_accumulate() {
        let mut b = Bstr::new();
        b.accept(b"hel");
        b.accept(b"lo");
        assert_eq!(b, "hello");

        let mut b = Bstr::new();
        b.accept_range(b"GET / HTTP/1.1", Range::new(0, 3));
        assert_eq!(b, "GET");

        let mut seen = Vec::new();
        let mut collect = |bytes: &[u8]| seen.push(bytes.to_vec());
        collect.accept(b"GET");
        drop(collect);
        assert_eq!(seen, vec![b"GET".to_vec()]);
    }

    #[test]
    fn range_sink_records_position() {
        let mut r = Range::default();
        r.accept_range(b"GET / HTTP/1.1", Range::new(4, 5));
        assert_eq!(r, Range::new(4, 5));
        assert_eq!(r.slice(b"GET / HTTP/1.1"), b"/");
    }

    #[test]
    fn field_sink_into_table() {
        let mut t: Table<Bstr> = Table::new();
        t.accept_kv(b"Host", b"example.com").unwrap();
        assert_eq!(t.get_nocase("host").unwrap().1, "example.com");
    }

    #[test]
    fn status_code_folds_digits() {
        let mut status = StatusCode::new();
        status.accept(b"204");
        assert_eq!(status.get(), 204);

        // longer tokens keep the leading three digits
        let mut status = StatusCode::new();
        status.accept(b"20045");
        assert_eq!(status.get(), 200);
    }
}

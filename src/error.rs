//! Error taxonomy. Everything is returned as a value; nothing panics.

use crate::state::ReadState;

/// Failure while parsing or rendering a first line or a field block.
///
/// Whether a parse failure is recoverable is not encoded here; it is a
/// property of the read context. Recoverable means the input ran out at a
/// valid intermediate point and the same call can be repeated with more
/// bytes. See [`crate::context::ReadContext::is_resumable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderError {
    InvalidHeader,
    InvalidHeaderKey,
    NotColon,
    InvalidHeaderValue,
    ValidationError,
    NotEndOfLine,

    InvalidMethod,
    InvalidPath,
    InvalidVersion,
    InvalidStatusCode,
    InvalidReasonPhrase,
    NotSpace,

    InvalidState,
    NoData,

    InvalidContentLength,
    NoHost,
}

impl HeaderError {
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderError::InvalidHeader => "invalid_header",
            HeaderError::InvalidHeaderKey => "invalid_header_key",
            HeaderError::NotColon => "not_colon",
            HeaderError::InvalidHeaderValue => "invalid_header_value",
            HeaderError::ValidationError => "validation_error",
            HeaderError::NotEndOfLine => "not_end_of_line",
            HeaderError::InvalidMethod => "invalid_method",
            HeaderError::InvalidPath => "invalid_path",
            HeaderError::InvalidVersion => "invalid_version",
            HeaderError::InvalidStatusCode => "invalid_status_code",
            HeaderError::InvalidReasonPhrase => "invalid_reason_phrase",
            HeaderError::NotSpace => "not_space",
            HeaderError::InvalidState => "invalid_state",
            HeaderError::NoData => "no_data",
            HeaderError::InvalidContentLength => "invalid_content_length",
            HeaderError::NoHost => "no_host",
        }
    }
}

impl core::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for HeaderError {}

/// Outcome of a body read or write step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum BodyResult {
    /// The framed body is complete.
    Full,
    /// No framing was advertised; everything available was delivered.
    BestEffort,
    /// More input (or another write call) is needed.
    Incomplete,

    InvalidState,
    /// Advertised length and actual body length disagree.
    LengthMismatch,
    /// Whitespace where the chunk grammar allows none.
    BadSpace,
    /// Malformed line inside the chunk framing.
    BadLine,
    /// The framing headers themselves are unusable (both `Content-Length`
    /// and chunked, with no tolerance flag).
    InvalidHeader,
}

impl BodyResult {
    /// True for the two success outcomes.
    pub fn is_complete(self) -> bool {
        matches!(self, BodyResult::Full | BodyResult::BestEffort)
    }

    /// True for fatal outcomes (not success and not a plain suspension).
    pub fn is_error(self) -> bool {
        !self.is_complete() && self != BodyResult::Incomplete
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BodyResult::Full => "full",
            BodyResult::BestEffort => "best_effort",
            BodyResult::Incomplete => "incomplete",
            BodyResult::InvalidState => "invalid_state",
            BodyResult::LengthMismatch => "length_mismatch",
            BodyResult::BadSpace => "bad_space",
            BodyResult::BadLine => "bad_line",
            BodyResult::InvalidHeader => "invalid_header",
        }
    }
}

impl core::fmt::Display for BodyResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate failure report for the read side of the facade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReadError {
    /// State the read context was left in.
    pub state: ReadState,
    /// Byte position within the current input where parsing stopped.
    pub pos: usize,
    pub header_error: Option<HeaderError>,
    pub body_error: Option<BodyResult>,
    /// True when delivering more input and repeating the call will make
    /// progress; false means protocol violation.
    pub is_resumable: bool,
}

impl core::fmt::Display for HttpReadError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "read error: state={:?}, pos={}", self.state, self.pos)?;
        if let Some(err) = self.header_error {
            write!(f, ", header_error={}", err)?;
        }
        if let Some(err) = self.body_error {
            write!(f, ", body_error={}", err)?;
        }
        if self.is_resumable {
            f.write_str(", resumable")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpReadError {}

/// Aggregate failure report for the write side of the facade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpWriteError {
    pub header_error: Option<HeaderError>,
    pub body_error: Option<BodyResult>,
}

impl From<HeaderError> for HttpWriteError {
    fn from(err: HeaderError) -> Self {
        Self {
            header_error: Some(err),
            body_error: None,
        }
    }
}

impl core::fmt::Display for HttpWriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("write error:")?;
        if let Some(err) = self.header_error {
            write!(f, " header_error={}", err)?;
        }
        if let Some(err) = self.body_error {
            write!(f, " body_error={}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpWriteError {}

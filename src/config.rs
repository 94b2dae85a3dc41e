//! Leniency and policy flags for the read and write contexts.
//!
//! Flags are plain bit words. They are meant to be chosen once, before a
//! message is parsed or rendered, and left alone until the context is
//! reset; the contexts never mutate them.

/// Read-side flags.
#[derive(Debug, PartialEq, Eq)]
pub struct ReadFlags;

impl ReadFlags {
    /// Accept a bare `\n` as end of line.
    pub const ALLOW_ONLY_N: u64 = 0x1;
    /// Accept a bare `\r` as end of line. Not recommended, but some
    /// clients send it.
    pub const ALLOW_ONLY_R: u64 = 0x2;

    /// Accept any method token up to the first SP.
    pub const ROUGH_METHOD: u64 = 0x4;
    /// Accept any request target up to the first SP.
    pub const ROUGH_PATH: u64 = 0x8;
    /// Accept any version token up to the line end.
    pub const ROUGH_REQUEST_VERSION: u64 = 0x10;
    pub const ROUGH_RESPONSE_VERSION: u64 = Self::ROUGH_REQUEST_VERSION;
    /// Accept any status token up to the first SP.
    pub const ROUGH_STATUS_CODE: u64 = Self::ROUGH_METHOD;
    /// With `ROUGH_STATUS_CODE`, drop the three-digit length requirement.
    pub const ROUGH_STATUS_CODE_LENGTH: u64 = Self::ROUGH_PATH;
    /// Accept any key bytes up to the colon.
    pub const ROUGH_HEADER_KEY: u64 = 0x20;
    /// Accept any value bytes up to the line end.
    pub const ROUGH_HEADER_VALUE: u64 = 0x40;

    /// Accept obs-text (0x80-0xFF) in field values.
    pub const ALLOW_OBS_TEXT: u64 = 0x80;

    /// Preserve leading SP/HTAB in field values.
    pub const NOT_TRIM_PRE_SPACE: u64 = 0x100;
    /// Preserve trailing SP/HTAB in field values.
    pub const NOT_TRIM_POST_SPACE: u64 = 0x200;

    /// Skip `Content-Length`/`Transfer-Encoding` scanning.
    pub const NOT_SCAN_BODY_INFO: u64 = 0x400;

    /// Return `Incomplete` after each chunk body so the caller can
    /// deliver chunks one by one.
    pub const SUSPEND_ON_CHUNKED: u64 = 0x800;

    /// Tolerate `Content-Length` together with chunked, verifying that the
    /// chunk sizes add up to the advertised length. Not in the RFC.
    pub const CONSISTENT_CHUNKED_CONTENT_LENGTH: u64 = 0x1000;
    /// Tolerate `Content-Length` together with chunked by parsing as
    /// chunked and ignoring the length. Mutually exclusive with
    /// `CONSISTENT_CHUNKED_CONTENT_LENGTH`.
    pub const CHUNKED_CONTENT_LENGTH_AS_CHUNKED: u64 = 0x2000;

    /// Skip `Connection` scanning.
    pub const NOT_SCAN_CONNECTION_HEADER: u64 = 0x4000;

    /// Allow a bare `METHOD PATH\r\n` request with no version token.
    /// Experimental.
    pub const LEGACY_HTTP_0_9: u64 = 0x8000;

    /// Skip `Trailer` scanning.
    pub const NOT_SCAN_TRAILER_HEADER: u64 = 0x10000;

    /// Parse a trailer block even when no `Trailer` header was seen.
    pub const NOT_STRICT_TRAILER: u64 = 0x20000;

    /// Treat DELETE as a body-bearing method.
    pub const DELETE_METHOD_HAS_BODY: u64 = 0x40000;

    /// Do not require `Host` on HTTP/1.1 requests.
    pub const ALLOW_NO_HOST: u64 = 0x80000;
}

/// Write-side flags.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteFlags;

impl WriteFlags {
    /// Only reject methods containing SP/CR/LF instead of requiring a
    /// token.
    pub const ROUGH_METHOD: u64 = 0x1;
    /// Only reject targets containing SP/CR/LF.
    pub const ROUGH_PATH: u64 = 0x2;
    /// Emit the version string without validating it.
    pub const TRUST_VERSION: u64 = 0x4;
    pub const ROUGH_HEADER_KEY: u64 = 0x8;
    pub const ROUGH_HEADER_VALUE: u64 = 0x10;
    /// Allow rendering a versionless HTTP/0.9 request line. Experimental.
    pub const LEGACY_HTTP_0_9: u64 = 0x20;
    /// Emit the reason phrase without the CR/LF check.
    pub const TRUST_PHRASE: u64 = 0x40;

    /// Allow malformed `Content-Length` values through. For testing.
    pub const ALLOW_INVALID_CONTENT_LENGTH: u64 = 0x80;
    /// Allow body framing headers on messages that must not carry a body.
    /// For testing.
    pub const ALLOW_UNEXPECTED_CONTENT_LENGTH_OR_CHUNKED_WITH_NO_BODY: u64 = 0x100;
    /// Allow both `Content-Length` and chunked on one message. For testing.
    pub const ALLOW_BOTH_CHUNKED_AND_CONTENT_LENGTH: u64 = 0x200;

    /// Allow a body with no framing information at all.
    pub const ALLOW_NO_LENGTH_INFO_BODY: u64 = 0x400;
    /// With `ALLOW_NO_LENGTH_INFO_BODY`, allow it even on a keep-alive
    /// connection, where the peer cannot find the message end.
    pub const ALLOW_NO_LENGTH_EVEN_IF_KEEP_ALIVE: u64 = 0x800;

    /// Treat DELETE as a body-bearing method.
    pub const DELETE_METHOD_HAS_BODY: u64 = 0x1000;

    /// Do not require `Host` on HTTP/1.1 requests.
    pub const ALLOW_NO_HOST: u64 = 0x2000;
}

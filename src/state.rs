//! Read and write state machines, totally ordered by protocol progression.

/// Parser position within a message.
///
/// Every suspension point of the read machine is a distinct state so that
/// parsing can resume from exactly where the input ran out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadState {
    Uninit,

    // request line
    MethodInit,
    Method,
    MethodSpace,
    Path,
    PathSpace,
    RequestVersion,
    RequestVersionLineOneByte,
    RequestVersionLineTwoByte,

    // status line
    ResponseVersionInit,
    ResponseVersion,
    ResponseVersionSpace,
    StatusCode,
    StatusCodeSpace,
    ReasonPhrase,
    ReasonPhraseLineOneByte,
    ReasonPhraseLineTwoByte,

    // header block
    HeaderInit,
    HeaderEolOneByte,
    HeaderEolTwoByte,
    HeaderKey,
    HeaderColon,
    HeaderPreSpace,
    HeaderValue,
    HeaderLastEolOneByte,
    HeaderLastEolTwoByte,

    // body
    BodyInit,
    BodyContentLengthInit,
    BodyContentLength,
    BodyChunkedInit,
    BodyChunkedSize,
    BodyChunkedExtensionInit,
    BodyChunkedExtension,
    BodyChunkedSizeEolOneByte,
    BodyChunkedSizeEolTwoByte,
    BodyChunkedDataInit,
    BodyChunkedData,
    BodyChunkedDataEolOneByte,
    BodyChunkedDataEolTwoByte,
    BodyEnd,

    // trailer block
    TrailerInit,
    TrailerEolOneByte,
    TrailerEolTwoByte,
    TrailerKey,
    TrailerColon,
    TrailerPreSpace,
    TrailerValue,
    TrailerLastEolOneByte,
    TrailerLastEolTwoByte,
}

impl ReadState {
    /// True while a saved field-key range is live and the input head must
    /// not move past it.
    pub fn is_header_key_reserved(self) -> bool {
        matches!(
            self,
            ReadState::HeaderColon
                | ReadState::HeaderPreSpace
                | ReadState::HeaderValue
                | ReadState::TrailerColon
                | ReadState::TrailerPreSpace
                | ReadState::TrailerValue
        )
    }

    pub fn is_start(self) -> bool {
        self == ReadState::Uninit
    }

    pub fn is_first_line(self) -> bool {
        matches!(
            self,
            ReadState::MethodInit
                | ReadState::Method
                | ReadState::MethodSpace
                | ReadState::Path
                | ReadState::PathSpace
                | ReadState::RequestVersion
                | ReadState::RequestVersionLineOneByte
                | ReadState::RequestVersionLineTwoByte
                | ReadState::ResponseVersionInit
                | ReadState::ResponseVersion
                | ReadState::ResponseVersionSpace
                | ReadState::StatusCode
                | ReadState::StatusCodeSpace
                | ReadState::ReasonPhrase
                | ReadState::ReasonPhraseLineOneByte
                | ReadState::ReasonPhraseLineTwoByte
        )
    }

    pub fn is_header_line(self) -> bool {
        matches!(
            self,
            ReadState::HeaderInit
                | ReadState::HeaderEolOneByte
                | ReadState::HeaderEolTwoByte
                | ReadState::HeaderKey
                | ReadState::HeaderColon
                | ReadState::HeaderPreSpace
                | ReadState::HeaderValue
                | ReadState::HeaderLastEolOneByte
                | ReadState::HeaderLastEolTwoByte
        )
    }

    pub fn is_trailer_line(self) -> bool {
        matches!(
            self,
            ReadState::TrailerInit
                | ReadState::TrailerEolOneByte
                | ReadState::TrailerEolTwoByte
                | ReadState::TrailerKey
                | ReadState::TrailerColon
                | ReadState::TrailerPreSpace
                | ReadState::TrailerValue
                | ReadState::TrailerLastEolOneByte
                | ReadState::TrailerLastEolTwoByte
        )
    }

    pub fn is_body_in_progress(self) -> bool {
        matches!(
            self,
            ReadState::BodyInit
                | ReadState::BodyContentLengthInit
                | ReadState::BodyContentLength
                | ReadState::BodyChunkedInit
                | ReadState::BodyChunkedSize
                | ReadState::BodyChunkedExtensionInit
                | ReadState::BodyChunkedExtension
                | ReadState::BodyChunkedSizeEolOneByte
                | ReadState::BodyChunkedSizeEolTwoByte
                | ReadState::BodyChunkedDataInit
                | ReadState::BodyChunkedData
                | ReadState::BodyChunkedDataEolOneByte
                | ReadState::BodyChunkedDataEolTwoByte
        )
    }
}

/// Renderer position within a message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteState {
    Uninit,
    Header,
    ContentLengthBody,
    ChunkedBody,
    /// Both framings advertised. Malformed, reachable only by flag.
    ContentLengthChunkedBody,
    Trailer,
    BestEffortBody,
    End,
    /// A framing error was reported; the context must be reset before reuse.
    Failed,
}

/// Body framing observed while scanning headers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyType {
    NoInfo,
    Chunked,
    ContentLength,
    /// Both `Content-Length` and `Transfer-Encoding: chunked` were present.
    /// Malformed; see <https://www.rfc-editor.org/rfc/rfc9112#section-6.3>.
    ChunkedContentLength,
}

/// Coarse message progress, derived from [`ReadState`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpState {
    Init,
    FirstLine,
    Header,
    Body,
    Trailer,
    End,
}

/// Whether the connection persists after this message.
///
/// See <https://www.rfc-editor.org/rfc/rfc9112#name-persistence>
pub fn is_keep_alive(
    is_end: bool,
    has_close: bool,
    has_keep_alive: bool,
    major: u8,
    minor: u8,
) -> bool {
    // before end of message the answer is not determined yet
    if !is_end {
        return false;
    }
    if has_close {
        return false;
    }
    let is_1_0 = major == 1 && minor == 0;
    let is_1_1_or_later = major > 1 || (major == 1 && minor >= 1);
    if is_1_0 {
        has_keep_alive
    } else {
        is_1_1_or_later || has_keep_alive
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // message not finished: never keep-alive
    #[case(false, false, false, 1, 1, false)]
    #[case(false, false, true, 1, 0, false)]
    // explicit close wins
    #[case(true, true, false, 1, 1, false)]
    #[case(true, true, true, 1, 1, false)]
    #[case(true, true, true, 1, 0, false)]
    // HTTP/1.0 requires explicit keep-alive
    #[case(true, false, false, 1, 0, false)]
    #[case(true, false, true, 1, 0, true)]
    // HTTP/1.1 and later default to keep-alive
    #[case(true, false, false, 1, 1, true)]
    #[case(true, false, true, 1, 1, true)]
    #[case(true, false, false, 1, 2, true)]
    #[case(true, false, false, 2, 0, true)]
    // pre-1.0 only with explicit keep-alive
    #[case(true, false, false, 0, 9, false)]
    #[case(true, false, true, 0, 9, true)]
    fn keep_alive_table(
        #[case] is_end: bool,
        #[case] has_close: bool,
        #[case] has_keep_alive: bool,
        #[case] major: u8,
        #[case] minor: u8,
        #[case] expected: bool,
    ) {
        assert_eq!(
            is_keep_alive(is_end, has_close, has_keep_alive, major, minor),
            expected
        );
    }

    #[test]
    fn state_classes_are_disjoint() {
        let all = [
            ReadState::Uninit,
            ReadState::Method,
            ReadState::PathSpace,
            ReadState::StatusCode,
            ReadState::HeaderKey,
            ReadState::HeaderValue,
            ReadState::BodyChunkedData,
            ReadState::BodyEnd,
            ReadState::TrailerValue,
        ];
        for s in all.iter().copied() {
            let classes = [
                s.is_start(),
                s.is_first_line(),
                s.is_header_line(),
                s.is_body_in_progress(),
                s.is_trailer_line(),
            ];
            let live = classes.iter().filter(|c| **c).count();
            assert!(live <= 1, "{:?} is in {} classes", s, live);
        }
        assert!(ReadState::HeaderColon.is_header_key_reserved());
        assert!(ReadState::HeaderValue.is_header_key_reserved());
        assert!(ReadState::TrailerValue.is_header_key_reserved());
        assert!(!ReadState::HeaderKey.is_header_key_reserved());
        assert!(!ReadState::HeaderEolOneByte.is_header_key_reserved());
    }
}

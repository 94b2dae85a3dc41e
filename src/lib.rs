//! Incremental, resumable HTTP/1.1 wire codec.
//!
//! The crate parses and renders HTTP/1.1 request and response messages
//! byte by byte from arbitrarily fragmented input. Parsing can suspend
//! at any input boundary without losing context: every operation either
//! completes, fails fatally, or records a resumable position so the same
//! call continues once more bytes arrive. There is no I/O here; the
//! caller owns the connection and pumps bytes through a [`Codec`].
//!
//! ```
//! use h1codec::bstr::Bstr;
//! use h1codec::table::Table;
//! use h1codec::Codec;
//!
//! let mut codec = Codec::new();
//! codec.add_input(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
//!
//! let mut method = Bstr::new();
//! let mut path = Bstr::new();
//! let mut version = Bstr::new();
//! let mut headers: Table<Bstr> = Table::new();
//! codec
//!     .read_request(&mut method, &mut path, &mut version, &mut headers)
//!     .unwrap();
//! assert_eq!(method, "GET");
//! assert_eq!(path, "/");
//! assert!(codec.read_ctx().has_host());
//! ```
//!
//! Leniency toward real-world traffic is opt-in through the flag tables
//! in [`config`]; the default is strict RFC 9110/9112 syntax with CRLF
//! line endings, a `Host` requirement on HTTP/1.1 requests, and
//! rejection of messages advertising both `Content-Length` and chunked
//! framing.

pub mod body;
pub mod bstr;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod headers;
pub mod parsers;
pub mod request;
pub mod response;
pub mod scanner;
pub mod sink;
pub mod state;
pub mod table;
pub mod util;

pub use crate::codec::Codec;
pub use crate::config::{ReadFlags, WriteFlags};
pub use crate::context::{ReadContext, WriteContext};
pub use crate::error::{BodyResult, HeaderError, HttpReadError, HttpWriteError};
pub use crate::state::{BodyType, HttpState, ReadState, WriteState};

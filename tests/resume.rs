//! Resumability: any prefix of a valid message can be delivered in
//! pieces, and the machine continues from exactly where it stopped.

use h1codec::bstr::Bstr;
use h1codec::context::ReadContext;
use h1codec::request::parse_request;
use h1codec::response::parse_response;
use h1codec::scanner::Scanner;
use h1codec::sink::{Discard, StatusCode};
use h1codec::table::Table;
use h1codec::{BodyResult, Codec, ReadFlags, ReadState};
use rstest::rstest;

/// Drives a request (head + body) through the codec, feeding the input
/// in the given pieces and trimming the buffer after every suspension.
fn drive(parts: &[&[u8]]) -> (Bstr, Bstr, Bstr, Table<Bstr>, Bstr, ReadState) {
    let mut codec = Codec::new();
    let mut method = Bstr::new();
    let mut path = Bstr::new();
    let mut version = Bstr::new();
    let mut headers: Table<Bstr> = Table::new();
    let mut body = Bstr::new();
    let mut head_done = false;
    let mut body_done = false;
    for part in parts {
        codec.add_input(part);
        if !head_done {
            match codec.read_request(&mut method, &mut path, &mut version, &mut headers) {
                Ok(()) => head_done = true,
                Err(err) => {
                    assert!(err.is_resumable, "unexpected fatal error: {}", err);
                    codec.adjust_input();
                    continue;
                }
            }
        }
        if head_done && !body_done {
            match codec.read_body(&mut body) {
                Ok(BodyResult::Full) | Ok(BodyResult::BestEffort) => body_done = true,
                Ok(other) => panic!("unexpected body result: {}", other),
                Err(err) => {
                    assert!(err.is_resumable, "unexpected fatal error: {}", err);
                    codec.adjust_input();
                }
            }
        }
    }
    assert!(head_done, "head never completed");
    assert!(body_done, "body never completed");
    (
        method,
        path,
        version,
        headers,
        body,
        codec.read_state(),
    )
}

#[test]
fn every_split_point_parses_identically() {
    let input: &[u8] =
        b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello";
    let reference = drive(&[input]);
    for split in 0..=input.len() {
        let (a, b) = input.split_at(split);
        let result = drive(&[a, b]);
        assert_eq!(result.0, reference.0, "method differs at split {}", split);
        assert_eq!(result.1, reference.1, "path differs at split {}", split);
        assert_eq!(result.2, reference.2, "version differs at split {}", split);
        assert_eq!(result.3, reference.3, "headers differ at split {}", split);
        assert_eq!(result.4, reference.4, "body differs at split {}", split);
        assert_eq!(result.5, reference.5, "state differs at split {}", split);
    }
}

#[test]
fn every_split_point_parses_chunked_identically() {
    let input: &[u8] = b"POST / HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
    let reference = drive(&[input]);
    assert_eq!(reference.4, "hello world");
    for split in 0..=input.len() {
        let (a, b) = input.split_at(split);
        let result = drive(&[a, b]);
        assert_eq!(result.3, reference.3, "headers differ at split {}", split);
        assert_eq!(result.4, reference.4, "body differs at split {}", split);
        assert_eq!(result.5, reference.5, "state differs at split {}", split);
    }
}

#[test]
fn byte_at_a_time_delivery() {
    let input: &[u8] =
        b"GET /q?x=1 HTTP/1.1\r\nHost: h\r\nAccept: */*\r\n\r\n";
    let pieces: Vec<&[u8]> = input.chunks(1).collect();
    let (method, path, _, headers, _, state) = drive(&pieces);
    assert_eq!(method, "GET");
    assert_eq!(path, "/q?x=1");
    assert_eq!(headers.size(), 2);
    assert_eq!(state, ReadState::BodyEnd);
}

/// Suspend, trim by the adjusted offset, resume with a fresh buffer that
/// starts with the untrimmed remainder. The deltas are part of the
/// contract: they say how many bytes the caller may discard.
#[rstest]
#[case(b"GET / HTTP/1.1\r\nkey: value", 16, b"key: value\r\n\r\n", ReadState::BodyInit)]
#[case(b"", 0, b"G", ReadState::Method)]
#[case(b"G", 0, b"GET", ReadState::Method)]
#[case(b"GET", 0, b"GET /", ReadState::Path)]
#[case(b"GET / ", 6, b"HTTP/1.", ReadState::RequestVersion)]
#[case(b"GET / HTTP/1.", 6, b"HTTP/1.1", ReadState::RequestVersionLineOneByte)]
#[case(b"GET / HTTP/1.1", 14, b"\r", ReadState::RequestVersionLineTwoByte)]
#[case(b"GET / HTTP/1.1\r", 15, b"\n", ReadState::HeaderInit)]
#[case(b"GET / HTTP/1.1\r\n", 16, b"key", ReadState::HeaderKey)]
#[case(b"GET / HTTP/1.1\r\nkey", 16, b"key:", ReadState::HeaderPreSpace)]
#[case(b"GET / HTTP/1.1\r\nkey:", 16, b"key: ", ReadState::HeaderPreSpace)]
#[case(b"GET / HTTP/1.1\r\nkey: ", 16, b"key: value", ReadState::HeaderValue)]
#[case(b"GET / HTTP/1.1\r\nkey: value", 16, b"key: value\r", ReadState::HeaderEolTwoByte)]
#[case(b"GET / HTTP/1.1\r\nkey: value\r", 27, b"\n", ReadState::HeaderInit)]
#[case(b"GET / HTTP/1.1\r\nkey: value\r\n", 28, b"\r", ReadState::HeaderLastEolTwoByte)]
fn request_suspend_deltas(
    #[case] first: &[u8],
    #[case] delta: usize,
    #[case] next: &[u8],
    #[case] expected_state: ReadState,
) {
    let mut ctx = ReadContext::with_flags(ReadFlags::ALLOW_NO_HOST);
    let mut seq = Scanner::new(first);
    let _ = parse_request(
        &mut ctx,
        &mut seq,
        &mut Discard,
        &mut Discard,
        &mut Discard,
        &mut Discard,
    );
    assert!(ctx.is_resumable(), "first call should suspend");
    assert_eq!(ctx.adjust_offset_to_start(), delta);

    let mut seq = Scanner::new(next);
    let _ = parse_request(
        &mut ctx,
        &mut seq,
        &mut Discard,
        &mut Discard,
        &mut Discard,
        &mut Discard,
    );
    assert_eq!(ctx.state(), expected_state);
}

#[rstest]
#[case(b"HTTP/1.1 200 OK\r\nkey: value", 17, b"key: value\r\n\r\n", ReadState::BodyInit)]
#[case(b"", 0, b"H", ReadState::ResponseVersion)]
#[case(b"H", 0, b"HTTP", ReadState::ResponseVersion)]
#[case(b"HTTP", 0, b"HTTP/1.", ReadState::ResponseVersion)]
#[case(b"HTTP/1.", 0, b"HTTP/1.1", ReadState::ResponseVersionSpace)]
#[case(b"HTTP/1.1", 8, b" 20", ReadState::StatusCode)]
#[case(b"HTTP/1.1 20", 9, b"200", ReadState::StatusCodeSpace)]
#[case(b"HTTP/1.1 200", 12, b" OK", ReadState::ReasonPhrase)]
#[case(b"HTTP/1.1 200 OK", 13, b"OK\r", ReadState::ReasonPhraseLineTwoByte)]
#[case(b"HTTP/1.1 200 OK\r", 16, b"\n", ReadState::HeaderInit)]
#[case(b"HTTP/1.1 200 OK\r\n", 17, b"key", ReadState::HeaderKey)]
#[case(b"HTTP/1.1 200 OK\r\nkey", 17, b"key:", ReadState::HeaderPreSpace)]
#[case(b"HTTP/1.1 200 OK\r\nkey:", 17, b"key: ", ReadState::HeaderPreSpace)]
#[case(b"HTTP/1.1 200 OK\r\nkey: ", 17, b"key: value", ReadState::HeaderValue)]
#[case(b"HTTP/1.1 200 OK\r\nkey: value", 17, b"key: value\r", ReadState::HeaderEolTwoByte)]
#[case(b"HTTP/1.1 200 OK\r\nkey: value\r", 28, b"\n", ReadState::HeaderInit)]
#[case(b"HTTP/1.1 200 OK\r\nkey: value\r\n", 29, b"\r", ReadState::HeaderLastEolTwoByte)]
fn response_suspend_deltas(
    #[case] first: &[u8],
    #[case] delta: usize,
    #[case] next: &[u8],
    #[case] expected_state: ReadState,
) {
    let mut ctx = ReadContext::new();
    let mut seq = Scanner::new(first);
    let _ = parse_response(
        &mut ctx,
        &mut seq,
        &mut Discard,
        &mut Discard,
        &mut Discard,
        &mut Discard,
    );
    assert!(ctx.is_resumable(), "first call should suspend");
    assert_eq!(ctx.adjust_offset_to_start(), delta);

    let mut seq = Scanner::new(next);
    let _ = parse_response(
        &mut ctx,
        &mut seq,
        &mut Discard,
        &mut Discard,
        &mut Discard,
        &mut Discard,
    );
    assert_eq!(ctx.state(), expected_state);
}

#[test]
fn render_then_parse_request() {
    let mut writer = Codec::new();
    let headers: Vec<(&[u8], &[u8])> = vec![
        (b"Host", b"example.com"),
        (b"Content-Length", b"11"),
        (b"Accept", b"*/*"),
    ];
    writer.write_request(b"POST", b"/submit", headers).unwrap();
    assert_eq!(writer.write_body(b"hello"), BodyResult::Incomplete);
    assert_eq!(writer.write_body(b" world"), BodyResult::Full);

    let mut reader = Codec::new();
    reader.add_input(writer.output());
    let mut method = Bstr::new();
    let mut path = Bstr::new();
    let mut version = Bstr::new();
    let mut headers: Table<Bstr> = Table::new();
    reader
        .read_request(&mut method, &mut path, &mut version, &mut headers)
        .unwrap();
    assert_eq!(method, "POST");
    assert_eq!(path, "/submit");
    assert_eq!(version, "HTTP/1.1");
    assert_eq!(headers.size(), 3);
    assert_eq!(headers.get_nocase("content-length").unwrap().1, "11");

    let mut body = Bstr::new();
    assert_eq!(reader.read_body(&mut body), Ok(BodyResult::Full));
    assert_eq!(body, "hello world");

    // the reader consumed exactly what the writer produced
    assert_eq!(reader.adjust_input(), writer.output().len());
    assert!(reader.input().is_empty());
}

#[test]
fn render_then_parse_chunked_response() {
    let mut writer = Codec::new();
    let headers: Vec<(&[u8], &[u8])> = vec![(b"Transfer-Encoding", b"chunked")];
    writer.write_response(200, None, headers).unwrap();
    assert_eq!(writer.write_chunk(b"hello", b"meta"), BodyResult::Incomplete);
    assert_eq!(writer.write_body(b" world"), BodyResult::Incomplete);
    assert_eq!(writer.write_end_of_chunk(), BodyResult::Full);

    let mut reader = Codec::new();
    reader.add_input(writer.output());
    let mut version = Bstr::new();
    let mut status = StatusCode::new();
    let mut phrase = Bstr::new();
    let mut headers: Table<Bstr> = Table::new();
    reader
        .read_response(&mut version, &mut status, &mut phrase, &mut headers)
        .unwrap();
    assert_eq!(status.get(), 200);

    let mut body = Bstr::new();
    let mut ext = Bstr::new();
    assert_eq!(
        reader.read_body_with_extension(&mut body, &mut ext),
        Ok(BodyResult::Full)
    );
    assert_eq!(body, "hello world");
    assert_eq!(ext, "meta");
}

#[test]
fn consistent_hybrid_framing_adds_up() {
    // chunk sizes sum to the advertised length: accepted
    let mut codec = Codec::with_flags(ReadFlags::CONSISTENT_CHUNKED_CONTENT_LENGTH, 0);
    codec
        .read_ctx_mut()
        .set_body_info(h1codec::BodyType::ChunkedContentLength, 11);
    codec.add_input(b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
    let mut body = Bstr::new();
    assert_eq!(codec.read_body(&mut body), Ok(BodyResult::Full));
    assert_eq!(body, "hello world");

    // advertised one byte short: rejected at the terminal chunk
    let mut codec = Codec::with_flags(ReadFlags::CONSISTENT_CHUNKED_CONTENT_LENGTH, 0);
    codec
        .read_ctx_mut()
        .set_body_info(h1codec::BodyType::ChunkedContentLength, 12);
    codec.add_input(b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
    let mut body = Bstr::new();
    let err = codec.read_body(&mut body).unwrap_err();
    assert_eq!(err.body_error, Some(BodyResult::LengthMismatch));
}

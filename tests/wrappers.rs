//! Tests for the convenience request helpers.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wireprobe::{ProbeError, helpers};

fn spawn_server<F>(handler: F) -> u16
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            handler(stream);
        }
    });

    port
}

fn read_request_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => head.push(byte[0]),
        }
    }
    head
}

#[test]
fn get_loads_a_content_length_body() {
    let port = spawn_server(|mut stream| {
        read_request_head(&mut stream);
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
            .unwrap();
    });

    let response = helpers::get(&format!("http://127.0.0.1:{port}/path?q=1")).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.description, "OK");
    assert_eq!(response.header("CONTENT-length"), Some("5"));
    assert_eq!(response.body, b"hello");
}

#[test]
fn request_decodes_a_chunked_body() {
    let port = spawn_server(|mut stream| {
        read_request_head(&mut stream);
        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                  4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
            )
            .unwrap();
    });

    let response =
        helpers::request("GET", &format!("http://127.0.0.1:{port}/"), &[], None).unwrap();
    assert_eq!(response.body, b"Wikipedia");
}

#[test]
fn post_carries_body_and_content_length() {
    let (captured_tx, captured_rx) = mpsc::channel();
    let port = spawn_server(move |mut stream| {
        let mut request = read_request_head(&mut stream);
        let mut body = [0u8; 3];
        stream.read_exact(&mut body).unwrap();
        request.extend_from_slice(&body);
        captured_tx.send(request).unwrap();

        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
    });

    let response = helpers::post(&format!("http://127.0.0.1:{port}/submit"), b"abc").unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());

    let captured = String::from_utf8(captured_rx.recv().unwrap()).unwrap();
    assert!(captured.starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(captured.contains("Content-Length: 3\r\n"));
    assert!(captured.ends_with("\r\n\r\nabc"));
}

#[test]
fn non_http_scheme_is_rejected() {
    assert!(matches!(
        helpers::get("ftp://127.0.0.1/"),
        Err(ProbeError::Protocol(_))
    ));
}

#[test]
fn streaming_reads_segments_until_close() {
    let port = spawn_server(|mut stream| {
        read_request_head(&mut stream);
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nX-Stream: 1\r\n\r\n")
            .unwrap();
        stream.write_all(b"part1").unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(150));
        stream.write_all(b"part2").unwrap();
    });

    let mut response =
        helpers::request_streaming("GET", &format!("http://127.0.0.1:{port}/"), &[], None)
            .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.headers.get("x-stream"), Some("1"));

    let mut body = Vec::new();
    while let Some(segment) = response.read().unwrap() {
        body.extend_from_slice(&segment);
    }
    assert_eq!(body, b"part1part2");
}

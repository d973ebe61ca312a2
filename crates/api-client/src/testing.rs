//! Canned HTTP backend for client tests

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Requests seen by a [`serve`] backend, as `"METHOD /path?query"`
pub(crate) type Seen = Arc<Mutex<Vec<String>>>;

/// Answer each connection with the next `(status, body)` reply, repeating
/// the last one once the list runs out. Returns the base URL and the log of
/// received request lines.
pub(crate) fn serve(replies: Vec<(u16, &'static str)>) -> (String, Seen) {
    assert!(!replies.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let seen: Seen = Arc::default();
    let log = Arc::clone(&seen);

    thread::spawn(move || {
        for (index, stream) in listener.incoming().enumerate() {
            let Ok(mut stream) = stream else { continue };
            let Some(line) = read_request(&stream) else { continue };
            log.lock().unwrap().push(line);

            let (status, body) = replies[index.min(replies.len() - 1)];
            let reply = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
            let _ = stream.flush();
        }
    });

    (url, seen)
}

/// Consume one request and return its method and target
fn read_request(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    let mut length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                length = value.trim().parse().ok()?;
            }
        }
    }

    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    let mut parts = request_line.split_whitespace();
    Some(format!("{} {}", parts.next()?, parts.next()?))
}

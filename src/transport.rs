use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::RectError;

const READ_CHUNK_SIZE: usize = 4096;
const HEADER_BOUNDARY: &[u8] = b"\r\n\r\n";

/// One-shot request/response exchange with the board over TCP.
///
/// Every exchange opens a fresh connection and drops it when the response has
/// been read; there is no pooling or pipelining. The control channel is
/// low-rate, so connection setup cost is irrelevant next to the simplicity of
/// never carrying state between requests.
#[derive(Clone, Debug)]
pub struct Transport {
    peer: SocketAddrV4,
    timeout: Duration,
    host_name: String,
}

impl Transport {
    pub(crate) fn new(
        address: Ipv4Addr,
        port: u16,
        timeout: Duration,
        host_name: String,
    ) -> Self {
        Self {
            peer: SocketAddrV4::new(address, port),
            timeout,
            host_name,
        }
    }

    pub(crate) fn peer(&self) -> SocketAddrV4 {
        self.peer
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends one request and reads the full response, split into
    /// `(header, body)` at the first blank line.
    pub(crate) fn exchange(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<(Vec<u8>, Vec<u8>), RectError> {
        let mut stream = self.connect()?;

        let request = build_request(method, path, &self.host_name, body);
        stream
            .write_all(&request)
            .map_err(|err| map_send_error(err, self.timeout))?;
        debug!(
            method,
            path,
            body_len = body.map_or(0, <[u8]>::len),
            "request sent"
        );

        let response = read_response(&mut stream, self.timeout)?;
        trace!(response_len = response.len(), "response received");

        // Dropping the stream closes the connection on every exit path.
        split_response(&response)
    }

    fn connect(&self) -> Result<TcpStream, RectError> {
        let connection_error = |err: io::Error| RectError::Connection {
            peer: self.peer.to_string(),
            reason: err.to_string(),
        };

        let stream = TcpStream::connect_timeout(&SocketAddr::V4(self.peer), self.timeout)
            .map_err(connection_error)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(connection_error)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(connection_error)?;

        Ok(stream)
    }
}

fn build_request(method: &str, path: &str, host_name: &str, body: Option<&[u8]>) -> Vec<u8> {
    let mut request = match body {
        Some(body) => format!(
            "{method} {path} HTTP/1.1\r\nHost: {host_name}\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes(),
        None => format!("{method} {path} HTTP/1.1\r\nHost: {host_name}\r\n\r\n").into_bytes(),
    };

    if let Some(body) = body {
        request.extend_from_slice(body);
    }

    request
}

/// Reads the response in fixed-size chunks. Once the header/body boundary is
/// visible, a declared `Content-Length` bounds the read; without one, the
/// peer closing the connection is the completion signal.
fn read_response(stream: &mut TcpStream, timeout: Duration) -> Result<Vec<u8>, RectError> {
    let mut response = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut expected_total: Option<usize> = None;

    loop {
        if let Some(total) = expected_total {
            if response.len() >= total {
                response.truncate(total);
                break;
            }
        }

        let read = match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) => return Err(map_receive_error(err, timeout)),
        };
        response.extend_from_slice(&chunk[..read]);

        if expected_total.is_none() {
            if let Some(boundary) = find_header_boundary(&response) {
                expected_total = declared_body_length(&response[..boundary])
                    .map(|length| boundary + HEADER_BOUNDARY.len() + length);
            }
        }
    }

    Ok(response)
}

fn split_response(response: &[u8]) -> Result<(Vec<u8>, Vec<u8>), RectError> {
    let boundary = find_header_boundary(response).ok_or(RectError::MissingHeaderBoundary)?;
    let header = response[..boundary].to_vec();
    let body = response[boundary + HEADER_BOUNDARY.len()..].to_vec();
    Ok((header, body))
}

fn find_header_boundary(response: &[u8]) -> Option<usize> {
    response
        .windows(HEADER_BOUNDARY.len())
        .position(|window| window == HEADER_BOUNDARY)
}

fn declared_body_length(header: &[u8]) -> Option<usize> {
    let header = std::str::from_utf8(header).ok()?;

    for line in header.split("\r\n").skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse().ok();
        }
    }

    None
}

fn map_send_error(error: io::Error, timeout: Duration) -> RectError {
    if is_timeout(&error) {
        return RectError::Timeout { timeout };
    }

    RectError::TransportSend {
        reason: error.to_string(),
    }
}

fn map_receive_error(error: io::Error, timeout: Duration) -> RectError {
    if is_timeout(&error) {
        return RectError::Timeout { timeout };
    }

    RectError::TransportReceive {
        reason: error.to_string(),
    }
}

// Read timeouts surface as WouldBlock on Unix and TimedOut on Windows.
fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpListener};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::{build_request, declared_body_length, split_response, Transport};
    use crate::error::RectError;

    #[test]
    fn request_with_body_declares_content_length_and_appends_body_unaltered() {
        let body = br#"{"event":"now","actions":[]}"#;
        let request = build_request("POST", "/hardware/operation", "RectTestServer", Some(body));

        let expected_head = format!(
            "POST /hardware/operation HTTP/1.1\r\nHost: RectTestServer\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        assert!(request.starts_with(expected_head.as_bytes()));
        assert_eq!(&request[expected_head.len()..], body);
    }

    #[test]
    fn request_without_body_ends_at_the_blank_line() {
        let request = build_request("GET", "/", "RectTestServer", None);
        assert_eq!(
            request,
            b"GET / HTTP/1.1\r\nHost: RectTestServer\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn response_splits_at_first_blank_line() {
        let (header, body) = split_response(b"HTTP/1.1 200 OK\r\n\r\n{\"a\":1}")
            .expect("response with boundary should split");

        assert_eq!(header, b"HTTP/1.1 200 OK");
        assert_eq!(body, br#"{"a":1}"#);
    }

    #[test]
    fn response_without_boundary_is_a_framing_error() {
        let result = split_response(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n");
        assert!(matches!(result, Err(RectError::MissingHeaderBoundary)));
    }

    #[test]
    fn body_only_splits_on_the_first_boundary() {
        let (_, body) = split_response(b"HTTP/1.1 200 OK\r\n\r\nfirst\r\n\r\nsecond")
            .expect("response should split once");
        assert_eq!(body, b"first\r\n\r\nsecond");
    }

    #[test]
    fn declared_body_length_is_parsed_case_insensitively() {
        assert_eq!(
            declared_body_length(b"HTTP/1.1 200 OK\r\ncontent-length: 42"),
            Some(42)
        );
        assert_eq!(
            declared_body_length(b"HTTP/1.1 200 OK\r\nContent-Length:7"),
            Some(7)
        );
        assert_eq!(declared_body_length(b"HTTP/1.1 200 OK"), None);
    }

    fn serve_once(response: &'static [u8], hold_open: bool) -> (u16, mpsc::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let port = listener.local_addr().expect("listener address").port();
        let (request_tx, request_rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut request = vec![0u8; 4096];
            let read = stream.read(&mut request).expect("read request");
            request.truncate(read);
            request_tx.send(request).expect("report request");

            stream.write_all(response).expect("write response");
            if hold_open {
                thread::sleep(Duration::from_millis(200));
            }
        });

        (port, request_rx)
    }

    #[test]
    fn exchange_reads_until_peer_closes_without_declared_length() {
        let (port, request_rx) = serve_once(b"HTTP/1.1 200 OK\r\n\r\n<html>index</html>", false);
        let transport = Transport::new(
            Ipv4Addr::LOCALHOST,
            port,
            Duration::from_secs(2),
            "RectTestServer".to_string(),
        );

        let (header, body) = transport
            .exchange("GET", "/", None)
            .expect("loopback exchange should succeed");
        assert_eq!(header, b"HTTP/1.1 200 OK");
        assert_eq!(body, b"<html>index</html>");

        let request = request_rx.recv().expect("server saw the request");
        assert!(request.starts_with(b"GET / HTTP/1.1\r\nHost: RectTestServer\r\n"));
    }

    #[test]
    fn exchange_stops_at_declared_length_while_connection_stays_open() {
        let (port, _request_rx) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\n{\"a\":1}",
            true,
        );
        let transport = Transport::new(
            Ipv4Addr::LOCALHOST,
            port,
            Duration::from_secs(2),
            "RectTestServer".to_string(),
        );

        let (_, body) = transport
            .exchange("GET", "/status", None)
            .expect("length-bounded exchange should return before close");
        assert_eq!(body, br#"{"a":1}"#);
    }

    #[test]
    fn connection_refused_surfaces_as_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let port = listener.local_addr().expect("listener address").port();
        drop(listener);

        let transport = Transport::new(
            Ipv4Addr::LOCALHOST,
            port,
            Duration::from_millis(500),
            "RectTestServer".to_string(),
        );
        let result = transport.exchange("GET", "/", None);
        assert!(matches!(result, Err(RectError::Connection { .. })));
    }
}

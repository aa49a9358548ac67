//! HTTP transport seam.
//!
//! `CameraClient` never talks to a global HTTP client. Every request goes
//! through an [`HttpTransport`] handed to it at construction, so tests can
//! script the service with an in-memory fake and production code uses
//! [`UreqTransport`].
//!
//! A transport distinguishes exactly two outcomes:
//! - a response arrived (any status, 2xx or not)
//! - no response arrived (`TransportError`)

use std::fmt;
use std::io::Read;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure to obtain any response from the service.
#[derive(Error, Debug)]
pub enum TransportError {
    /// DNS, refused connection, or socket failure before a response arrived.
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request error: {0}")]
    Request(String),
}

/// A response from the service. The body is read lazily; dropping the
/// response releases the underlying connection.
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<String>, body: Box<dyn Read + Send>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// True for any status below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    pub fn is_ok_200(&self) -> bool {
        self.status == 200
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    fn post(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent with bounded timeouts.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout(request_timeout)
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        convert(self.agent.get(url).call())
    }

    fn post(&self, url: &str) -> Result<HttpResponse, TransportError> {
        convert(self.agent.post(url).call())
    }
}

fn convert(result: Result<ureq::Response, ureq::Error>) -> Result<HttpResponse, TransportError> {
    match result {
        Ok(response) => Ok(into_http_response(response)),
        // ureq reports 4xx/5xx as errors; the client wants them as responses.
        Err(ureq::Error::Status(_, response)) => Ok(into_http_response(response)),
        Err(ureq::Error::Transport(transport)) => Err(classify(&transport)),
    }
}

fn into_http_response(response: ureq::Response) -> HttpResponse {
    let status = response.status();
    let content_type = response.header("Content-Type").map(str::to_string);
    HttpResponse::new(status, content_type, response.into_reader())
}

fn classify(transport: &ureq::Transport) -> TransportError {
    match transport.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Io => {
            TransportError::Connection(transport.to_string())
        }
        _ => TransportError::Request(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    fn empty_body() -> Box<dyn Read + Send> {
        Box::new(std::io::empty())
    }

    #[test]
    fn success_follows_status_below_400() {
        assert!(HttpResponse::new(200, None, empty_body()).is_success());
        assert!(HttpResponse::new(302, None, empty_body()).is_success());
        assert!(!HttpResponse::new(400, None, empty_body()).is_success());
        assert!(!HttpResponse::new(503, None, empty_body()).is_success());
    }

    #[test]
    fn only_200_counts_as_ok_200() {
        assert!(HttpResponse::new(200, None, empty_body()).is_ok_200());
        assert!(!HttpResponse::new(201, None, empty_body()).is_ok_200());
        assert!(!HttpResponse::new(204, None, empty_body()).is_ok_200());
    }

    #[test]
    fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let transport = UreqTransport::new(Duration::from_secs(2), Duration::from_secs(2));
        let err = transport
            .get(&format!("http://127.0.0.1:{}/available_webcams", port))
            .expect_err("nothing is listening");
        assert!(matches!(err, TransportError::Connection(_)), "{:?}", err);
    }

    #[test]
    fn error_status_is_returned_as_response() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).expect("read request") == 0 || line == "\r\n" {
                    break;
                }
            }
            let mut stream = stream;
            stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      Content-Type: text/plain\r\n\
                      Content-Length: 4\r\n\
                      Connection: close\r\n\r\noops",
                )
                .expect("write response");
        });

        let transport = UreqTransport::default();
        let mut response = transport
            .post(&format!("http://127.0.0.1:{}/start_video_recording/0", port))
            .expect("a response arrived");
        assert_eq!(response.status, 500);
        assert_eq!(response.content_type.as_deref(), Some("text/plain"));
        let mut body = String::new();
        response.body.read_to_string(&mut body).expect("body");
        assert_eq!(body, "oops");
        server.join().expect("server thread");
    }
}

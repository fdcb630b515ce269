use std::time::Duration;

use crate::error::Result;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; product-feed-exporter/",
    env!("CARGO_PKG_VERSION"),
    "; XML->CSV bot)"
);

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(90);

/// Downloads the whole feed body. Any transport failure or non-2xx status is an error.
pub fn fetch_xml(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let body = client
        .get(url)
        .send()?
        .error_for_status()?
        .bytes()?;

    tracing::info!(bytes = body.len(), "feed downloaded");
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves one canned response and reports the request headers it received.
    fn serve_once(status: &str, body: &'static str) -> (String, mpsc::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                headers.push(line.trim_end().to_string());
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            tx.send(headers).unwrap();
        });

        (format!("http://{addr}/feed.xml"), rx)
    }

    #[test]
    fn returns_body_and_sends_user_agent() {
        let (url, headers) = serve_once("200 OK", "<products/>");

        let body = fetch_xml(&url).unwrap();
        assert_eq!(body, b"<products/>");

        let headers = headers.recv().unwrap();
        assert!(headers[0].starts_with("GET /feed.xml"));
        assert!(
            headers
                .iter()
                .any(|h| h.to_ascii_lowercase().starts_with("user-agent: mozilla/5.0"))
        );
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (url, _headers) = serve_once("500 Internal Server Error", "boom");

        let err = fetch_xml(&url).unwrap_err();
        assert!(matches!(err, crate::error::Error::Transport(_)));
    }

    #[test]
    fn unreachable_host_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = fetch_xml(&format!("http://127.0.0.1:{port}/feed.xml")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Transport(_)));
    }
}

//! One-shot loopback listener for the OAuth redirect.
//!
//! The browser lands on `http://localhost:<port>/?code=...` after the user
//! grants access. A single listener task accepts connections until one
//! carries the `code` query parameter, answers it with a small HTML page,
//! and hands the code to the waiting flow through a oneshot channel. The
//! task exits after the handoff; it never touches the rest of the pipeline.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use super::AuthError;

const SUCCESS_PAGE: &str =
    "<html><body><h1>Authorization complete. You can close this window.</h1></body></html>";

/// Largest redirect request we bother reading; codes are short.
const MAX_REQUEST_BYTES: usize = 8192;

/// Waits for the browser redirect on `127.0.0.1:port` and returns the
/// captured authorization code.
///
/// # Errors
///
/// Returns [`AuthError::RedirectListener`] when the port cannot be bound
/// and [`AuthError::Timeout`] when no code arrives within `wait`.
pub async fn wait_for_code(port: u16, wait: Duration) -> Result<String, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    debug!(port, "redirect listener bound");
    wait_on_listener(listener, wait).await
}

async fn wait_on_listener(listener: TcpListener, wait: Duration) -> Result<String, AuthError> {
    let (tx, rx) = oneshot::channel();
    let accept_task = tokio::spawn(accept_until_code(listener, tx));

    let result = match timeout(wait, rx).await {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(_dropped)) => Err(AuthError::ListenerClosed),
        Err(_elapsed) => Err(AuthError::Timeout(wait.as_secs())),
    };

    accept_task.abort();
    result
}

/// Accepts connections until one carries a `code` parameter, then sends it
/// exactly once and returns.
async fn accept_until_code(listener: TcpListener, tx: oneshot::Sender<String>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(error) => {
                warn!(%error, "redirect listener accept failed");
                return;
            }
        };
        debug!(%peer, "redirect connection accepted");

        match handle_connection(stream).await {
            Ok(Some(code)) => {
                // Receiver gone means the wait already timed out.
                let _ = tx.send(code);
                return;
            }
            Ok(None) => debug!("redirect request without code parameter, waiting for next"),
            Err(error) => warn!(%error, "failed to serve redirect request"),
        }
    }
}

/// Reads one HTTP request, answers it with the success page, and extracts
/// the `code` query parameter if present.
async fn handle_connection(mut stream: TcpStream) -> std::io::Result<Option<String>> {
    let mut buffer = vec![0u8; MAX_REQUEST_BYTES];
    let read = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..read]);
    let code = extract_code(&request);

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        SUCCESS_PAGE.len(),
        SUCCESS_PAGE
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(code)
}

/// Pulls the `code` query parameter out of the request line of an HTTP GET.
fn extract_code(request: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let target = request_line.split_whitespace().nth(1)?;
    let parsed = Url::parse(&format!("http://localhost{target}")).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}

//! Localhost OAuth callback listener.
//!
//! Binds a random high port on 127.0.0.1, waits for the single provider
//! redirect, answers it with a small HTML page, and hands back the query
//! parameters. One-shot: the listener is done after the first request.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// How long to wait for the browser redirect before giving up.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

const SUCCESS_PAGE: &str = "<!DOCTYPE html>\n<html><head><title>Peep</title></head>\
<body><h1>Signed in</h1><p>You can close this window and return to the terminal.</p></body></html>";

const ERROR_PAGE: &str = "<!DOCTYPE html>\n<html><head><title>Peep</title></head>\
<body><h1>Sign-in failed</h1><p>You can close this window.</p></body></html>";

/// Result of a completed OAuth redirect.
#[derive(Debug, Clone)]
pub struct CallbackResult {
    pub code: String,
    pub state: Option<String>,
}

/// Waits for one OAuth redirect on `127.0.0.1:port`.
///
/// Returns when the provider redirects the browser back, the timeout
/// elapses, or `cancel` fires.
///
/// # Errors
/// Returns an error on bind failure, timeout, cancellation, or a redirect
/// carrying an `error` parameter instead of a code.
pub async fn wait_for_code(port: u16, cancel: &CancellationToken) -> Result<CallbackResult> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to bind callback listener on port {port}"))?;

    let deadline = tokio::time::sleep(CALLBACK_TIMEOUT);
    tokio::pin!(deadline);

    loop {
        let stream = tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Failed to accept callback connection")?;
                stream
            }
            () = cancel.cancelled() => bail!("Sign-in cancelled"),
            () = &mut deadline => bail!("Sign-in timed out waiting for the browser redirect"),
        };

        // Browsers may probe with favicon or preconnect requests; keep
        // listening until a request actually carries OAuth parameters.
        match handle_connection(stream).await {
            Ok(Some(result)) => return Ok(result),
            Ok(None) => {}
            Err(err) => return Err(err),
        }
    }
}

/// Reads one HTTP request and answers it. Returns the parsed OAuth
/// parameters when present, `None` for unrelated requests, and an error
/// when the provider reported one.
async fn handle_connection(mut stream: TcpStream) -> Result<Option<CallbackResult>> {
    let mut buf = vec![0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .context("Failed to read callback request")?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let Some(target) = request_target(&request) else {
        respond(&mut stream, 400, ERROR_PAGE).await;
        return Ok(None);
    };

    // Relative-form target; give Url a base to parse against.
    let url = url::Url::parse(&format!("http://localhost{target}"))
        .context("Failed to parse callback URL")?;

    if url.path() != super::oauth::LOCAL_CALLBACK_PATH {
        respond(&mut stream, 404, ERROR_PAGE).await;
        return Ok(None);
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        respond(&mut stream, 200, ERROR_PAGE).await;
        bail!("Sign-in was denied: {error}");
    }

    match code {
        Some(code) => {
            respond(&mut stream, 200, SUCCESS_PAGE).await;
            Ok(Some(CallbackResult {
                code,
                state,
            }))
        }
        None => {
            respond(&mut stream, 404, ERROR_PAGE).await;
            Ok(None)
        }
    }
}

/// Extracts the request target from the first request line.
fn request_target(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    if method != "GET" {
        return None;
    }
    parts.next()
}

/// Best-effort response; the browser window is cosmetic.
async fn respond(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Bad Request",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

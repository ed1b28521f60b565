/*
[INPUT]:  One OAuth redirect hitting a local loopback port
[OUTPUT]: The authorization code, or the provider's error, or a timeout
[POS]:    zkLogin layer - transient authorization-code capture server
[UPDATE]: When the redirect contract or confirmation pages change
*/

use std::process::Command;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use crate::http::{PorticoError, Result};

/// Callback path the redirect URI is registered under
pub const CALLBACK_PATH: &str = "/callback";

/// Default wait for the human to act in the browser
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h2>Login complete</h2>\
<p>You can close this tab and return to your terminal.</p></body></html>";

const DENIED_PAGE: &str = "<html><body><h2>Login failed</h2>\
<p>The authorization was not granted. You can close this tab.</p></body></html>";

enum CaptureOutcome {
    Code(String),
    Denied(String),
}

/// Wait for a single OAuth redirect on `127.0.0.1:<port>` and return its
/// authorization code.
///
/// The listener is single-use: the first terminal event (code, provider
/// error, or timeout) closes it, and no further callbacks are accepted.
/// Requests to other paths are dropped without resolving anything. A bind
/// failure is immediate and final: the redirect URI is pre-registered to
/// this exact port, so no alternate port is tried.
pub async fn wait_for_authorization_code(port: u16, timeout: Duration) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| PorticoError::PortBind(format!("127.0.0.1:{port}: {e}")))?;
    tracing::debug!(port, "waiting for OAuth redirect");

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        let stream = tokio::select! {
            _ = &mut deadline => {
                tracing::warn!(port, "no OAuth redirect arrived within the capture window");
                return Err(PorticoError::OAuthTimeout);
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, _peer)) => stream,
                Err(error) => {
                    tracing::debug!(%error, "accept failed; still listening");
                    continue;
                }
            },
        };

        match handle_connection(stream).await {
            Ok(Some(CaptureOutcome::Code(code))) => {
                tracing::info!("authorization code captured");
                return Ok(code);
            }
            Ok(Some(CaptureOutcome::Denied(error))) => {
                return Err(PorticoError::OAuth(error));
            }
            Ok(None) => continue,
            Err(error) => {
                tracing::debug!(%error, "dropped malformed callback connection");
                continue;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream) -> std::io::Result<Option<CaptureOutcome>> {
    let mut buffer = vec![0u8; 4096];
    let mut filled = 0;
    loop {
        let read = stream.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
        if buffer[..filled].windows(2).any(|window| window == b"\r\n") || filled == buffer.len() {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buffer[..filled]);
    let Some(target) = parse_request_target(&request) else {
        return Ok(None);
    };

    let Ok(url) = Url::parse(&format!("http://localhost{target}")) else {
        return Ok(None);
    };
    if url.path() != CALLBACK_PATH {
        return Ok(None);
    }

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(code) = code {
        respond(&mut stream, SUCCESS_PAGE).await?;
        return Ok(Some(CaptureOutcome::Code(code)));
    }
    if let Some(error) = error {
        respond(&mut stream, DENIED_PAGE).await?;
        return Ok(Some(CaptureOutcome::Denied(error)));
    }
    Ok(None)
}

fn parse_request_target(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    parts.next()
}

async fn respond(stream: &mut TcpStream, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Open the system default browser at `url`, fire-and-forget.
///
/// Failure never fails the login; the URL is also logged so the user can
/// navigate manually.
pub fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let launched = Command::new("open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let launched = Command::new("cmd").args(["/C", "start", "", url]).spawn();
    #[cfg(all(unix, not(target_os = "macos")))]
    let launched = Command::new("xdg-open").arg(url).spawn();

    if let Err(error) = launched {
        tracing::warn!(%error, "could not open system browser; navigate to the URL manually");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect_with_retry(port: u16) -> TcpStream {
        // the capture task may not have bound yet
        for _ in 0..50 {
            if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
                return stream;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("capture server never came up on port {port}");
    }

    async fn hit(port: u16, target: &str) -> String {
        let mut stream = connect_with_retry(port).await;
        stream
            .write_all(format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_resolves_with_authorization_code() {
        let port = 18431;
        let capture =
            tokio::spawn(wait_for_authorization_code(port, Duration::from_secs(5)));

        let response = hit(port, "/callback?code=ABC123&state=s1").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("Login complete"));

        let code = capture.await.unwrap().unwrap();
        assert_eq!(code, "ABC123");
    }

    #[tokio::test]
    async fn test_rejects_with_provider_error() {
        let port = 18432;
        let capture =
            tokio::spawn(wait_for_authorization_code(port, Duration::from_secs(5)));

        let response = hit(port, "/callback?error=access_denied").await;
        assert!(response.contains("Login failed"));

        let err = capture.await.unwrap().unwrap_err();
        match err {
            PorticoError::OAuth(message) => assert_eq!(message, "access_denied"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_times_out_without_callback() {
        let err = wait_for_authorization_code(18433, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, PorticoError::OAuthTimeout));
    }

    #[tokio::test]
    async fn test_unrelated_paths_do_not_resolve() {
        let port = 18434;
        let capture =
            tokio::spawn(wait_for_authorization_code(port, Duration::from_millis(500)));

        // favicon probes and the like are dropped without a response
        let mut stream = connect_with_retry(port).await;
        stream
            .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        drop(stream);

        let err = capture.await.unwrap().unwrap_err();
        assert!(matches!(err, PorticoError::OAuthTimeout));
    }

    #[tokio::test]
    async fn test_bind_conflict_is_immediate_and_final() {
        let port = 18435;
        let _holder = TcpListener::bind(("127.0.0.1", port)).await.unwrap();

        let err = wait_for_authorization_code(port, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            PorticoError::PortBind(message) => assert!(message.contains("18435")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

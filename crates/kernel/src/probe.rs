//! One-shot reachability probing used to pick service hosts at startup.

use std::time::Duration;

use tokio::net::TcpStream;

/// Timeout for a single probe connection.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Returns true when a TCP connection to `host:port` succeeds within `timeout`.
/// The connection is dropped immediately.
pub async fn is_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    let address = format!("{}:{}", host, port);
    match tokio::time::timeout(timeout, TcpStream::connect(&address)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(error)) => {
            tracing::debug!(%address, %error, "host unreachable");
            false
        }
        Err(_) => {
            tracing::debug!(%address, "probe timed out");
            false
        }
    }
}

/// Pick `primary` if it answers on `port`, otherwise `fallback`.
///
/// The fallback is returned without probing; a dead fallback surfaces later
/// as a connection error from the real client.
pub async fn resolve_host(primary: &str, fallback: &str, port: u16) -> String {
    resolve_host_with_timeout(primary, fallback, port, PROBE_TIMEOUT).await
}

pub async fn resolve_host_with_timeout(
    primary: &str,
    fallback: &str,
    port: u16,
    timeout: Duration,
) -> String {
    if is_reachable(primary, port, timeout).await {
        tracing::info!(host = primary, port, "using primary host");
        primary.to_string()
    } else {
        tracing::info!(
            primary,
            host = fallback,
            port,
            "primary host unreachable, using fallback"
        );
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn listening_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_reachable("127.0.0.1", port, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let port = closed_port().await;
        assert!(!is_reachable("127.0.0.1", port, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn resolve_prefers_primary_when_it_answers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let host = resolve_host("127.0.0.1", "fallback.invalid", port).await;
        assert_eq!(host, "127.0.0.1");
    }

    #[tokio::test]
    async fn resolve_falls_back_when_primary_is_down() {
        let port = closed_port().await;

        let host =
            resolve_host_with_timeout("127.0.0.1", "localhost", port, Duration::from_millis(200))
                .await;
        assert_eq!(host, "localhost");
    }
}

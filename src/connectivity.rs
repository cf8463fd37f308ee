use std::time::Duration;
use tokio::net::TcpStream;

/// Advisory reachability check: can we open a TCP connection to `host`
/// (`name:port`) within `timeout`? The workflow makes its own calls
/// regardless of the answer.
pub async fn is_online(host: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(host)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            log::warn!("Connectivity check to {} failed: {}", host, e);
            false
        }
        Err(_) => {
            log::warn!("Connectivity check to {} timed out after {:?}", host, timeout);
            false
        }
    }
}

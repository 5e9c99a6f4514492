//! Outbound interface address detection.

use std::net::IpAddr;
use tokio::net::UdpSocket;
use tokio_tungstenite::tungstenite::http::Uri;

/// Local address the OS would use to reach the host of `hub_url`.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub async fn outbound_ip(hub_url: &str) -> Option<IpAddr> {
    let uri: Uri = hub_url.parse().ok()?;
    let host = uri.host()?.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") => 443,
        _ => 80,
    });

    let bind = if host.contains(':') { "[::]:0" } else { "0.0.0.0:0" };
    let socket = UdpSocket::bind(bind).await.ok()?;
    socket.connect((host, port)).await.ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

//! Persistent datagram channel to the robot controller. One datagram
//! per accepted tick outbound; inbound datagrams are parsed as
//! measured-angle telemetry. Datagrams are fire-and-forget; delivery
//! is never assumed.

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, watch};

use crate::motion::JointAngles;
use crate::transport::{ChannelStatus, wire};

pub async fn run(
    address: String,
    mut angles_rx: mpsc::Receiver<JointAngles>,
    telemetry_tx: watch::Sender<Option<JointAngles>>,
    status_tx: watch::Sender<ChannelStatus>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let _ = status_tx.send(ChannelStatus::Connecting);

    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            tracing::error!("failed to bind robot link socket: {e}");
            let _ = status_tx.send(ChannelStatus::Closed);
            return;
        }
    };
    if let Err(e) = socket.connect(&address).await {
        tracing::error!("failed to connect robot link to {address}: {e}");
        let _ = status_tx.send(ChannelStatus::Closed);
        return;
    }

    tracing::info!("robot link open to {address}");
    let _ = status_tx.send(ChannelStatus::Open);

    let mut buf = [0u8; 256];
    loop {
        tokio::select! {
            maybe = angles_rx.recv() => {
                match maybe {
                    Some(angles) => {
                        let payload = wire::encode(&angles);
                        if let Err(e) = socket.send(payload.as_bytes()).await {
                            tracing::warn!("robot link send failed: {e}");
                        }
                    }
                    None => break,
                }
            }
            received = socket.recv(&mut buf) => {
                match received {
                    Ok(n) => {
                        let parsed = std::str::from_utf8(&buf[..n])
                            .ok()
                            .and_then(wire::parse);
                        if parsed.is_none() {
                            tracing::warn!("malformed telemetry frame ({n} bytes)");
                        }
                        let _ = telemetry_tx.send(parsed);
                    }
                    Err(e) => tracing::warn!("robot link receive failed: {e}"),
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    let _ = status_tx.send(ChannelStatus::Closing);
    tracing::info!("robot link to {address} closed");
    let _ = status_tx.send(ChannelStatus::Closed);
}

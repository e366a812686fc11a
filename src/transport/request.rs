//! Request-mode transport: one fire-and-forget HTTP GET per discrete
//! action, carrying the angles as named query parameters. The response
//! is ignored; a dead controller just means dropped updates.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};

use crate::motion::JointAngles;

pub async fn run(
    address: String,
    mut angles_rx: mpsc::Receiver<JointAngles>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!("request transport targeting http://{address}");
    loop {
        tokio::select! {
            maybe = angles_rx.recv() => {
                match maybe {
                    Some(angles) => {
                        tokio::spawn(fire(address.clone(), angles));
                    }
                    None => break,
                }
            }
            _ = shutdown.recv() => break,
        }
    }
    tracing::info!("request transport stopped");
}

async fn fire(address: String, angles: JointAngles) {
    let mut stream = match TcpStream::connect(&address).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!("robot request to {address} failed: {e}");
            return;
        }
    };
    let request = format!(
        "GET /set?theta1={}&theta2={}&theta3={} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        angles.theta1, angles.theta2, angles.theta3, address
    );
    if let Err(e) = stream.write_all(request.as_bytes()).await {
        tracing::debug!("robot request to {address} failed: {e}");
    }
}

use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;

/// Outcome of the single-instance handshake. The first process to bind the
/// loopback listener is the primary; later launches connect to it, hand over
/// their command line, and exit.
pub enum Instance {
    Primary(PrimaryInstance),
    Secondary(SecondaryInstance),
}

pub struct PrimaryInstance {
    listener: TcpListener,
}

pub struct SecondaryInstance {
    stream: TcpStream,
}

/// Connect to a running primary via the advertised port, or become the
/// primary ourselves. A stale port file from a dead process fails the
/// connect and is overwritten.
pub async fn acquire(port_file: PathBuf) -> std::io::Result<Instance> {
    if let Some(port) = read_port(&port_file) {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => {
                tracing::info!(port, "primary instance already running");
                return Ok(Instance::Secondary(SecondaryInstance { stream }));
            }
            Err(e) => {
                tracing::debug!(port, error = %e, "stale instance port, taking over");
            }
        }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    if let Some(parent) = port_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&port_file, port.to_string())?;
    tracing::info!(port, "registered as primary instance");
    Ok(Instance::Primary(PrimaryInstance { listener }))
}

fn read_port(port_file: &std::path::Path) -> Option<u16> {
    std::fs::read_to_string(port_file)
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl PrimaryInstance {
    /// Accept secondaries in the background and forward each line they send
    /// (one deep-link URI per line) into `tx`.
    pub fn listen(self, tx: UnboundedSender<String>) {
        tokio::spawn(async move {
            loop {
                let (stream, peer) = match self.listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "instance listener accept failed");
                        continue;
                    }
                };
                tracing::debug!(%peer, "secondary instance connected");
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stream).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if tx.send(line).is_err() {
                            return;
                        }
                    }
                });
            }
        });
    }
}

impl SecondaryInstance {
    /// Hand a deep-link URI to the primary.
    pub async fn forward(mut self, uri: &str) -> std::io::Result<()> {
        self.stream.write_all(uri.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await
    }
}

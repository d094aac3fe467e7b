//! The blacklist service: a line-oriented TCP server over a
//! [`BlacklistStore`].
//!
//! Each connection carries exactly one request. The server reads one line,
//! executes it, writes the response, and closes the connection; clients read
//! until the half-close.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use postbox_common::Signal;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::broadcast,
};
use tracing::{debug, error, info, warn};

use crate::{error::Result, protocol::Command, store::BlacklistStore};

/// Bound on how long a client may take to deliver its request line.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP server speaking the blacklist wire protocol.
pub struct BlacklistServer {
    listener: TcpListener,
    store: Arc<BlacklistStore>,
}

impl BlacklistServer {
    /// Bind the service to an address.
    ///
    /// # Errors
    /// Returns an error if the listener cannot be bound.
    pub async fn bind(address: &str, store: Arc<BlacklistStore>) -> Result<Self> {
        let listener = TcpListener::bind(address).await?;
        info!(address, "Blacklist service bound");
        Ok(Self { listener, store })
    }

    /// The bound address, useful when binding to port 0.
    ///
    /// # Errors
    /// Returns an error if the local address cannot be determined.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections until a shutdown signal arrives.
    ///
    /// # Errors
    /// Returns an error on a fatal accept failure.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) -> Result<()> {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let store = Arc::clone(&self.store);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &store).await {
                                    warn!(%peer, error = %e, "Error handling blacklist connection");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting blacklist connection");
                        }
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown | Signal::Finalised) => {
                            info!("Blacklist service shutting down");
                        }
                        Err(e) => {
                            error!(error = %e, "Blacklist shutdown channel error");
                        }
                    }
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Serve one connection: one request line, one response, close.
async fn handle_connection(stream: TcpStream, store: &BlacklistStore) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    let read = tokio::time::timeout(READ_TIMEOUT, reader.read_line(&mut line)).await;
    let response = match read {
        Ok(Ok(0)) | Err(_) => {
            // Empty request or a client that never finished its line.
            "400 Bad Request\n".to_string()
        }
        Ok(Ok(_)) => execute(&line, store),
        Ok(Err(e)) => return Err(e.into()),
    };

    write_half.write_all(response.as_bytes()).await?;
    write_half.flush().await?;
    // Dropping both halves closes the connection, which is the response
    // terminator the protocol relies on.
    Ok(())
}

fn execute(line: &str, store: &BlacklistStore) -> String {
    match Command::parse(line) {
        Some(Command::Check(url)) => {
            let verdict = store.check(&url);
            debug!(url, in_filter = verdict.in_filter, confirmed = verdict.confirmed, "Check");
            format!("200 OK\n{} {}\n", verdict.in_filter, verdict.confirmed)
        }
        Some(Command::Add(url)) => {
            let created = store.add(&url, None, None);
            debug!(url, created, "Add");
            "201 Created\n".to_string()
        }
        Some(Command::Remove(url)) => {
            if store.remove(&url) {
                debug!(url, "Removed");
                "204 No Content\n".to_string()
            } else {
                debug!(url, "Remove miss");
                "404 Not Found\n".to_string()
            }
        }
        None => {
            debug!(line = line.trim_end(), "Bad request");
            "400 Bad Request\n".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_maps_commands_to_response_lines() {
        let store = BlacklistStore::new(1024, 3);

        assert_eq!(execute("2 http://a.test\n", &store), "200 OK\nfalse false\n");
        assert_eq!(execute("1 http://a.test\n", &store), "201 Created\n");
        assert_eq!(execute("2 http://a.test\n", &store), "200 OK\ntrue true\n");
        assert_eq!(execute("DELETE http://a.test\n", &store), "204 No Content\n");
        assert_eq!(execute("DELETE http://a.test\n", &store), "404 Not Found\n");
        // Removed URLs stay in the filter but are no longer confirmed.
        assert_eq!(execute("2 http://a.test\n", &store), "200 OK\ntrue false\n");

        assert_eq!(execute("PATCH http://a.test\n", &store), "400 Bad Request\n");
        assert_eq!(execute("\n", &store), "400 Bad Request\n");
    }
}

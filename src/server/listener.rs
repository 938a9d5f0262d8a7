use std::{
    io::Result as IoResult,
    net::{IpAddr, SocketAddr, TcpListener},
    path::PathBuf,
};

use log::{debug, info};

use super::connection;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// The flat directory request targets are resolved in
    pub root: PathBuf,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Accepts connections one at a time, handling each to completion before the next
pub struct HTTPListener {
    listener: TcpListener,
    config: ListenerConfig,
}

impl HTTPListener {
    pub fn bind(ip: IpAddr, port: u16, config: ListenerConfig) -> IoResult<Self> {
        let listener = TcpListener::bind((ip, port))?;
        info!(target: "listener", "Bound to {0}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> IoResult<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until accepting a connection fails
    pub fn listen(&self) -> IoResult<()> {
        info!(
            target: "listener",
            "Serving files from {0}",
            self.config.root.display()
        );

        for stream in self.listener.incoming() {
            let mut stream = stream?;
            if let Ok(peer) = stream.peer_addr() {
                debug!(target: "listener", "Accepted connection from {peer}");
            }

            // Failures are reported to the client and logged by the handler.
            // Dropping the stream closes the connection.
            let _ = connection::handle_connection(&mut stream, &self.config.root);
        }
        Ok(())
    }
}

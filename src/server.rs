//! The TCP listener. Every accepted socket gets its own task running a
//! [`Connection`].

use crate::{connection::Connection, server_info::ServerInfo};
use anyhow::Context;
use socket2::SockRef;
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    select,
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// How long open connections get to finish once shutdown begins.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

pub struct Server {
    listener: TcpListener,
    info: Arc<ServerInfo>,
}

impl Server {
    /// Binds the listening socket. Failure here is fatal to startup.
    pub async fn bind(address: impl ToSocketAddrs, info: Arc<ServerInfo>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(address).await.context(
            "**** FAILED TO BIND TO PORT! Perhaps a server is already running on that port?",
        )?;
        Ok(Self { listener, info })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` is cancelled. Connections
    /// still open after [`SHUTDOWN_GRACE_PERIOD`] are aborted.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let mut connections = JoinSet::new();

        loop {
            let (stream, remote_address) = select! {
                _ = shutdown.cancelled() => break,
                Some(finished) = connections.join_next() => {
                    if let Err(e) = finished {
                        tracing::warn!("Connection task failed: {e}");
                    }
                    continue;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {e}");
                        continue;
                    }
                },
            };

            tracing::debug!("Accepted connection from {remote_address}");
            if let Err(e) = configure_socket(&stream) {
                tracing::warn!("Failed to configure socket for {remote_address}: {e}");
            }

            let connection = Connection::new(stream, remote_address, Arc::clone(&self.info));
            connections.spawn(
                connection
                    .run()
                    .instrument(tracing::debug_span!("connection", remote = %remote_address)),
            );
        }

        tracing::info!("Stopping server");
        let drained = tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::info!("Closing {} open connections", connections.len());
            connections.shutdown().await;
        }
        Ok(())
    }
}

fn configure_socket(stream: &TcpStream) -> io::Result<()> {
    stream.set_nodelay(true)?;
    SockRef::from(stream).set_keepalive(true)
}

//! Per-connection protocol state machine.
//!
//! A connection starts in [`Phase::Handshake`]. The handshake moves it to
//! Status, where status requests and pings are answered until the client
//! hangs up, or to Login, where it is kicked straight away.

use crate::{
    protocol::{
        packet::{client, server},
        DecodeError, Encode, Frame, PacketCodec, Phase,
    },
    server_info::{ServerInfo, TextComponent},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_BUFFER_SIZE: usize = 512;

/// State of one client connection. Owned by the task driving it.
pub struct Connection<S> {
    stream: S,
    codec: PacketCodec,
    phase: Phase,
    /// Whether the transport is still usable. Cleared when the peer hangs
    /// up, a write fails, or we close the connection.
    active: bool,
    closed: bool,
    /// Set when a status reply was sent right after the handshake and the
    /// client's own status request has not arrived yet.
    eager_status_pending: bool,
    remote_address: SocketAddr,
    info: Arc<ServerInfo>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, remote_address: SocketAddr, info: Arc<ServerInfo>) -> Self {
        Self {
            stream,
            codec: PacketCodec::new(),
            phase: Phase::Handshake,
            active: true,
            closed: false,
            eager_status_pending: false,
            remote_address,
            info,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Serves the connection until either side closes it.
    ///
    /// Errors are logged here and never propagate: one misbehaving
    /// client cannot affect any other.
    pub async fn run(mut self) {
        if let Err(e) = self.run_inner().await {
            tracing::warn!(
                "An exception occurred while handling the packets for {}: {e:#}",
                self.remote_address
            );
        }
        self.close().await;
    }

    async fn run_inner(&mut self) -> anyhow::Result<()> {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        while self.active {
            match self.codec.next_frame() {
                Ok(Some(frame)) => {
                    self.process(frame).await;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    self.protocol_violation(e).await;
                    break;
                }
            }

            let bytes_read = self.stream.read(&mut buffer).await?;
            if bytes_read == 0 {
                tracing::debug!("{} closed the connection", self.remote_address);
                self.active = false;
                break;
            }
            self.codec.give_data(&buffer[..bytes_read]);
        }
        Ok(())
    }

    /// Routes one frame by the current phase.
    ///
    /// Decode failures end the connection via [`Self::disconnect`].
    pub async fn process(&mut self, frame: Frame) {
        let result = match self.phase {
            Phase::Handshake => self.handle_handshake(&frame).await,
            Phase::Status => self.handle_status(&frame).await,
            Phase::Login => {
                self.reject_login().await;
                Ok(())
            }
            Phase::Play => {
                tracing::debug!("Ignoring packet {:#04x} in Play phase", frame.id());
                Ok(())
            }
        };

        if let Err(e) = result {
            self.protocol_violation(e).await;
        }
    }

    async fn protocol_violation(&mut self, error: DecodeError) {
        tracing::warn!(
            "Protocol violation from {} in {} phase: {error}",
            self.remote_address,
            self.phase.as_ref()
        );
        self.disconnect(&error.to_string()).await;
    }

    async fn handle_handshake(&mut self, frame: &Frame) -> Result<(), DecodeError> {
        let handshake: client::handshake::Handshake = frame.decode_body()?;
        tracing::debug!(
            protocol_version = handshake.protocol_version,
            server_address = %handshake.server_address,
            server_port = handshake.server_port,
            next_state = handshake.next_state,
            "Received handshake"
        );

        let next_phase = handshake.next_phase()?;
        match next_phase {
            Phase::Status => {
                self.enter(next_phase);
                self.send_status().await;
                self.eager_status_pending = true;
            }
            Phase::Login => {
                self.enter(next_phase);
                self.reject_login().await;
            }
            Phase::Handshake | Phase::Play => {
                return Err(DecodeError::UnreachablePhase(next_phase));
            }
        }
        Ok(())
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase, "phase must never regress");
        tracing::debug!("Transition to {} phase", phase.as_ref());
        self.phase = phase;
    }

    async fn handle_status(&mut self, frame: &Frame) -> Result<(), DecodeError> {
        match frame.decode_packet::<client::status::Packet>() {
            Ok(client::status::Packet::StatusRequest(_)) => {
                if std::mem::take(&mut self.eager_status_pending) {
                    tracing::debug!("Status request already answered after handshake");
                } else {
                    self.send_status().await;
                }
            }
            Ok(client::status::Packet::PingRequest(ping)) => {
                self.eager_status_pending = false;
                self.send_packet(server::status::Packet::from(
                    server::status::PingResponse {
                        payload: ping.payload,
                    },
                ))
                .await;
            }
            Err(DecodeError::UnknownPacketId(id)) => {
                tracing::debug!("Ignoring unknown status packet {id:#04x}");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn send_status(&mut self) {
        let json = self.info.status_json().to_owned();
        self.send_packet(server::status::Packet::from(
            server::status::StatusResponse { json },
        ))
        .await;
    }

    /// Kicks the client with the configured kick message. This server
    /// never lets anyone log in.
    async fn reject_login(&mut self) {
        let info = Arc::clone(&self.info);
        self.disconnect(info.kick_message()).await;
    }

    /// Whether a Disconnect packet can be sent before closing.
    ///
    /// Only Login and Play have a Disconnect packet, and only a live
    /// transport can carry it.
    fn can_send_disconnect(&self) -> bool {
        self.active && matches!(self.phase, Phase::Login | Phase::Play)
    }

    /// Closes the connection, sending `reason` first if the current phase
    /// allows it.
    pub async fn disconnect(&mut self, reason: &str) {
        if self.can_send_disconnect() {
            match TextComponent::new(reason).to_json() {
                Ok(reason) => {
                    self.send_packet(server::login::Packet::from(server::login::Disconnect {
                        reason,
                    }))
                    .await;
                }
                Err(e) => tracing::warn!("Failed to serialize kick message: {e}"),
            }
        }
        self.close().await;
    }

    /// Writes one packet as a single frame. Failures are logged and mark
    /// the connection inactive; nothing is retried.
    async fn send_packet<P>(&mut self, packet: P)
    where
        P: Encode + AsRef<str>,
    {
        let result = match self.codec.encode_packet(&packet) {
            Ok(bytes) => write_frame(&mut self.stream, &bytes).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::trace!("Sent {}", packet.as_ref()),
            Err(e) => {
                tracing::warn!(
                    "An exception occurred while sending {} to {}: {e}",
                    packet.as_ref(),
                    self.remote_address
                );
                self.active = false;
            }
        }
    }

    async fn close(&mut self) {
        self.active = false;
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("Failed to shut down {}: {e}", self.remote_address);
        }
    }
}

async fn write_frame<S>(stream: &mut S, bytes: &[u8]) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(())
}

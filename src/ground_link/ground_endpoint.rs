use super::ground_messages;
use crate::{error, info, warn};
use prost::Message;
use std::io::{Cursor, ErrorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{ReadHalf, WriteHalf};
use tokio::sync::{broadcast, oneshot};

#[derive(Debug, Clone)]
pub enum GroundEvent {
    Connected,
    Disconnected,
    Message(ground_messages::UpstreamContent),
    /// A frame arrived that is not a valid upstream message.
    Malformed,
}

/// TCP server for the ground station, frames are a big-endian `u32` length followed
/// by one protobuf message.
pub(crate) struct GroundEndpoint {
    downstream_sender: broadcast::Sender<Option<Vec<u8>>>,
    upstream_event_receiver: broadcast::Receiver<GroundEvent>,
    close_oneshot_sender: Option<oneshot::Sender<()>>,
}

impl GroundEndpoint {
    /// Larger frames are treated as a broken stream.
    const MAX_FRAME_LEN: u32 = 64 * 1024;

    async fn handle_connection_rx(
        socket: &mut ReadHalf<'_>,
        upstream_event_sender: &broadcast::Sender<GroundEvent>,
    ) -> Result<(), std::io::Error> {
        loop {
            let length = socket.read_u32().await?;
            if length > Self::MAX_FRAME_LEN {
                return Err(std::io::Error::new(ErrorKind::InvalidData, format!("frame of {length} bytes")));
            }

            let mut buffer = vec![0u8; length as usize];
            socket.read_exact(&mut buffer).await?;

            let event = match ground_messages::Upstream::decode(&mut Cursor::new(buffer)) {
                Ok(ground_messages::Upstream { content: Some(content) }) => GroundEvent::Message(content),
                _ => GroundEvent::Malformed,
            };
            let _ = upstream_event_sender.send(event);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn handle_connection_tx(
        socket: &mut WriteHalf<'_>,
        downstream_receiver: &mut broadcast::Receiver<Option<Vec<u8>>>,
    ) -> Result<(), std::io::Error> {
        loop {
            match downstream_receiver.recv().await {
                Ok(Some(message_buffer)) => {
                    socket.write_u32(message_buffer.len() as u32).await?;
                    socket.write_all(&message_buffer).await?;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Ground link dropped {n} downstream frames");
                }
                Ok(None) | Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    pub(crate) fn start(addr: String) -> Self {
        let downstream_sender = broadcast::Sender::new(64);
        let upstream_event_sender = broadcast::Sender::new(16);
        let (close_oneshot_sender, mut close_oneshot_receiver) = oneshot::channel();
        let inst = Self {
            downstream_sender: downstream_sender.clone(),
            upstream_event_receiver: upstream_event_sender.subscribe(),
            close_oneshot_sender: Some(close_oneshot_sender),
        };

        tokio::spawn(async move {
            let listener = match TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Ground link could not bind {addr}: {e}");
                    return;
                }
            };
            info!("Ground link listening on {addr}");
            loop {
                let accept = tokio::select! {
                    accept = listener.accept() => accept,
                    _ = &mut close_oneshot_receiver => break
                };

                let (mut socket, peer) = match accept {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Ground link accept failed: {e}");
                        continue;
                    }
                };
                info!("Ground station connected from {peer}");
                let _ = upstream_event_sender.send(GroundEvent::Connected);
                let upstream_event_sender_local = upstream_event_sender.clone();
                let mut downstream_receiver = downstream_sender.subscribe();

                tokio::spawn(async move {
                    let (mut rx_socket, mut tx_socket) = socket.split();

                    let result = tokio::select! {
                        res = GroundEndpoint::handle_connection_tx(&mut tx_socket, &mut downstream_receiver) => res,
                        res = GroundEndpoint::handle_connection_rx(&mut rx_socket, &upstream_event_sender_local) => res
                    };

                    let _ = upstream_event_sender_local.send(GroundEvent::Disconnected);
                    match result {
                        Err(e)
                            if e.kind() == ErrorKind::UnexpectedEof
                                || e.kind() == ErrorKind::ConnectionReset
                                || e.kind() == ErrorKind::ConnectionAborted =>
                        {
                            return;
                        }
                        Err(e) => {
                            warn!("Closing connection to ground station due to {e:?}");
                        }
                        Ok(()) => {}
                    }
                    let _ = socket.shutdown().await;
                });
            }
        });
        inst
    }

    pub(crate) fn send_downstream(&self, msg: ground_messages::DownstreamContent) {
        let _ = self.downstream_sender.send(Some(
            ground_messages::Downstream { content: Some(msg) }.encode_to_vec(),
        ));
    }

    pub(crate) fn is_ground_connected(&self) -> bool { self.downstream_sender.receiver_count() > 0 }

    pub(crate) fn upstream_event_receiver(&self) -> &broadcast::Receiver<GroundEvent> {
        &self.upstream_event_receiver
    }
}

impl Drop for GroundEndpoint {
    fn drop(&mut self) {
        if let Some(sender) = self.close_oneshot_sender.take() {
            let _ = sender.send(());
        }
        let _ = self.downstream_sender.send(None);
    }
}

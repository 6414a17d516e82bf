use super::ground_endpoint::{GroundEndpoint, GroundEvent};
use super::ground_messages;
use crate::flight_control::{CommandError, FlightCommand, TelemetrySnapshot};
use crate::safety::FaultRecord;
use crate::{event, info, warn};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Bridges the ground station protocol and the flight core.
///
/// Upstream commands are queued for AutoFlight without waiting, downstream telemetry
/// and fault reports are only encoded while a station is connected.
pub(crate) struct GroundMessenger {
    endpoint: Arc<GroundEndpoint>,
}

impl GroundMessenger {
    pub(crate) fn start(
        addr: String,
        commands: mpsc::Sender<FlightCommand>,
        telemetry: broadcast::Receiver<TelemetrySnapshot>,
        faults: broadcast::Receiver<FaultRecord>,
    ) -> Self {
        let endpoint = Arc::new(GroundEndpoint::start(addr));

        let mut receiver = endpoint.upstream_event_receiver().resubscribe();
        let endpoint_local = Arc::clone(&endpoint);
        tokio::spawn(async move {
            loop {
                let event = match receiver.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Ground link skipped {n} upstream events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                match event {
                    GroundEvent::Connected => info!("Ground station attached"),
                    GroundEvent::Disconnected => info!("Ground station detached"),
                    GroundEvent::Malformed => {
                        Self::reject(&endpoint_local, "unknown", &CommandError::Empty);
                    }
                    GroundEvent::Message(ground_messages::UpstreamContent::Ping(ping)) => {
                        endpoint_local.send_downstream(ground_messages::DownstreamContent::Pong(
                            ground_messages::Pong { echo: ping.echo },
                        ));
                    }
                    GroundEvent::Message(content) => {
                        let name = content.name();
                        match FlightCommand::try_from(content) {
                            Ok(command) => {
                                event!("Ground command {name}");
                                if commands.try_send(command).is_err() {
                                    warn!("Command queue full, dropping {name}");
                                    endpoint_local.send_downstream(
                                        ground_messages::DownstreamContent::CommandRejected(
                                            ground_messages::CommandRejected {
                                                command: name.to_string(),
                                                reason: "command queue full".to_string(),
                                            },
                                        ),
                                    );
                                }
                            }
                            Err(e) => Self::reject(&endpoint_local, name, &e),
                        }
                    }
                }
            }
        });

        let endpoint_local = Arc::clone(&endpoint);
        tokio::spawn(Self::forward_telemetry(endpoint_local, telemetry));
        let endpoint_local = Arc::clone(&endpoint);
        tokio::spawn(Self::forward_faults(endpoint_local, faults));

        Self { endpoint }
    }

    fn reject(endpoint: &GroundEndpoint, command: &str, reason: &CommandError) {
        warn!("Rejected ground command {command}: {reason}");
        endpoint.send_downstream(ground_messages::DownstreamContent::CommandRejected(
            ground_messages::CommandRejected { command: command.to_string(), reason: reason.to_string() },
        ));
    }

    async fn forward_telemetry(
        endpoint: Arc<GroundEndpoint>,
        mut telemetry: broadcast::Receiver<TelemetrySnapshot>,
    ) {
        loop {
            match telemetry.recv().await {
                Ok(snapshot) => {
                    if endpoint.is_ground_connected() {
                        endpoint.send_downstream(ground_messages::DownstreamContent::Telemetry(
                            ground_messages::Telemetry::from(&snapshot),
                        ));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn forward_faults(endpoint: Arc<GroundEndpoint>, mut faults: broadcast::Receiver<FaultRecord>) {
        loop {
            match faults.recv().await {
                Ok(record) => {
                    if endpoint.is_ground_connected() {
                        endpoint.send_downstream(ground_messages::DownstreamContent::FaultReport(
                            ground_messages::FaultReport::from(&record),
                        ));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Ground link missed {n} fault reports");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    pub(crate) fn is_connected(&self) -> bool { self.endpoint.is_ground_connected() }
}

//! Ground station link: a length-prefixed protobuf stream over TCP that carries
//! operator commands up and telemetry and fault reports down.

mod ground_endpoint;
mod ground_messages;
mod ground_messenger;

pub(crate) use ground_messenger::GroundMessenger;

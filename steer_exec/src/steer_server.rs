//! # Steering Server
//!
//! Publishes the normalised steering commands produced by the controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::steer::NormalisedSteerCmd,
    net::{encode_topic_msg, zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions,
        TopicMsgError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Steering command publisher
pub struct SteerServer {
    socket: MonitoredSocket,

    topic: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SteerServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the steering command: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the steering command: {0}")]
    SerializationError(TopicMsgError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SteerServer {
    /// Create a new instance of the steering server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SteerServerError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            send_hwm: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.steer_endpoint
        ).map_err(SteerServerError::SocketError)?;

        Ok(Self {
            socket,
            topic: params.steer_topic.clone(),
        })
    }

    /// Publish a command.
    ///
    /// Commands sent while nobody is subscribed are dropped by the socket.
    pub fn send(&mut self, cmd: &NormalisedSteerCmd) -> Result<(), SteerServerError> {
        let msg = encode_topic_msg(&self.topic, cmd)
            .map_err(SteerServerError::SerializationError)?;

        self.socket.send(&msg, 0)
            .map_err(SteerServerError::SendError)
    }

    /// True if the server socket is bound.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bound_server_is_connected() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            pose_endpoint: "inproc://pose".into(),
            target_endpoint: "inproc://target".into(),
            steer_endpoint: "inproc://steer_server_test".into(),
            pose_topic: "car_pos".into(),
            target_topic: "target".into(),
            steer_topic: "steering_normalized".into(),
        };

        let mut server = SteerServer::new(&ctx, &params).unwrap();
        assert!(server.is_connected());

        // Nobody is subscribed, the command is dropped rather than failing
        server.send(&NormalisedSteerCmd::new(0.25)).unwrap();
    }
}

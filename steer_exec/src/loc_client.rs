//! # Localisation Client
//!
//! Subscribes to the vehicle pose and to the desired heading, feeding both into the shared
//! steering controller as they arrive. Each subscription is conflated, so only the newest
//! message is ever waiting to be handled.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    eqpt::{loc::PoseMsg, steer::SteerTarget},
    net::{
        decode_topic_msg, zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions,
        TopicMsgError,
    },
};
use log::{error, info, warn};

use crate::{
    loc::Pose,
    steer_ctrl::{SharedSteerCtrl, SteerCtrl},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time the background thread waits for a message before checking whether it should stop.
const POLL_TIMEOUT_MS: i64 = 50;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Localisation and target client.
///
/// Dropping the client stops its background thread.
pub struct LocClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LocClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to {0}: {1}")]
    SubscribeError(String, zmq::Error),

    #[error("Could not recieve a message from the publisher: {0}")]
    RecvError(zmq::Error),

    #[error("The publisher sent a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Could not decode the message: {0}")]
    DecodeError(TopicMsgError),

    #[error("The steering controller mutex is poisoned")]
    CtrlPoisoned,
}

/// The two inputs the client listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocInput {
    Pose,
    Target,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocClient {
    /// Connect to the pose and target publishers and start handling their messages.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        ctrl: SharedSteerCtrl,
    ) -> Result<Self, LocClientError> {
        let pose_socket = subscriber(ctx, &params.pose_endpoint, &params.pose_topic)?;
        let target_socket = subscriber(ctx, &params.target_endpoint, &params.target_topic)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();
        let pose_topic = params.pose_topic.clone();
        let target_topic = params.target_topic.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(
                [(pose_socket, pose_topic), (target_socket, target_topic)],
                bg_run_clone,
                ctrl,
            )
        }));

        Ok(Self { bg_jh, bg_run })
    }
}

impl Drop for LocClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("LocClient background thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a raw message from one of the inputs and apply it to the controller.
///
/// The controller lock is held only while the decoded value is stored.
pub fn handle_msg(
    ctrl: &Mutex<SteerCtrl>,
    input: LocInput,
    topic: &str,
    raw: &str,
) -> Result<(), LocClientError> {
    match input {
        LocInput::Pose => {
            let msg: PoseMsg = decode_topic_msg(topic, raw).map_err(LocClientError::DecodeError)?;
            let pose = Pose::from(&msg);

            ctrl.lock()
                .map_err(|_| LocClientError::CtrlPoisoned)?
                .update_current_pose(&pose);
        }
        LocInput::Target => {
            let msg: SteerTarget =
                decode_topic_msg(topic, raw).map_err(LocClientError::DecodeError)?;

            ctrl.lock()
                .map_err(|_| LocClientError::CtrlPoisoned)?
                .update_desired_angle(msg.value);
        }
    }

    Ok(())
}

/// Create a conflated subscriber socket for the given topic.
fn subscriber(
    ctx: &zmq::Context,
    endpoint: &str,
    topic: &str,
) -> Result<MonitoredSocket, LocClientError> {
    let socket_options = SocketOptions {
        block_on_first_connect: false,
        conflate: true,
        recv_hwm: 1,
        linger: 1,
        heartbeat_ivl: 500,
        heartbeat_ttl: 1000,
        heartbeat_timeout: 1000,
        ..Default::default()
    };

    let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)
        .map_err(LocClientError::SocketError)?;

    socket
        .set_subscribe(topic.as_bytes())
        .map_err(|e| LocClientError::SubscribeError(topic.into(), e))?;

    info!("Subscribed to {:?} on {}", topic, endpoint);

    Ok(socket)
}

/// Receive a string from a socket without blocking, `Ok(None)` if nothing is waiting.
fn try_recv(socket: &MonitoredSocket) -> Result<Option<String>, LocClientError> {
    match socket.recv_string(zmq::DONTWAIT) {
        Ok(Ok(s)) => Ok(Some(s)),
        Ok(Err(_)) => Err(LocClientError::NonUtf8Message),
        Err(zmq::Error::EAGAIN) => Ok(None),
        Err(e) => Err(LocClientError::RecvError(e)),
    }
}

/// Background thread, applies each new message to the controller.
fn bg_thread(
    sockets: [(MonitoredSocket, String); 2],
    run: Arc<AtomicBool>,
    ctrl: SharedSteerCtrl,
) {
    let inputs = [LocInput::Pose, LocInput::Target];

    while run.load(Ordering::Relaxed) {
        let readable = {
            let mut items = [
                sockets[0].0.as_poll_item(zmq::POLLIN),
                sockets[1].0.as_poll_item(zmq::POLLIN),
            ];

            match zmq::poll(&mut items, POLL_TIMEOUT_MS) {
                Ok(_) => [items[0].is_readable(), items[1].is_readable()],
                Err(e) => {
                    error!("Error polling the LocClient sockets: {}", e);
                    break;
                }
            }
        };

        for (i, (socket, topic)) in sockets.iter().enumerate() {
            if !readable[i] {
                continue;
            }

            let raw = match try_recv(socket) {
                Ok(Some(s)) => s,
                Ok(None) => continue,
                Err(e) => {
                    warn!("LocClient {:?} receive error: {}", inputs[i], e);
                    continue;
                }
            };

            match handle_msg(&ctrl, inputs[i], topic, &raw) {
                Ok(()) => (),
                Err(LocClientError::CtrlPoisoned) => {
                    error!("Steering controller lock poisoned, stopping LocClient");
                    return;
                }
                Err(e) => warn!("Could not handle {:?} message: {}", inputs[i], e),
            }
        }
    }
}

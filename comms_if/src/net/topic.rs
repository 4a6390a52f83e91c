//! # Topic framing
//!
//! Messages on publish/subscribe sockets are sent as `"<topic> <json>"`, so subscribers can
//! filter on the topic prefix with `set_subscribe`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de::DeserializeOwned, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum TopicMsgError {
    #[error("Topic names cannot be empty or contain whitespace, got {0:?}")]
    InvalidTopic(String),

    #[error("Message has no topic separator")]
    MissingSeparator,

    #[error("Expected topic {expected:?} but the message has topic {found:?}")]
    TopicMismatch {
        expected: String,
        found: String
    },

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message: {0}")]
    DeserializeError(serde_json::Error)
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Encode a message for publishing on the given topic.
pub fn encode_topic_msg<T: Serialize>(topic: &str, msg: &T) -> Result<String, TopicMsgError> {
    if topic.is_empty() || topic.contains(char::is_whitespace) {
        return Err(TopicMsgError::InvalidTopic(topic.into()));
    }

    let body = serde_json::to_string(msg).map_err(TopicMsgError::SerializationError)?;

    Ok(format!("{} {}", topic, body))
}

/// Split a framed message into its topic and body.
pub fn split_topic_msg(raw: &str) -> Result<(&str, &str), TopicMsgError> {
    let mut parts = raw.splitn(2, ' ');

    match (parts.next(), parts.next()) {
        (Some(topic), Some(body)) => Ok((topic, body)),
        _ => Err(TopicMsgError::MissingSeparator)
    }
}

/// Decode a framed message, checking it was sent on the expected topic.
///
/// ZMQ subscriptions are prefix matches, so `"target"` would also let through `"target_raw"`.
/// The exact topic is checked here.
pub fn decode_topic_msg<T: DeserializeOwned>(
    expected_topic: &str,
    raw: &str
) -> Result<T, TopicMsgError> {
    let (topic, body) = split_topic_msg(raw)?;

    if topic != expected_topic {
        return Err(TopicMsgError::TopicMismatch {
            expected: expected_topic.into(),
            found: topic.into()
        });
    }

    serde_json::from_str(body).map_err(TopicMsgError::DeserializeError)
}

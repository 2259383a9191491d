use thiserror::Error;

use super::NodeId;

#[derive(Error, Debug)]
pub enum ElectionError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not live")]
    NotLive(NodeId),

    #[error("Node {0} is already live")]
    AlreadyLive(NodeId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

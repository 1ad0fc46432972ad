//! Error types for tree operations

use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} does not hold character data")]
    NotCharacterData(NodeId),

    #[error("Cannot insert {child} into {parent}: would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}

pub type DomResult<T> = Result<T, DomError>;

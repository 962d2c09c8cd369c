use crate::id::NodeId;
use crate::ports::PortSide;
use thiserror::Error;

/// Errors raised when mutating the canvas graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node '{0}' is not on the canvas")]
    UnknownNode(NodeId),

    #[error("node '{0}' is already on the canvas")]
    DuplicateNode(NodeId),

    #[error("active result index {index} is out of range for {len} results")]
    ActiveResultOutOfRange { index: usize, len: usize },

    #[error("pinned result index {index} is out of range for {len} results")]
    PinnedResultOutOfRange { index: usize, len: usize },

    #[error("result history may only grow ({old} -> {new} entries)")]
    ResultsTruncated { old: usize, new: usize },

    #[error("result {index} is already recorded and cannot be rewritten")]
    ResultRewritten { index: usize },

    #[error("field id '{0}' appears more than once on the card")]
    DuplicateField(String),
}

/// Reasons a two-click link gesture is rejected. The graph is left
/// untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("a card cannot be linked to itself")]
    SameNode,

    #[error("both ends are {0} ports; links always run from an output to an input")]
    SamePolarity(PortSide),

    #[error("port type mismatch: [{from_label}] can only connect to [{from_label}], not [{to_label}]")]
    LabelMismatch { from_label: String, to_label: String },

    #[error("node '{node}' has no {side} port #{index}")]
    PortOutOfRange {
        node: NodeId,
        side: PortSide,
        index: usize,
    },

    #[error("node '{0}' is not on the canvas")]
    UnknownNode(NodeId),
}

//! Directed port-to-port links between cards.

use crate::error::LinkError;
use crate::id::{ConnectionId, NodeId};
use crate::ports::{PortSide, Ports, labels_compatible};
use serde::{Deserialize, Serialize};

/// One clickable port: a card, a side and a position on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub node: NodeId,
    pub side: PortSide,
    pub index: usize,
}

impl PortRef {
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            side: PortSide::In,
            index,
        }
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            side: PortSide::Out,
            index,
        }
    }
}

/// A directed edge from an output port to an input port.
///
/// Labels are copied when the link is made and are not re-validated if
/// either card's kind changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    #[serde(rename = "fromId")]
    pub from: NodeId,
    #[serde(rename = "fromPortIndex")]
    pub from_port: usize,
    #[serde(rename = "fromPortLabel")]
    pub from_label: String,
    #[serde(rename = "toId")]
    pub to: NodeId,
    #[serde(rename = "toPortIndex")]
    pub to_port: usize,
    #[serde(rename = "toPortLabel")]
    pub to_label: String,
}

impl Connection {
    /// The `(from, from_port, to, to_port)` key used for duplicate detection.
    pub fn key(&self) -> LinkKey {
        LinkKey {
            from: self.from,
            from_port: self.from_port,
            to: self.to,
            to_port: self.to_port,
        }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

/// Exact directed identity of a link. `A→B` and `B→A` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub from: NodeId,
    pub from_port: usize,
    pub to: NodeId,
    pub to_port: usize,
}

/// A link request that passed validation, oriented output → input,
/// with both labels resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLink {
    pub key: LinkKey,
    pub from_label: &'static str,
    pub to_label: &'static str,
}

impl ValidatedLink {
    pub fn into_connection(self, id: ConnectionId) -> Connection {
        Connection {
            id,
            from: self.key.from,
            from_port: self.key.from_port,
            from_label: self.from_label.to_string(),
            to: self.key.to,
            to_port: self.key.to_port,
            to_label: self.to_label.to_string(),
        }
    }
}

/// Validate a two-click link gesture. Click order does not matter: the
/// output end always becomes `from`. `ports_of` resolves a card's ports,
/// or `None` when the card is not on the canvas.
pub fn validate_link(
    first: PortRef,
    second: PortRef,
    ports_of: impl Fn(NodeId) -> Option<Ports>,
) -> Result<ValidatedLink, LinkError> {
    if first.node == second.node {
        return Err(LinkError::SameNode);
    }
    if first.side == second.side {
        return Err(LinkError::SamePolarity(first.side));
    }
    let (out, inp) = match first.side {
        PortSide::Out => (first, second),
        PortSide::In => (second, first),
    };

    let resolve = |port: PortRef| -> Result<&'static str, LinkError> {
        let ports = ports_of(port.node).ok_or(LinkError::UnknownNode(port.node))?;
        ports
            .label(port.side, port.index)
            .ok_or(LinkError::PortOutOfRange {
                node: port.node,
                side: port.side,
                index: port.index,
            })
    };
    let from_label = resolve(out)?;
    let to_label = resolve(inp)?;

    if !labels_compatible(from_label, to_label) {
        return Err(LinkError::LabelMismatch {
            from_label: from_label.to_string(),
            to_label: to_label.to_string(),
        });
    }

    Ok(ValidatedLink {
        key: LinkKey {
            from: out.node,
            from_port: out.index,
            to: inp.node,
            to_port: inp.index,
        },
        from_label,
        to_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::ports::{DRIVING_QUESTION, GENERIC_OUTPUT, resolve_ports};
    use pretty_assertions::assert_eq;

    fn lookup(id: NodeId) -> Option<Ports> {
        match id.as_str() {
            "src" => Some(resolve_ports(NodeKind::CurriculumSource, false, true)),
            "dq" | "dq2" => Some(resolve_ports(NodeKind::DrivingQuestion, true, true)),
            "any" => Some(resolve_ports(NodeKind::Generic, true, true)),
            _ => None,
        }
    }

    #[test]
    fn orientation_follows_polarity_not_click_order() {
        let src = NodeId::intern("src");
        let dq = NodeId::intern("dq");
        let link = validate_link(PortRef::input(dq, 0), PortRef::output(src, 0), lookup).unwrap();
        assert_eq!(link.key.from, src);
        assert_eq!(link.key.to, dq);
        assert_eq!(link.from_label, DRIVING_QUESTION);
        assert_eq!(link.to_label, DRIVING_QUESTION);
    }

    #[test]
    fn rejects_same_node_and_same_polarity() {
        let dq = NodeId::intern("dq");
        let src = NodeId::intern("src");
        assert_eq!(
            validate_link(PortRef::input(dq, 0), PortRef::output(dq, 0), lookup),
            Err(LinkError::SameNode)
        );
        assert_eq!(
            validate_link(PortRef::output(dq, 0), PortRef::output(src, 0), lookup),
            Err(LinkError::SamePolarity(PortSide::Out))
        );
    }

    #[test]
    fn rejects_label_mismatch() {
        let dq = NodeId::intern("dq");
        let dq2 = NodeId::intern("dq2");
        assert_eq!(
            validate_link(PortRef::output(dq, 1), PortRef::input(dq2, 0), lookup),
            Err(LinkError::LabelMismatch {
                from_label: "goal analysis".into(),
                to_label: DRIVING_QUESTION.into(),
            })
        );
    }

    #[test]
    fn generic_ports_are_wildcards() {
        let dq = NodeId::intern("dq");
        let any = NodeId::intern("any");
        assert!(validate_link(PortRef::output(dq, 1), PortRef::input(any, 0), lookup).is_ok());

        let link = validate_link(PortRef::output(any, 0), PortRef::input(dq, 0), lookup).unwrap();
        assert_eq!(link.from_label, GENERIC_OUTPUT);
        assert_eq!(link.to_label, DRIVING_QUESTION);
    }

    #[test]
    fn rejects_missing_port() {
        let src = NodeId::intern("src");
        let dq = NodeId::intern("dq");
        assert_eq!(
            validate_link(PortRef::output(src, 0), PortRef::input(dq, 5), lookup),
            Err(LinkError::PortOutOfRange {
                node: dq,
                side: PortSide::In,
                index: 5
            })
        );
    }

    #[test]
    fn unknown_node_is_reported() {
        let ghost = NodeId::intern("ghost");
        let dq = NodeId::intern("dq");
        assert_eq!(
            validate_link(PortRef::output(ghost, 0), PortRef::input(dq, 0), lookup),
            Err(LinkError::UnknownNode(ghost))
        );
    }
}

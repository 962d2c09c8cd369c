pub mod catalog;
pub mod connection;
pub mod context;
pub mod error;
pub mod field;
pub mod graph;
pub mod id;
pub mod layout;
pub mod node;
pub mod ports;

pub use catalog::{Catalog, CatalogSection, NodeProposal, Template};
pub use connection::{Connection, LinkKey, PortRef};
pub use context::{ContextScope, ProjectBrief, build_context};
pub use error::{GraphError, LinkError};
pub use field::{Field, FieldKind, IntensityBand};
pub use graph::{CanvasGraph, LinkOutcome};
pub use id::{ConnectionId, NodeId};
pub use layout::{CanvasMetrics, CardBounds};
pub use node::{Category, InteractionType, Node, NodeKind, NodeUpdate, Stage};
pub use ports::{PortSide, Ports, resolve_ports};

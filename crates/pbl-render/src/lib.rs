pub mod connector;
pub mod hit;
pub mod svg;

pub use connector::{connector_curve, connector_for, connectors, svg_path};
pub use hit::{Hit, hit_connector, hit_test};
pub use svg::render_svg;

// Re-export kurbo so downstream crates don't need a direct dependency
pub use kurbo::CubicBez;

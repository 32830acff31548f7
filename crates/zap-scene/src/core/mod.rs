pub mod color;
pub mod container;
pub mod geometry;
pub mod graph;
pub mod layer;
pub mod scene;

pub use color::Color;
pub use container::{Container, NodeContainer};
pub use geometry::{Aabb, Rect};
pub use graph::NodeGraph;
pub use layer::Layer;
pub use scene::Scene;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod constraint;
pub mod edge_style;
pub mod geometry;
pub mod model;
pub mod perimeter;
pub mod registry;
pub mod render;
pub mod scene;
pub mod state_dump;
pub mod stencil;
pub mod style;
pub mod text;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use geometry::{Point, Rect};
pub use model::{CellId, CellKind, Geometry, GraphModel, ModelChange};
pub use view::{CellState, GraphView, StateHandle};

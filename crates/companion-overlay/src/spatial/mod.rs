pub mod grid;
pub mod index;

pub use grid::CollisionGrid;
pub use index::{IndexSnapshot, SpatialQuery, SpatialWidgetIndex};

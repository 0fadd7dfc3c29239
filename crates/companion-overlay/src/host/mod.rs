pub mod memory;
pub mod tree;
pub mod window;

pub use memory::{ControlState, MemoryHost};
pub use tree::{walk_widget_tree, WidgetNode};
pub use window::{
    ControlDescriptor, CoordinateSpace, HostSpace, HostWindow, IdentitySpace, NodeClass,
};

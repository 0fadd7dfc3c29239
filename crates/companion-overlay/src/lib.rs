pub mod api;
pub mod behavior;
pub mod core;
pub mod host;
pub mod overlay;
pub mod renderer;
pub mod spatial;

// Re-export key types at crate root for convenience
pub use api::config::{BehaviorParams, CameraParams, OverlayConfig, PhysicsParams, ShadowParams, StateWeights};
pub use api::error::{ConfigError, HostError, OverlayError};
pub use api::types::{ControlHandle, ControlId, ControlInfo, ControlKind, ItemId, ItemKind, OverlayEvent, Rect};
pub use behavior::{
    ActionOutcome, AnimationState, Archetype, BehaviorEngine, BehaviorState, CharacterState,
    InteractionSequence, SyntheticInputBridge,
};
pub use core::physics::PhysicsBody;
pub use core::scheduler::{Scheduler, TimerHandle};
pub use core::time::FixedTimestep;
pub use host::{ControlDescriptor, CoordinateSpace, HostWindow, MemoryHost, NodeClass, WidgetNode};
pub use overlay::OverlayRenderer;
pub use renderer::{Anchor, Camera3D, DrawList, FrameData, FrameTransform, PrimitiveInstance, Renderer, Shape};
pub use spatial::{CollisionGrid, IndexSnapshot, SpatialQuery, SpatialWidgetIndex};

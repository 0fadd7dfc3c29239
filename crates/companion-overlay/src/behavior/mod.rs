pub mod bridge;
pub mod engine;
pub mod sequence;
pub mod state;

pub use bridge::{ActionOutcome, SyntheticInputBridge};
pub use engine::{BehaviorContext, BehaviorEngine, InteractionRequest};
pub use sequence::{Archetype, InteractionSequence, SequenceEvent, SequenceRunner, SequenceStep, StepAction};
pub use state::{AnimationState, BehaviorState, CharacterState};

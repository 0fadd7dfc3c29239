use glam::Vec3;
use serde::Serialize;

use crate::core::physics::PhysicsBody;

/// High-level behavior of the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    Idle,
    Walking,
    Interacting,
    Investigating,
}

impl BehaviorState {
    /// Order matches `StateWeights::as_array`.
    pub const ALL: [BehaviorState; 4] = [
        BehaviorState::Idle,
        BehaviorState::Walking,
        BehaviorState::Interacting,
        BehaviorState::Investigating,
    ];
}

/// Pose the renderer draws. Independent of `BehaviorState`: interaction
/// sequences drive it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Walking,
    Investigating,
    Biting,
    Jumping,
    Tapping,
    Pushing,
    Spinning,
    Mischievous,
}

impl AnimationState {
    /// Limbs swing with the animation phase.
    pub fn swings_arms(self) -> bool {
        matches!(self, AnimationState::Walking)
    }
}

/// Everything the frame loop knows about the character.
#[derive(Debug, Clone)]
pub struct CharacterState {
    pub body: PhysicsBody,
    pub animation: AnimationState,
    pub behavior: BehaviorState,
    /// Current walk destination, world space.
    pub target: Option<Vec3>,
    /// Simulated time of the next behavior resample.
    pub next_decision_time: f64,
    /// Radians, drives limb swing.
    pub animation_phase: f32,
}

impl CharacterState {
    pub fn new(position: Vec3) -> Self {
        let mut body = PhysicsBody::at(position);
        body.grounded = true;
        Self {
            body,
            animation: AnimationState::Idle,
            behavior: BehaviorState::Idle,
            target: None,
            next_decision_time: 0.0,
            animation_phase: 0.0,
        }
    }

    /// Switch pose, restarting the limb cycle on change.
    pub fn set_animation(&mut self, animation: AnimationState) {
        if self.animation != animation {
            self.animation = animation;
            self.animation_phase = 0.0;
        }
    }
}

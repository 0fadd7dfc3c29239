// behavior/sequence.rs
//
// Interaction archetypes and the runner that plays them out on the shared
// timer queue. A sequence is an immutable list of steps; the runner schedules
// every step up front and hands each one back exactly once, in order, as its
// timer comes due.

use rand::Rng;
use serde::Serialize;

use crate::api::error::OverlayError;
use crate::api::types::{ControlHandle, ControlKind};
use crate::api::config::DEFAULT_PLAYFULNESS;
use crate::core::scheduler::{Scheduler, TimerHandle};

use super::state::AnimationState;

/// Interaction template tied to a control kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Bite,
    Jump,
    Tap,
    Push,
    Spin,
    /// Mischievous glance, no synthetic input.
    Look,
}

/// Squash depth at the moment of the action.
const ACTION_SQUASH: f32 = 0.85;
const TAP_SQUASH: f32 = 0.9;
const LANDING_SQUASH: f32 = 0.7;
/// Upward velocity kicks, world units per second.
const JUMP_IMPULSE: f32 = 3.0;
const TAP_IMPULSE: f32 = 1.0;

impl Archetype {
    /// Buttons get a coin flip between biting and jumping on them.
    pub fn for_kind<R: Rng + ?Sized>(kind: ControlKind, rng: &mut R) -> Archetype {
        match kind {
            ControlKind::Button => {
                if rng.gen_bool(0.5) {
                    Archetype::Bite
                } else {
                    Archetype::Jump
                }
            }
            ControlKind::Slider => Archetype::Tap,
            ControlKind::Tab => Archetype::Bite,
            ControlKind::Checkbox => Archetype::Push,
            ControlKind::Combo => Archetype::Spin,
            ControlKind::Textbox | ControlKind::Other => Archetype::Look,
        }
    }

    pub fn animation(self) -> AnimationState {
        match self {
            Archetype::Bite => AnimationState::Biting,
            Archetype::Jump => AnimationState::Jumping,
            Archetype::Tap => AnimationState::Tapping,
            Archetype::Push => AnimationState::Pushing,
            Archetype::Spin => AnimationState::Spinning,
            Archetype::Look => AnimationState::Mischievous,
        }
    }

    /// When the control's primary action fires. `None` for Look.
    pub fn action_delay_ms(self) -> Option<u32> {
        match self {
            Archetype::Bite => Some(300),
            Archetype::Jump => Some(400),
            Archetype::Tap => Some(200),
            Archetype::Push => Some(300),
            Archetype::Spin => Some(400),
            Archetype::Look => None,
        }
    }

    /// Total duration; the sequence completes at this offset.
    pub fn duration_ms(self) -> u32 {
        match self {
            Archetype::Bite => 1000,
            Archetype::Jump => 800,
            Archetype::Tap => 800,
            Archetype::Push => 600,
            Archetype::Spin => 800,
            Archetype::Look => 2000,
        }
    }
}

/// What a step does when it fires, besides its optional animation change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction {
    /// Only the animation changes.
    Pose,
    /// Set the body's squash target.
    Squash(f32),
    /// Add upward velocity.
    Impulse(f32),
    /// Invoke the target control's primary action.
    Activate,
    /// The sequence is over.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceStep {
    /// Offset from the start of the sequence.
    pub delay_ms: u32,
    pub animation: Option<AnimationState>,
    pub action: StepAction,
}

impl SequenceStep {
    fn at(delay_ms: u32, action: StepAction) -> Self {
        Self {
            delay_ms,
            animation: None,
            action,
        }
    }
}

/// Immutable, ordered timeline for one interaction.
#[derive(Debug, Clone)]
pub struct InteractionSequence {
    pub archetype: Archetype,
    pub target: Option<ControlHandle>,
    steps: Vec<SequenceStep>,
}

impl InteractionSequence {
    /// Build the timeline for `archetype`. Playfulness scales squash depth and
    /// hop height relative to the default temperament.
    pub fn new(archetype: Archetype, target: Option<ControlHandle>, playfulness: f32) -> Self {
        let gain = playfulness.max(0.0) / DEFAULT_PLAYFULNESS;
        let squash = |depth: f32| StepAction::Squash(1.0 - (1.0 - depth) * gain);
        let impulse = |dv: f32| StepAction::Impulse(dv * gain);

        let opening = match archetype {
            Archetype::Jump => impulse(JUMP_IMPULSE),
            Archetype::Tap => impulse(TAP_IMPULSE),
            _ => StepAction::Pose,
        };
        let mut steps = vec![SequenceStep {
            delay_ms: 0,
            animation: Some(archetype.animation()),
            action: opening,
        }];

        if let Some(action_ms) = archetype.action_delay_ms() {
            let depth = if archetype == Archetype::Tap { TAP_SQUASH } else { ACTION_SQUASH };
            steps.push(SequenceStep::at(action_ms, squash(depth)));
            if target.is_some() {
                steps.push(SequenceStep::at(action_ms, StepAction::Activate));
            }
            if archetype == Archetype::Jump {
                steps.push(SequenceStep::at(action_ms + 100, squash(LANDING_SQUASH)));
                steps.push(SequenceStep::at(action_ms + 200, StepAction::Squash(1.0)));
            } else {
                steps.push(SequenceStep::at(action_ms + 100, StepAction::Squash(1.0)));
            }
        }

        steps.push(SequenceStep::at(archetype.duration_ms(), StepAction::Complete));
        Self { archetype, target, steps }
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }
}

/// Timer payload for sequence steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEvent {
    pub sequence: u64,
    pub step: usize,
}

struct ActiveSequence {
    id: u64,
    sequence: InteractionSequence,
    timers: Vec<TimerHandle>,
    next_step: usize,
}

/// Plays at most one sequence at a time.
pub struct SequenceRunner {
    active: Option<ActiveSequence>,
    next_id: u64,
    completed: u64,
}

impl SequenceRunner {
    pub fn new() -> Self {
        Self {
            active: None,
            next_id: 1,
            completed: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&InteractionSequence> {
        self.active.as_ref().map(|a| &a.sequence)
    }

    /// Sequences that ran to completion.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Schedule every step of `sequence` starting at `now`.
    pub fn start(
        &mut self,
        sequence: InteractionSequence,
        now: f64,
        timers: &mut Scheduler<SequenceEvent>,
    ) -> Result<u64, OverlayError> {
        if self.active.is_some() {
            return Err(OverlayError::SequenceBusy);
        }
        let id = self.next_id;
        self.next_id += 1;

        let handles = sequence
            .steps()
            .iter()
            .enumerate()
            .map(|(step, s)| {
                timers.schedule(now, s.delay_ms as f64 / 1000.0, SequenceEvent { sequence: id, step })
            })
            .collect();

        log::debug!(
            "sequence {} started: {:?} with {} steps",
            id,
            sequence.archetype,
            sequence.steps().len()
        );
        self.active = Some(ActiveSequence {
            id,
            sequence,
            timers: handles,
            next_step: 0,
        });
        Ok(id)
    }

    /// Resolve a due timer to its step. Events for other sequences, or steps
    /// already delivered, yield `None`. Delivering `Complete` ends the sequence.
    pub fn take_step(&mut self, event: SequenceEvent) -> Option<(SequenceStep, Option<ControlHandle>)> {
        let active = self.active.as_mut()?;
        if active.id != event.sequence || event.step != active.next_step {
            return None;
        }
        let step = *active.sequence.steps().get(event.step)?;
        let target = active.sequence.target;
        active.next_step += 1;

        if step.action == StepAction::Complete {
            log::debug!("sequence {} complete", active.id);
            self.active = None;
            self.completed += 1;
        }
        Some((step, target))
    }

    /// Drop the active sequence and its pending timers.
    pub fn abort(&mut self, timers: &mut Scheduler<SequenceEvent>) {
        if let Some(active) = self.active.take() {
            for handle in active.timers {
                timers.cancel(handle);
            }
            log::debug!("sequence {} aborted", active.id);
        }
    }
}

impl Default for SequenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

use glam::{Vec2, Vec3};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::api::config::{BehaviorParams, DEFAULT_MISCHIEVOUSNESS};
use crate::api::error::{ConfigError, OverlayError};
use crate::api::types::ControlHandle;
use crate::host::window::CoordinateSpace;
use crate::renderer::camera::FrameTransform;
use crate::renderer::character::{anchor_world, Anchor};
use crate::spatial::grid::CollisionGrid;
use crate::spatial::index::SpatialQuery;

use super::sequence::Archetype;
use super::state::{AnimationState, BehaviorState, CharacterState};

/// Random wander targets tried before giving up on a walk.
const WANDER_ATTEMPTS: usize = 8;

/// Request to play an interaction, produced when the engine leaves INTERACTING.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRequest {
    pub archetype: Archetype,
    /// `None` for a plain look.
    pub target: Option<ControlHandle>,
}

/// Everything one behavior tick may consult.
pub struct BehaviorContext<'a> {
    pub now: f64,
    pub dt: f32,
    pub index: &'a mut dyn SpatialQuery,
    pub grid: &'a CollisionGrid,
    pub space: &'a dyn CoordinateSpace,
    /// Transform of the last completed frame, if any.
    pub frame: Option<&'a FrameTransform>,
    /// Head anchor from the last completed frame, overlay-local pixels.
    pub head: Option<Vec2>,
    pub rng: &'a mut dyn RngCore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkIntent {
    Wander,
    Interact,
}

/// Autonomous decision making: IDLE, WALKING, INTERACTING, INVESTIGATING.
///
/// The engine only moves the character and emits interaction requests. The
/// caller owns the sequence runner and stops calling `update` while a
/// sequence plays, resuming after `on_sequence_complete`.
pub struct BehaviorEngine {
    params: BehaviorParams,
    intent: WalkIntent,
    decisions: u64,
}

impl BehaviorEngine {
    pub fn new(params: BehaviorParams) -> Self {
        Self {
            params,
            intent: WalkIntent::Wander,
            decisions: 0,
        }
    }

    pub fn params(&self) -> &BehaviorParams {
        &self.params
    }

    /// Number of timer-driven resamples so far.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn set_parameters(
        &mut self,
        mischievousness: f32,
        playfulness: f32,
        interval: (f32, f32),
    ) -> Result<(), OverlayError> {
        unit_range("mischievousness", mischievousness)?;
        unit_range("playfulness", playfulness)?;
        let (min, max) = interval;
        if !(min.is_finite() && min > 0.0) {
            return Err(out_of_range("decision_interval.min", "positive", min).into());
        }
        if !(max.is_finite() && max >= min) {
            return Err(out_of_range("decision_interval.max", ">= min", max).into());
        }
        self.params.mischievousness = mischievousness;
        self.params.playfulness = playfulness;
        self.params.min_interval = min;
        self.params.max_interval = max;
        log::debug!(
            "behavior parameters: mischievousness {} playfulness {} interval {}..{}s",
            mischievousness,
            playfulness,
            min,
            max
        );
        Ok(())
    }

    /// Pick the next resample time, strictly after `now`.
    pub fn schedule_next_decision(&self, character: &mut CharacterState, now: f64, rng: &mut dyn RngCore) {
        let (min, max) = (self.params.min_interval, self.params.max_interval);
        let delay = if max > min { rng.gen_range(min..=max) } else { min };
        character.next_decision_time = now + f64::from(delay.max(1e-3));
    }

    pub fn transition_to(
        &mut self,
        character: &mut CharacterState,
        state: BehaviorState,
        now: f64,
        rng: &mut dyn RngCore,
    ) {
        character.behavior = state;
        match state {
            BehaviorState::Idle => {
                character.target = None;
                character.set_animation(AnimationState::Idle);
            }
            BehaviorState::Walking => character.set_animation(AnimationState::Walking),
            BehaviorState::Investigating => character.set_animation(AnimationState::Investigating),
            BehaviorState::Interacting => {}
        }
        if character.next_decision_time <= now {
            self.schedule_next_decision(character, now, rng);
        }
    }

    /// One behavior tick. Returns a request when the character decides to
    /// play with a control (or just look around).
    pub fn update(
        &mut self,
        character: &mut CharacterState,
        ctx: &mut BehaviorContext<'_>,
    ) -> Option<InteractionRequest> {
        if ctx.now >= character.next_decision_time {
            self.decide(character, ctx);
        }

        match character.behavior {
            BehaviorState::Idle => None,
            BehaviorState::Walking => {
                self.walk(character, ctx);
                if character.behavior == BehaviorState::Interacting {
                    Some(self.interact(character, ctx))
                } else {
                    None
                }
            }
            BehaviorState::Interacting => Some(self.interact(character, ctx)),
            BehaviorState::Investigating => {
                if self.investigate(character, ctx) {
                    Some(self.interact(character, ctx))
                } else {
                    None
                }
            }
        }
    }

    /// The sequence finished; settle back into IDLE.
    pub fn on_sequence_complete(&mut self, character: &mut CharacterState, now: f64, rng: &mut dyn RngCore) {
        self.transition_to(character, BehaviorState::Idle, now, rng);
    }

    fn decide(&mut self, character: &mut CharacterState, ctx: &mut BehaviorContext<'_>) {
        self.schedule_next_decision(character, ctx.now, ctx.rng);
        self.decisions += 1;

        let sampled = sample_state(&self.params, ctx.rng);
        log::debug!("behavior resampled: {:?} -> {:?}", character.behavior, sampled);

        if sampled != BehaviorState::Walking {
            self.transition_to(character, sampled, ctx.now, ctx.rng);
            return;
        }

        let eager = ctx.rng.gen::<f32>() < self.params.mischievousness;
        let planned = if eager {
            self.pick_interaction_target(character, ctx)
                .map(|t| (t, WalkIntent::Interact))
        } else {
            None
        };
        let planned = match planned {
            Some(p) => Some(p),
            None => self
                .pick_wander_target(character, ctx)
                .map(|t| (t, WalkIntent::Wander)),
        };
        match planned {
            Some((target, intent)) => {
                self.intent = intent;
                character.target = Some(target);
                self.transition_to(character, BehaviorState::Walking, ctx.now, ctx.rng);
            }
            None => {
                log::debug!("no reachable walk target");
                self.transition_to(character, BehaviorState::Idle, ctx.now, ctx.rng);
            }
        }
    }

    /// Center of a control near the head, lifted onto the head's plane.
    fn pick_interaction_target(
        &self,
        character: &CharacterState,
        ctx: &mut BehaviorContext<'_>,
    ) -> Option<Vec3> {
        let head = ctx.head?;
        let frame = ctx.frame?;
        let nearby = ctx
            .index
            .query_within(ctx.space.to_shared(head), self.params.detection_radius);
        let (control, _) = nearby.choose(&mut *ctx.rng)?;

        let center = ctx.space.to_local(control.center());
        let head_y = anchor_world(&character.body, Anchor::Head).y;
        let hit = frame.unproject_to_plane(center, head_y)?;
        log::debug!("walking over to {} {:?}", control.kind.type_name(), control.id);
        Some(Vec3::new(hit.x, character.body.position.y, hit.z))
    }

    fn pick_wander_target(&self, character: &CharacterState, ctx: &mut BehaviorContext<'_>) -> Option<Vec3> {
        let extent = self.params.wander_extent.abs();
        let y = character.body.position.y;
        for _ in 0..WANDER_ATTEMPTS {
            let candidate = Vec3::new(
                ctx.rng.gen_range(-extent..=extent),
                y,
                ctx.rng.gen_range(-extent..=extent),
            );
            let blocked = ctx
                .frame
                .and_then(|f| f.project(candidate))
                .map(|p| ctx.grid.is_blocked(p.x, p.y))
                .unwrap_or(false);
            if !blocked {
                return Some(candidate);
            }
        }
        None
    }

    fn walk(&mut self, character: &mut CharacterState, ctx: &mut BehaviorContext<'_>) {
        let target = match character.target {
            Some(t) => t,
            None => {
                self.transition_to(character, BehaviorState::Idle, ctx.now, ctx.rng);
                return;
            }
        };
        let body = &mut character.body;
        let delta = Vec3::new(target.x - body.position.x, 0.0, target.z - body.position.z);
        let distance = delta.length();

        if distance < self.params.arrival_epsilon {
            character.target = None;
            let next = match self.intent {
                WalkIntent::Interact => BehaviorState::Interacting,
                WalkIntent::Wander => BehaviorState::Idle,
            };
            self.intent = WalkIntent::Wander;
            self.transition_to(character, next, ctx.now, ctx.rng);
            return;
        }

        let dir = delta / distance;
        let step = (self.params.walk_speed * ctx.dt).min(distance);
        body.position += dir * step;
        body.rotation = dir.x.atan2(dir.z).to_degrees();
    }

    /// Turn in place. Returns true when curiosity wins and the character
    /// moves on to INTERACTING.
    fn investigate(&mut self, character: &mut CharacterState, ctx: &mut BehaviorContext<'_>) -> bool {
        let body = &mut character.body;
        body.rotation = (body.rotation + self.params.turn_rate * ctx.dt).rem_euclid(360.0);

        let chance = (self.params.investigate_trigger_chance * self.params.mischievousness
            / DEFAULT_MISCHIEVOUSNESS)
            .clamp(0.0, 1.0);
        if ctx.rng.gen::<f32>() < chance {
            self.transition_to(character, BehaviorState::Interacting, ctx.now, ctx.rng);
            true
        } else {
            false
        }
    }

    fn interact(&mut self, character: &mut CharacterState, ctx: &mut BehaviorContext<'_>) -> InteractionRequest {
        let control = ctx
            .head
            .and_then(|head| ctx.index.query_point(ctx.space.to_shared(head)));

        let request = match control {
            Some(c) => {
                let archetype = Archetype::for_kind(c.kind, &mut *ctx.rng);
                InteractionRequest {
                    archetype,
                    target: (archetype != Archetype::Look).then_some(c),
                }
            }
            None => {
                log::debug!("nothing under the head, just looking around");
                InteractionRequest {
                    archetype: Archetype::Look,
                    target: None,
                }
            }
        };
        self.transition_to(character, BehaviorState::Idle, ctx.now, ctx.rng);
        request
    }
}

fn sample_state(params: &BehaviorParams, rng: &mut dyn RngCore) -> BehaviorState {
    match WeightedIndex::new(params.weights.as_array()) {
        Ok(dist) => BehaviorState::ALL[dist.sample(rng)],
        Err(_) => BehaviorState::Idle,
    }
}

fn out_of_range(field: &'static str, expected: &'static str, value: f32) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        expected,
        value: f64::from(value),
    }
}

fn unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, "in [0, 1]", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::api::config::{CameraParams, StateWeights};
    use crate::api::types::{ControlKind, Rect};
    use crate::host::memory::MemoryHost;
    use crate::host::window::IdentitySpace;
    use crate::renderer::camera::Camera3D;
    use crate::spatial::index::SpatialWidgetIndex;

    struct Fixture {
        host: Rc<RefCell<MemoryHost>>,
        index: SpatialWidgetIndex<MemoryHost>,
        grid: CollisionGrid,
        frame: FrameTransform,
        rng: StdRng,
    }

    impl Fixture {
        fn new(host: MemoryHost) -> Self {
            let host = Rc::new(RefCell::new(host));
            let mut index = SpatialWidgetIndex::new(Rc::downgrade(&host), 0.1);
            let grid = CollisionGrid::build(&mut index, &IdentitySpace, Vec2::new(800.0, 600.0), 20.0);
            let frame = Camera3D::new(&CameraParams::default(), Vec2::new(800.0, 600.0)).frame_transform();
            Self {
                host,
                index,
                grid,
                frame,
                rng: StdRng::seed_from_u64(42),
            }
        }

        fn ctx(&mut self, now: f64, head: Option<Vec2>) -> BehaviorContext<'_> {
            BehaviorContext {
                now,
                dt: 1.0 / 60.0,
                index: &mut self.index,
                grid: &self.grid,
                space: &IdentitySpace,
                frame: Some(&self.frame),
                head,
                rng: &mut self.rng,
            }
        }
    }

    fn only(state: BehaviorState) -> BehaviorParams {
        let mut weights = StateWeights {
            idle: 0.0,
            walking: 0.0,
            interacting: 0.0,
            investigating: 0.0,
        };
        match state {
            BehaviorState::Idle => weights.idle = 1.0,
            BehaviorState::Walking => weights.walking = 1.0,
            BehaviorState::Interacting => weights.interacting = 1.0,
            BehaviorState::Investigating => weights.investigating = 1.0,
        }
        BehaviorParams {
            weights,
            ..BehaviorParams::default()
        }
    }

    fn button_host() -> (MemoryHost, crate::api::types::ControlId) {
        let mut host = MemoryHost::new(800.0, 600.0);
        let button = host.add_control(ControlKind::Button, Rect::new(100.0, 100.0, 50.0, 20.0));
        (host, button)
    }

    #[test]
    fn interacting_with_button_under_head_requests_bite_or_jump() {
        let (host, button) = button_host();
        let mut fx = Fixture::new(host);
        let mut engine = BehaviorEngine::new(only(BehaviorState::Interacting));
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));

        let mut ctx = fx.ctx(1.0, Some(Vec2::new(125.0, 108.0)));
        let request = engine.update(&mut character, &mut ctx).unwrap();

        assert_eq!(request.target.map(|c| c.id), Some(button));
        assert!(matches!(request.archetype, Archetype::Bite | Archetype::Jump));
        assert_eq!(character.behavior, BehaviorState::Idle);
        assert!(character.next_decision_time > 1.0);
    }

    #[test]
    fn interacting_over_empty_space_degrades_to_look() {
        let (host, _) = button_host();
        let mut fx = Fixture::new(host);
        let mut engine = BehaviorEngine::new(only(BehaviorState::Interacting));
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));

        let mut ctx = fx.ctx(1.0, Some(Vec2::new(600.0, 500.0)));
        let request = engine.update(&mut character, &mut ctx).unwrap();
        assert_eq!(request.archetype, Archetype::Look);
        assert!(request.target.is_none());

        // No projection yet behaves the same way.
        character.next_decision_time = 0.0;
        let mut ctx = fx.ctx(2.0, None);
        assert_eq!(engine.update(&mut character, &mut ctx).unwrap().archetype, Archetype::Look);
    }

    #[test]
    fn textbox_gets_a_look_without_target() {
        let mut host = MemoryHost::new(800.0, 600.0);
        host.add_control(ControlKind::Textbox, Rect::new(100.0, 100.0, 50.0, 20.0));
        let mut fx = Fixture::new(host);
        let mut engine = BehaviorEngine::new(only(BehaviorState::Interacting));
        let mut character = CharacterState::new(Vec3::ZERO);
        let mut ctx = fx.ctx(1.0, Some(Vec2::new(125.0, 108.0)));
        let request = engine.update(&mut character, &mut ctx).unwrap();
        assert_eq!(request.archetype, Archetype::Look);
        assert!(request.target.is_none());
    }

    #[test]
    fn every_transition_leaves_a_future_decision() {
        let (host, _) = button_host();
        let mut fx = Fixture::new(host);
        let mut engine = BehaviorEngine::new(BehaviorParams {
            min_interval: 0.05,
            max_interval: 0.2,
            ..BehaviorParams::default()
        });
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));

        let mut now = 0.0;
        for _ in 0..3000 {
            now += 1.0 / 60.0;
            let head = fx.frame.project(anchor_world(&character.body, Anchor::Head));
            let mut ctx = fx.ctx(now, head);
            engine.update(&mut character, &mut ctx);
            assert!(character.next_decision_time > now);
            assert!(BehaviorState::ALL.contains(&character.behavior));
        }
        assert!(engine.decisions() > 100);
    }

    #[test]
    fn wander_walks_at_constant_speed_and_arrives_idle() {
        let host = MemoryHost::new(800.0, 600.0);
        let mut fx = Fixture::new(host);
        let mut params = only(BehaviorState::Walking);
        params.mischievousness = 0.0;
        let mut engine = BehaviorEngine::new(params);
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));

        let mut ctx = fx.ctx(0.0, None);
        engine.update(&mut character, &mut ctx);
        assert_eq!(character.behavior, BehaviorState::Walking);
        assert_eq!(character.animation, AnimationState::Walking);
        let target = character.target.unwrap();
        assert!(target.x.abs() <= 2.0 && target.z.abs() <= 2.0);

        let mut now = 0.0;
        let mut ticks = 0;
        while character.behavior == BehaviorState::Walking {
            let before = character.body.position;
            now += 1.0 / 60.0;
            let mut ctx = fx.ctx(now, None);
            engine.update(&mut character, &mut ctx);
            let moved = (character.body.position - before).length();
            assert!(moved <= 1.0 / 60.0 + 1e-5);
            ticks += 1;
            assert!(ticks < 60 * 5, "never arrived");
        }
        assert_eq!(character.behavior, BehaviorState::Idle);
        assert!(character.target.is_none());
    }

    #[test]
    fn walking_faces_travel_direction() {
        let host = MemoryHost::new(800.0, 600.0);
        let mut fx = Fixture::new(host);
        let mut engine = BehaviorEngine::new(only(BehaviorState::Idle));
        let mut character = CharacterState::new(Vec3::ZERO);
        character.next_decision_time = 100.0;
        character.target = Some(Vec3::new(1.0, 0.0, 0.0));
        character.behavior = BehaviorState::Walking;

        let mut ctx = fx.ctx(0.0, None);
        engine.update(&mut character, &mut ctx);
        assert!((character.body.rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn blocked_everywhere_means_no_wander() {
        let mut host = MemoryHost::new(800.0, 600.0);
        host.add_control(ControlKind::Other, Rect::new(0.0, 0.0, 800.0, 600.0));
        let mut fx = Fixture::new(host);
        let mut params = only(BehaviorState::Walking);
        params.mischievousness = 0.0;
        // Keep every candidate on screen.
        params.wander_extent = 0.5;
        let mut engine = BehaviorEngine::new(params);
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));

        let mut ctx = fx.ctx(0.0, None);
        engine.update(&mut character, &mut ctx);
        assert_eq!(character.behavior, BehaviorState::Idle);
        assert!(character.target.is_none());
    }

    #[test]
    fn mischievous_walk_ends_on_the_control() {
        let mut fx = Fixture::new(MemoryHost::new(800.0, 600.0));
        let mut character = CharacterState::new(Vec3::new(0.0, -0.5, 0.0));
        let head = fx.frame.project(anchor_world(&character.body, Anchor::Head)).unwrap();
        let button = fx.host.borrow_mut().add_control(
            ControlKind::Checkbox,
            Rect::new(head.x + 60.0, head.y - 20.0, 40.0, 40.0),
        );
        fx.index.invalidate();

        let mut params = only(BehaviorState::Walking);
        params.mischievousness = 1.0;
        let mut engine = BehaviorEngine::new(params);

        let mut now = 0.0;
        let mut request = None;
        for _ in 0..600 {
            let head = fx.frame.project(anchor_world(&character.body, Anchor::Head));
            let mut ctx = fx.ctx(now, head);
            if let Some(r) = engine.update(&mut character, &mut ctx) {
                request = Some(r);
                break;
            }
            now += 1.0 / 60.0;
        }
        let request = request.expect("never reached the control");
        assert_eq!(request.archetype, Archetype::Push);
        assert_eq!(request.target.map(|c| c.id), Some(button));
    }

    #[test]
    fn investigating_turns_and_respects_mischievousness() {
        let host = MemoryHost::new(800.0, 600.0);
        let mut fx = Fixture::new(host);
        let mut params = only(BehaviorState::Investigating);
        params.mischievousness = 0.0;
        let mut engine = BehaviorEngine::new(params);
        let mut character = CharacterState::new(Vec3::ZERO);

        let mut now = 0.0;
        for _ in 0..120 {
            let mut ctx = fx.ctx(now, None);
            assert!(engine.update(&mut character, &mut ctx).is_none());
            now += 1.0 / 60.0;
        }
        assert_eq!(character.behavior, BehaviorState::Investigating);
        assert!(character.body.rotation > 50.0 && character.body.rotation < 70.0);

        let mut params = only(BehaviorState::Investigating);
        params.investigate_trigger_chance = 1.0;
        let mut engine = BehaviorEngine::new(params);
        character.next_decision_time = 0.0;
        let mut ctx = fx.ctx(now, None);
        assert!(engine.update(&mut character, &mut ctx).is_some());
        assert_eq!(character.behavior, BehaviorState::Idle);
    }

    #[test]
    fn sequence_completion_returns_to_idle_with_a_fresh_timer() {
        let mut engine = BehaviorEngine::new(BehaviorParams::default());
        let mut character = CharacterState::new(Vec3::ZERO);
        character.set_animation(AnimationState::Biting);
        character.next_decision_time = 3.0;
        let mut rng = StdRng::seed_from_u64(1);

        engine.on_sequence_complete(&mut character, 4.0, &mut rng);
        assert_eq!(character.behavior, BehaviorState::Idle);
        assert_eq!(character.animation, AnimationState::Idle);
        assert!(character.next_decision_time >= 9.0 && character.next_decision_time <= 19.0);
    }

    #[test]
    fn parameters_are_validated() {
        let mut engine = BehaviorEngine::new(BehaviorParams::default());
        assert!(engine.set_parameters(0.2, 0.9, (1.0, 2.0)).is_ok());
        assert_eq!(engine.params().mischievousness, 0.2);
        assert!(matches!(
            engine.set_parameters(1.5, 0.5, (1.0, 2.0)),
            Err(OverlayError::Config(_))
        ));
        assert!(engine.set_parameters(0.5, 0.5, (3.0, 2.0)).is_err());
        assert!(engine.set_parameters(0.5, 0.5, (0.0, 2.0)).is_err());
        assert_eq!(engine.params().max_interval, 2.0);
    }
}

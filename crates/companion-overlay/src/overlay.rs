use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::api::config::OverlayConfig;
use crate::api::error::OverlayError;
use crate::api::types::{ControlId, ControlInfo, ItemId, ItemKind, OverlayEvent, Rect};
use crate::behavior::bridge::{ActionOutcome, SyntheticInputBridge};
use crate::behavior::engine::{BehaviorContext, BehaviorEngine, InteractionRequest};
use crate::behavior::sequence::{Archetype, InteractionSequence, SequenceEvent, SequenceRunner, StepAction};
use crate::behavior::state::{BehaviorState, CharacterState};
use crate::core::items::{ItemState, ItemStore};
use crate::core::physics::GroundResponse;
use crate::core::scheduler::Scheduler;
use crate::core::time::FixedTimestep;
use crate::host::window::{CoordinateSpace, HostSpace, HostWindow, IdentitySpace};
use crate::renderer::camera::{Camera3D, FrameTransform};
use crate::renderer::character::{anchor_world, draw_character, Anchor, PHASE_RATE};
use crate::renderer::draw::{draw_item, draw_shadow};
use crate::renderer::instance::DrawList;
use crate::renderer::traits::{DrawTiming, FrameData, Renderer};
use crate::spatial::grid::CollisionGrid;
use crate::spatial::index::{SpatialQuery, SpatialWidgetIndex};

/// Half the side of the square around the head that counts as "on the character".
const HIT_BOX_HALF: f32 = 50.0;
/// Screen movement below this many pixels does not produce `CharacterMoved`.
const MOVE_EPSILON_PX: f32 = 0.01;

/// The companion overlay: owns the character, its items and the frame loop.
///
/// Call `tick` once per displayed frame. Each tick runs zero or more fixed
/// steps (index refresh, physics, behavior, due sequence steps) and then one
/// render pass that projects the anchors consulted by the next tick.
pub struct OverlayRenderer<H: HostWindow> {
    config: OverlayConfig,
    host: Weak<RefCell<H>>,
    timestep: FixedTimestep,
    index: SpatialWidgetIndex<H>,
    grid: Arc<CollisionGrid>,
    bridge: SyntheticInputBridge<H>,
    engine: BehaviorEngine,
    runner: SequenceRunner,
    timers: Scheduler<SequenceEvent>,
    character: CharacterState,
    items: ItemStore,
    camera: Camera3D,
    frame: Option<FrameTransform>,
    anchors: HashMap<Anchor, Vec2>,
    screen_position: Option<Vec2>,
    control_below: Option<ControlId>,
    rng: StdRng,
    draw_list: DrawList,
    backend: Option<Box<dyn Renderer>>,
    last_timing: DrawTiming,
    events: Vec<OverlayEvent>,
    frames: u64,
}

impl<H: HostWindow> OverlayRenderer<H> {
    /// Attach an overlay to `host`. Only a weak reference is kept.
    pub fn new(host: &Rc<RefCell<H>>, config: OverlayConfig) -> Result<Self, OverlayError> {
        config.validate()?;
        let viewport = host
            .try_borrow()
            .map(|h| h.window_size())
            .map_err(|_| OverlayError::HostUnavailable)?;

        let weak = Rc::downgrade(host);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = BehaviorEngine::new(config.behavior);
        let mut character = CharacterState::new(Vec3::new(0.0, config.physics.character_ground_y, 0.0));
        engine.schedule_next_decision(&mut character, 0.0, &mut rng);

        log::info!(
            "overlay attached: {}x{} viewport, first decision at {:.2}s",
            viewport.x,
            viewport.y,
            character.next_decision_time
        );

        Ok(Self {
            timestep: FixedTimestep::new(config.fixed_dt, config.max_dt),
            index: SpatialWidgetIndex::new(weak.clone(), f64::from(config.index_rebuild_interval)),
            grid: Arc::new(CollisionGrid::empty(config.grid_cell_size)),
            bridge: SyntheticInputBridge::new(weak.clone()),
            engine,
            runner: SequenceRunner::new(),
            timers: Scheduler::new(),
            character,
            items: ItemStore::new(),
            camera: Camera3D::new(&config.camera, viewport),
            frame: None,
            anchors: HashMap::new(),
            screen_position: None,
            control_below: None,
            rng,
            draw_list: DrawList::with_capacity(64),
            backend: None,
            last_timing: DrawTiming::default(),
            events: Vec::new(),
            frames: 0,
            host: weak,
            config,
        })
    }

    /// Hand draw output to a GPU or test backend.
    pub fn set_backend(&mut self, backend: Box<dyn Renderer>) {
        log::info!("render backend: {}", backend.backend());
        self.backend = Some(backend);
    }

    /// Advance by one displayed frame. Returns the number of fixed steps run.
    pub fn tick(&mut self, frame_dt: f32) -> u32 {
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.step();
        }
        self.render();
        steps
    }

    fn step(&mut self) {
        let now = self.timestep.advance();
        let dt = self.timestep.dt();

        if self.index.refresh(now) {
            self.rebuild_grid();
        }

        self.integrate(dt);

        if !self.runner.is_active() {
            let head = self.anchors.get(&Anchor::Head).copied();
            let request = with_space(&self.host, |space| {
                let mut ctx = BehaviorContext {
                    now,
                    dt,
                    index: &mut self.index,
                    grid: &*self.grid,
                    space,
                    frame: self.frame.as_ref(),
                    head,
                    rng: &mut self.rng,
                };
                self.engine.update(&mut self.character, &mut ctx)
            });
            if let Some(request) = request {
                self.start(request, now);
            }
        }

        self.fire_due(now);
        self.track_control_below();
    }

    fn integrate(&mut self, dt: f32) {
        let physics = &self.config.physics;
        let body = &mut self.character.body;
        body.integrate(physics, physics.character_ground_y, GroundResponse::Stick, dt);
        body.relax_squash(physics.squash_recovery);
        self.items.step(physics, dt);
        self.character.animation_phase =
            (self.character.animation_phase + PHASE_RATE * dt) % std::f32::consts::TAU;
    }

    fn rebuild_grid(&mut self) {
        let window = self.camera.viewport;
        let cell = self.config.grid_cell_size;
        let grid = with_space(&self.host, |space| CollisionGrid::build(&mut self.index, space, window, cell));
        log::debug!("collision grid rebuilt: {} blocked cells", grid.blocked_cells());
        self.grid = Arc::new(grid);
    }

    fn start(&mut self, request: InteractionRequest, now: f64) {
        let sequence = InteractionSequence::new(
            request.archetype,
            request.target,
            self.engine.params().playfulness,
        );
        if let Err(err) = self.runner.start(sequence, now, &mut self.timers) {
            log::debug!("interaction dropped: {}", err);
        }
    }

    /// Run every sequence step whose delay has elapsed.
    fn fire_due(&mut self, now: f64) {
        while let Some((_, event)) = self.timers.pop_due(now) {
            let Some((step, target)) = self.runner.take_step(event) else {
                continue;
            };
            if let Some(animation) = step.animation {
                self.character.set_animation(animation);
            }
            match step.action {
                StepAction::Pose => {}
                // Pulses land at full depth; the recovery back to 1.0 is eased.
                StepAction::Squash(factor) if factor < 1.0 => self.character.body.squash_to(factor),
                StepAction::Squash(factor) => self.character.body.apply_squash(factor),
                StepAction::Impulse(dv) => self.character.body.apply_impulse(Vec3::Y * dv),
                StepAction::Activate => {
                    let Some(scheduled) = target else { continue };
                    // Handles only live until the next rebuild: act on the
                    // current snapshot's view of the control, if it is still listed.
                    let Some(target) = self.index.control(scheduled.id) else {
                        log::debug!(
                            "{} {:?} no longer interactive, skipping action",
                            scheduled.kind.type_name(),
                            scheduled.id
                        );
                        continue;
                    };
                    match self.bridge.invoke(&target, &mut self.rng) {
                        Some(ActionOutcome::Skipped) | None => {}
                        Some(_) => self.events.push(OverlayEvent::ControlActivated {
                            id: target.id,
                            kind: target.kind,
                        }),
                    }
                }
                StepAction::Complete => {
                    self.engine
                        .on_sequence_complete(&mut self.character, now, &mut self.rng);
                }
            }
        }
    }

    /// Look up the control under the feet of the last projected frame.
    fn track_control_below(&mut self) {
        let feet = match (
            self.anchors.get(&Anchor::LeftFoot),
            self.anchors.get(&Anchor::RightFoot),
        ) {
            (Some(l), Some(r)) => (*l + *r) * 0.5,
            _ => return,
        };
        let below = with_space(&self.host, |space| self.index.query_point(space.to_shared(feet)))
            .map(|c| c.id);
        if below != self.control_below {
            log::debug!("control below changed: {:?} -> {:?}", self.control_below, below);
            self.control_below = below;
            self.events.push(OverlayEvent::ControlBelowChanged { id: below });
        }
    }

    fn render(&mut self) {
        let transform = self.camera.frame_transform();

        self.draw_list.clear();
        if self.config.shadow.enabled && self.control_below.is_some() {
            draw_shadow(
                &mut self.draw_list,
                &self.character.body,
                &self.config.shadow,
                self.config.physics.item_ground_y,
            );
        }
        for item in self.items.iter() {
            draw_item(&mut self.draw_list, item);
        }
        draw_character(
            &mut self.draw_list,
            &self.character.body,
            self.character.animation,
            self.character.animation_phase,
        );

        self.anchors.clear();
        for anchor in Anchor::ALL {
            let world = anchor_world(&self.character.body, anchor);
            if let Some(screen) = transform.project(world) {
                self.anchors.insert(anchor, screen);
            }
        }

        if let Some(screen) = transform.project(self.character.body.position) {
            let moved = self
                .screen_position
                .map_or(true, |last| last.distance(screen) > MOVE_EPSILON_PX);
            if moved {
                self.screen_position = Some(screen);
                self.events.push(OverlayEvent::CharacterMoved { x: screen.x, y: screen.y });
            }
        }

        if let Some(backend) = self.backend.as_mut() {
            let frame = FrameData {
                primitives: self.draw_list.instances(),
                camera: self.camera.uniform(),
                viewport: [self.camera.viewport.x, self.camera.viewport.y],
            };
            self.last_timing = backend.draw(&frame);
        }

        self.frame = Some(transform);
        self.frames += 1;
    }

    /// Screen position of a named anchor as of the last completed frame.
    pub fn anchor_position(&self, anchor: Anchor) -> Result<Vec2, OverlayError> {
        if self.frame.is_none() {
            return Err(OverlayError::ProjectionUnavailable);
        }
        self.anchors
            .get(&anchor)
            .copied()
            .ok_or(OverlayError::ProjectionUnavailable)
    }

    /// Anchor lookup by name ("head", "mouth", "left_foot", ...). Falls back
    /// to the overlay center until a frame has been projected. Unknown names
    /// yield `None`.
    pub fn get_anchor_screen_position(&self, name: &str) -> Option<Vec2> {
        let anchor = Anchor::from_name(name)?;
        match self.anchor_position(anchor) {
            Ok(p) => Some(p),
            Err(_) => Some(self.camera.viewport * 0.5),
        }
    }

    /// Whether `point` (overlay-local) lands on the character, so the host
    /// can decide between capturing the mouse and passing it through.
    pub fn hit_test_character(&self, point: Vec2) -> bool {
        match self.anchor_position(Anchor::Head) {
            Ok(head) => Rect::new(
                head.x - HIT_BOX_HALF,
                head.y - HIT_BOX_HALF,
                HIT_BOX_HALF * 2.0,
                HIT_BOX_HALF * 2.0,
            )
            .contains(point),
            Err(_) => false,
        }
    }

    pub fn spawn_item(&mut self, kind: ItemKind, position: Vec3) -> ItemId {
        let id = self.items.spawn(kind, position);
        log::info!("spawned {:?} {:?} at {}", kind, id, position);
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        self.items.remove(id).is_some()
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemState> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemState> {
        self.items.iter()
    }

    pub fn set_behavior_parameters(
        &mut self,
        mischievousness: f32,
        playfulness: f32,
        interval: (f32, f32),
    ) -> Result<(), OverlayError> {
        self.engine.set_parameters(mischievousness, playfulness, interval)
    }

    /// Play an interaction right away, outside the behavior timer. The
    /// target is resolved against the current index.
    pub fn play(&mut self, archetype: Archetype, target: Option<ControlId>) -> Result<u64, OverlayError> {
        if self.runner.is_active() {
            return Err(OverlayError::SequenceBusy);
        }
        let handle = match target {
            Some(id) => Some(self.index.control(id).ok_or(OverlayError::StaleHandle(id))?),
            None => None,
        };
        let now = self.timestep.now();
        let sequence = InteractionSequence::new(archetype, handle, self.engine.params().playfulness);
        let id = self.runner.start(sequence, now, &mut self.timers)?;
        // Same bookkeeping as an autonomous interaction: back to IDLE while it plays.
        self.engine
            .transition_to(&mut self.character, BehaviorState::Idle, now, &mut self.rng);
        Ok(id)
    }

    /// The host layout changed; rebuild the index and grid next tick.
    pub fn invalidate(&mut self) {
        self.index.invalidate();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width as f32, height as f32);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
        self.invalidate();
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<OverlayEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shared-space center of a live control.
    pub fn control_center(&mut self, id: ControlId) -> Option<Vec2> {
        self.index.control(id).map(|c| c.center())
    }

    pub fn control_info(&mut self, id: ControlId) -> Option<ControlInfo> {
        self.index.control(id).map(|c| ControlInfo::from(&c))
    }

    pub fn character(&self) -> &CharacterState {
        &self.character
    }

    pub fn behavior_state(&self) -> BehaviorState {
        self.character.behavior
    }

    pub fn is_interacting(&self) -> bool {
        self.runner.is_active()
    }

    pub fn completed_interactions(&self) -> u64 {
        self.runner.completed()
    }

    pub fn decisions(&self) -> u64 {
        self.engine.decisions()
    }

    pub fn control_below(&self) -> Option<ControlId> {
        self.control_below
    }

    pub fn grid(&self) -> Arc<CollisionGrid> {
        Arc::clone(&self.grid)
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn last_timing(&self) -> DrawTiming {
        self.last_timing
    }

    pub fn index_rebuilds(&self) -> u64 {
        self.index.rebuild_count()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Simulated seconds.
    pub fn now(&self) -> f64 {
        self.timestep.now()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }
}

/// Run `f` with the host's coordinate mapping, or identity when the host
/// is gone or busy.
fn with_space<H: HostWindow, R>(
    host: &Weak<RefCell<H>>,
    f: impl FnOnce(&dyn CoordinateSpace) -> R,
) -> R {
    let host = host.upgrade();
    let guard = host.as_ref().and_then(|h| h.try_borrow().ok());
    match guard.as_deref() {
        Some(h) => f(&HostSpace(h)),
        None => f(&IdentitySpace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::StateWeights;
    use crate::api::types::ControlKind;
    use crate::host::memory::MemoryHost;
    use crate::renderer::instance::Shape;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (Rc<RefCell<MemoryHost>>, OverlayRenderer<MemoryHost>) {
        let host = Rc::new(RefCell::new(MemoryHost::new(800.0, 600.0)));
        let config = OverlayConfig {
            seed: Some(7),
            ..OverlayConfig::default()
        };
        let overlay = OverlayRenderer::new(&host, config).unwrap();
        (host, overlay)
    }

    fn run(overlay: &mut OverlayRenderer<MemoryHost>, ticks: usize) {
        for _ in 0..ticks {
            overlay.tick(DT);
        }
    }

    /// A 50x20 button centered on the head anchor of the last frame.
    fn button_under_head(host: &Rc<RefCell<MemoryHost>>, overlay: &mut OverlayRenderer<MemoryHost>) -> ControlId {
        let head = overlay.anchor_position(Anchor::Head).unwrap();
        let id = host
            .borrow_mut()
            .add_control(ControlKind::Button, Rect::new(head.x - 25.0, head.y - 10.0, 50.0, 20.0));
        overlay.invalidate();
        id
    }

    #[derive(Default)]
    struct CountingBackend {
        frames: Rc<RefCell<Vec<usize>>>,
    }

    impl Renderer for CountingBackend {
        fn backend(&self) -> &'static str {
            "counting"
        }

        fn draw(&mut self, frame: &FrameData) -> DrawTiming {
            self.frames.borrow_mut().push(frame.primitives.len());
            DrawTiming { draw_us: 1 }
        }

        fn resize(&mut self, _width: u32, _height: u32) {}
    }

    #[test]
    fn anchors_fall_back_to_center_before_first_frame() {
        let (_host, mut overlay) = setup();
        assert_eq!(
            overlay.anchor_position(Anchor::Head),
            Err(OverlayError::ProjectionUnavailable)
        );
        assert_eq!(overlay.get_anchor_screen_position("head"), Some(Vec2::new(400.0, 300.0)));
        assert_eq!(overlay.get_anchor_screen_position("tail"), None);
        assert!(!overlay.hit_test_character(Vec2::new(400.0, 300.0)));

        overlay.tick(DT);
        let head = overlay.anchor_position(Anchor::Head).unwrap();
        let feet = overlay.anchor_position(Anchor::LeftFoot).unwrap();
        assert!(head.y < feet.y, "head should be drawn above the feet");
        assert_eq!(overlay.get_anchor_screen_position("head"), Some(head));
    }

    #[test]
    fn hit_test_uses_box_around_head() {
        let (_host, mut overlay) = setup();
        overlay.tick(DT);
        let head = overlay.anchor_position(Anchor::Head).unwrap();
        assert!(overlay.hit_test_character(head));
        assert!(overlay.hit_test_character(head + Vec2::new(45.0, -45.0)));
        assert!(!overlay.hit_test_character(head + Vec2::new(60.0, 0.0)));
    }

    #[test]
    fn bite_activates_once_at_300ms() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        let button = button_under_head(&host, &mut overlay);
        overlay.drain_events();

        overlay.play(Archetype::Bite, Some(button)).unwrap();
        assert_eq!(overlay.play(Archetype::Look, None), Err(OverlayError::SequenceBusy));

        run(&mut overlay, 17);
        assert_eq!(host.borrow().activation_count(button), 0);

        run(&mut overlay, 2);
        assert_eq!(host.borrow().activation_count(button), 1);

        run(&mut overlay, 50);
        assert_eq!(host.borrow().activation_count(button), 1);
        assert!(!overlay.is_interacting());
        assert_eq!(overlay.completed_interactions(), 1);
        assert_eq!(overlay.behavior_state(), BehaviorState::Idle);
        assert!(overlay.character().next_decision_time > overlay.now());

        let activations: Vec<_> = overlay
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OverlayEvent::ControlActivated { .. }))
            .collect();
        assert_eq!(
            activations,
            vec![OverlayEvent::ControlActivated {
                id: button,
                kind: ControlKind::Button
            }]
        );
    }

    #[test]
    fn control_removed_before_action_is_a_no_op() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        let button = button_under_head(&host, &mut overlay);
        let bystander = host
            .borrow_mut()
            .add_control(ControlKind::Checkbox, Rect::new(0.0, 0.0, 20.0, 20.0));
        overlay.invalidate();

        overlay.play(Archetype::Bite, Some(button)).unwrap();
        run(&mut overlay, 6);
        host.borrow_mut().remove(button);

        run(&mut overlay, 60);
        assert_eq!(host.borrow().total_activations(), 0);
        assert!(!host.borrow().state(bystander).unwrap().checked);
        assert!(!overlay.is_interacting());
        assert_eq!(overlay.behavior_state(), BehaviorState::Idle);
        assert!(!overlay
            .drain_events()
            .iter()
            .any(|e| matches!(e, OverlayEvent::ControlActivated { .. })));
    }

    #[test]
    fn play_rejects_unknown_control() {
        let (_host, mut overlay) = setup();
        assert_eq!(
            overlay.play(Archetype::Bite, Some(ControlId(99))),
            Err(OverlayError::StaleHandle(ControlId(99)))
        );
        assert!(!overlay.is_interacting());
    }

    #[test]
    fn shadow_appears_over_a_control() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        assert_eq!(overlay.draw_list().count_of(Shape::Shadow), 0);

        let pad = host
            .borrow_mut()
            .add_control(ControlKind::Button, Rect::new(0.0, 0.0, 800.0, 600.0));
        overlay.invalidate();
        overlay.tick(DT);

        assert_eq!(overlay.control_below(), Some(pad));
        assert_eq!(overlay.draw_list().count_of(Shape::Shadow), 1);
        assert!(overlay
            .drain_events()
            .contains(&OverlayEvent::ControlBelowChanged { id: Some(pad) }));

        host.borrow_mut().remove(pad);
        overlay.invalidate();
        overlay.tick(DT);
        assert_eq!(overlay.control_below(), None);
        assert_eq!(overlay.draw_list().count_of(Shape::Shadow), 0);
    }

    #[test]
    fn character_moved_only_when_it_moves() {
        let (_host, mut overlay) = setup();
        overlay.tick(DT);
        let first = overlay.drain_events();
        assert!(first.iter().any(|e| matches!(e, OverlayEvent::CharacterMoved { .. })));

        overlay.tick(DT);
        assert!(!overlay
            .drain_events()
            .iter()
            .any(|e| matches!(e, OverlayEvent::CharacterMoved { .. })));
    }

    #[test]
    fn dropped_item_settles_on_item_ground() {
        let (_host, mut overlay) = setup();
        let id = overlay.spawn_item(ItemKind::Toy, Vec3::new(0.5, 1.0, 0.0));
        run(&mut overlay, 600);
        let item = overlay.item(id).unwrap();
        assert!((item.body.position.y - overlay.config().physics.item_ground_y).abs() < 1e-4);
        assert_eq!(item.body.velocity.y, 0.0);

        assert!(overlay.remove_item(id));
        assert!(!overlay.remove_item(id));
    }

    #[test]
    fn draw_list_holds_items_and_character() {
        let (_host, mut overlay) = setup();
        overlay.spawn_item(ItemKind::Food, Vec3::ZERO);
        overlay.tick(DT);
        assert_eq!(
            overlay.draw_list().instance_count(),
            crate::renderer::character::part_count() + 1
        );
    }

    #[test]
    fn backend_receives_each_frame() {
        let (_host, mut overlay) = setup();
        let backend = CountingBackend::default();
        let frames = Rc::clone(&backend.frames);
        overlay.set_backend(Box::new(backend));
        run(&mut overlay, 3);
        assert_eq!(frames.borrow().len(), 3);
        assert_eq!(overlay.last_timing().draw_us, 1);
    }

    #[test]
    fn resize_recenters_and_invalidates() {
        let (_host, mut overlay) = setup();
        overlay.tick(DT);
        let rebuilds = overlay.index_rebuilds();
        overlay.resize(1024, 768);
        overlay.tick(DT);
        assert_eq!(overlay.index_rebuilds(), rebuilds + 1);
        let center = overlay.anchor_position(Anchor::Head).unwrap();
        assert!((center.x - 512.0).abs() < 1.0);
    }

    #[test]
    fn behavior_parameters_are_validated() {
        let (_host, mut overlay) = setup();
        assert!(overlay.set_behavior_parameters(0.9, 0.5, (1.0, 2.0)).is_ok());
        assert!(overlay.set_behavior_parameters(1.5, 0.5, (1.0, 2.0)).is_err());
    }

    #[test]
    fn control_info_reports_type_and_center() {
        let (host, mut overlay) = setup();
        let id = host
            .borrow_mut()
            .add_control(ControlKind::Slider, Rect::new(100.0, 100.0, 50.0, 20.0));
        overlay.invalidate();
        let info = overlay.control_info(id).unwrap();
        assert_eq!(info.type_name, "slider");
        assert_eq!(overlay.control_center(id), Some(Vec2::new(125.0, 110.0)));
    }

    #[test]
    fn dropped_host_keeps_ticking() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        drop(host);
        overlay.invalidate();
        run(&mut overlay, 10);
        assert_eq!(overlay.control_below(), None);
        assert_eq!(overlay.frame_count(), 11);
    }

    #[test]
    fn decision_timer_drives_a_full_interaction() {
        let host = Rc::new(RefCell::new(MemoryHost::new(800.0, 600.0)));
        let mut config = OverlayConfig {
            seed: Some(3),
            ..OverlayConfig::default()
        };
        config.behavior.weights = StateWeights {
            idle: 0.0,
            walking: 0.0,
            interacting: 1.0,
            investigating: 0.0,
        };
        config.behavior.min_interval = 0.5;
        config.behavior.max_interval = 0.5;
        let mut overlay = OverlayRenderer::new(&host, config).unwrap();

        overlay.tick(DT);
        let button = button_under_head(&host, &mut overlay);

        // Decision at 0.5 s, action by 0.9 s, sequence over by 1.5 s, and the
        // next decision no earlier than 2.0 s.
        let mut first_activation = None;
        for tick in 1..100 {
            overlay.tick(DT);
            if first_activation.is_none() && host.borrow().activation_count(button) > 0 {
                first_activation = Some(tick);
            }
        }

        let first = first_activation.expect("button was never activated");
        assert!((45..=56).contains(&first), "activated at tick {}", first);
        assert_eq!(host.borrow().activation_count(button), 1);
        assert!(overlay.decisions() >= 1);
        assert_eq!(overlay.completed_interactions(), 1);
        assert!(!overlay.is_interacting());
        assert_eq!(overlay.behavior_state(), BehaviorState::Idle);
        let activated = overlay
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OverlayEvent::ControlActivated { .. }))
            .count();
        assert_eq!(activated, 1);
    }

    fn tab_strip(host: &Rc<RefCell<MemoryHost>>, overlay: &mut OverlayRenderer<MemoryHost>) -> ControlId {
        let tab = host
            .borrow_mut()
            .add_control(ControlKind::Tab, Rect::new(20.0, 20.0, 300.0, 30.0));
        host.borrow_mut().configure_indexed(tab, 3, 0);
        overlay.invalidate();
        tab
    }

    #[test]
    fn hidden_target_is_left_alone() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        let tab = tab_strip(&host, &mut overlay);

        overlay.play(Archetype::Bite, Some(tab)).unwrap();
        run(&mut overlay, 6);
        host.borrow_mut().set_visible(tab, false);
        overlay.invalidate();
        run(&mut overlay, 60);

        assert_eq!(host.borrow().state(tab).unwrap().index, 0);
        assert_eq!(overlay.completed_interactions(), 1);
        assert!(!overlay
            .drain_events()
            .iter()
            .any(|e| matches!(e, OverlayEvent::ControlActivated { .. })));
    }

    #[test]
    fn disabled_target_is_left_alone() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        let tab = tab_strip(&host, &mut overlay);

        overlay.play(Archetype::Bite, Some(tab)).unwrap();
        run(&mut overlay, 6);
        host.borrow_mut().set_enabled(tab, false);
        overlay.invalidate();
        run(&mut overlay, 60);

        assert_eq!(host.borrow().state(tab).unwrap().index, 0);
        assert_eq!(overlay.behavior_state(), BehaviorState::Idle);
    }

    #[test]
    fn live_target_is_advanced() {
        let (host, mut overlay) = setup();
        overlay.tick(DT);
        let tab = tab_strip(&host, &mut overlay);

        overlay.play(Archetype::Bite, Some(tab)).unwrap();
        run(&mut overlay, 66);
        assert_eq!(host.borrow().state(tab).unwrap().index, 1);
    }

    #[test]
    fn played_interaction_leaves_behavior_idle() {
        let (_host, mut overlay) = setup();
        overlay.tick(DT);
        overlay.play(Archetype::Look, None).unwrap();
        assert!(overlay.is_interacting());
        assert_eq!(overlay.behavior_state(), BehaviorState::Idle);
        assert!(overlay.character().next_decision_time > overlay.now());
    }

    #[test]
    fn squash_pulse_reaches_full_depth() {
        let (_host, mut overlay) = setup();
        overlay.tick(DT);
        overlay.play(Archetype::Bite, None).unwrap();

        run(&mut overlay, 17);
        assert_eq!(overlay.character().body.squash_factor, 1.0);

        run(&mut overlay, 2);
        assert!((overlay.character().body.squash_factor - 0.85).abs() < 1e-4);

        run(&mut overlay, 60);
        assert!((overlay.character().body.squash_factor - 1.0).abs() < 1e-3);
    }
}

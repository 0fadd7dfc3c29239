use glam::{Mat3, Mat4, Vec3};

use crate::behavior::state::AnimationState;
use crate::core::physics::PhysicsBody;

use super::instance::{DrawList, PrimitiveInstance, Shape};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Peak arm swing while walking, degrees.
pub const ARM_SWING_DEG: f32 = 20.0;
/// Animation phase advance, radians per second.
pub const PHASE_RATE: f32 = 6.0;

/// Named body points projected to screen space every frame for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Head,
    Mouth,
    LeftFoot,
    RightFoot,
    LeftHand,
    RightHand,
}

impl Anchor {
    pub const ALL: [Anchor; 6] = [
        Anchor::Head,
        Anchor::Mouth,
        Anchor::LeftFoot,
        Anchor::RightFoot,
        Anchor::LeftHand,
        Anchor::RightHand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Anchor::Head => "head",
            Anchor::Mouth => "mouth",
            Anchor::LeftFoot => "left_foot",
            Anchor::RightFoot => "right_foot",
            Anchor::LeftHand => "left_hand",
            Anchor::RightHand => "right_hand",
        }
    }

    pub fn from_name(name: &str) -> Option<Anchor> {
        Anchor::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Offset from the body center in model space.
    pub fn offset(self) -> Vec3 {
        match self {
            Anchor::Head => Vec3::new(0.0, 0.4, 0.0),
            Anchor::Mouth => Vec3::new(0.0, 0.35, 0.23),
            Anchor::LeftFoot => Vec3::new(-0.15, -0.3, 0.0),
            Anchor::RightFoot => Vec3::new(0.15, -0.3, 0.0),
            Anchor::LeftHand => Vec3::new(-0.25, 0.05, 0.0),
            Anchor::RightHand => Vec3::new(0.25, 0.05, 0.0),
        }
    }
}

#[derive(Clone, Copy)]
enum Swing {
    Fixed,
    /// Rotates about model X by +angle.
    Forward,
    /// Rotates about model X by -angle.
    Back,
}

struct Part {
    offset: Vec3,
    radius: f32,
    color: [f32; 4],
    swing: Swing,
}

const fn part(x: f32, y: f32, z: f32, radius: f32, color: [f32; 4]) -> Part {
    Part {
        offset: Vec3::new(x, y, z),
        radius,
        color,
        swing: Swing::Fixed,
    }
}

/// Rigid spheres making up the character, in draw order.
const PARTS: [Part; 15] = [
    part(0.0, 0.0, 0.0, 0.3, WHITE),   // torso
    part(0.0, 0.4, 0.0, 0.25, WHITE),  // head
    part(-0.15, 0.55, 0.0, 0.1, BLACK), // ears
    part(0.15, 0.55, 0.0, 0.1, BLACK),
    part(-0.1, 0.45, 0.2, 0.08, BLACK), // eye patches
    part(0.1, 0.45, 0.2, 0.08, BLACK),
    part(-0.1, 0.45, 0.22, 0.04, WHITE), // eyes
    part(0.1, 0.45, 0.22, 0.04, WHITE),
    part(-0.1, 0.45, 0.24, 0.02, BLACK), // pupils
    part(0.1, 0.45, 0.24, 0.02, BLACK),
    part(0.0, 0.4, 0.23, 0.03, BLACK), // nose
    part(-0.15, -0.2, 0.1, 0.12, BLACK), // legs
    part(0.15, -0.2, 0.1, 0.12, BLACK),
    Part {
        offset: Vec3::new(-0.25, 0.05, 0.0),
        radius: 0.1,
        color: BLACK,
        swing: Swing::Forward,
    },
    Part {
        offset: Vec3::new(0.25, 0.05, 0.0),
        radius: 0.1,
        color: BLACK,
        swing: Swing::Back,
    },
];

/// translate(position) · rotY(yaw) · scale(s, s·squash, s)
pub fn model_matrix(body: &PhysicsBody) -> Mat4 {
    Mat4::from_translation(body.position)
        * Mat4::from_rotation_y(body.rotation.to_radians())
        * Mat4::from_scale(body_scale(body))
}

fn body_scale(body: &PhysicsBody) -> Vec3 {
    Vec3::new(body.scale, body.scale * body.squash_factor, body.scale)
}

/// Anchor position in world space, following scale, squash and facing.
pub fn anchor_world(body: &PhysicsBody, anchor: Anchor) -> Vec3 {
    model_matrix(body).transform_point3(anchor.offset())
}

/// Current arm swing angle in degrees.
pub fn arm_angle(animation: AnimationState, phase: f32) -> f32 {
    if animation.swings_arms() {
        phase.sin() * ARM_SWING_DEG
    } else {
        0.0
    }
}

/// Append the character's spheres to the draw list.
pub fn draw_character(list: &mut DrawList, body: &PhysicsBody, animation: AnimationState, phase: f32) {
    let model = model_matrix(body);
    let scale = body_scale(body);
    let swing = arm_angle(animation, phase).to_radians();
    let yaw = body.rotation.to_radians();

    for p in PARTS.iter() {
        let local = match p.swing {
            Swing::Fixed => p.offset,
            Swing::Forward => Mat3::from_rotation_x(swing) * p.offset,
            Swing::Back => Mat3::from_rotation_x(-swing) * p.offset,
        };
        list.push(
            PrimitiveInstance::new(Shape::Sphere, model.transform_point3(local), p.radius, p.color)
                .with_scale(scale)
                .with_yaw(yaw),
        );
    }
}

/// Number of primitives one character contributes.
pub fn part_count() -> usize {
    PARTS.len()
}

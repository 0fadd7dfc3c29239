use glam::Vec3;

use crate::api::config::ShadowParams;
use crate::api::types::ItemKind;
use crate::core::items::ItemState;
use crate::core::physics::PhysicsBody;

use super::instance::{DrawList, PrimitiveInstance, Shape};

const TOY_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
const BAMBOO_COLOR: [f32; 4] = [0.4, 0.8, 0.3, 1.0];
const HAT_COLOR: [f32; 4] = [0.8, 0.2, 0.8, 1.0];

/// Soft elliptical shadow on the ground plane below the character.
pub fn draw_shadow(list: &mut DrawList, body: &PhysicsBody, params: &ShadowParams, ground_y: f32) {
    let center = Vec3::new(body.position.x, ground_y, body.position.z);
    list.push(
        PrimitiveInstance::new(Shape::Shadow, center, params.radius_x, [0.0, 0.0, 0.0, params.opacity])
            .with_scale(Vec3::new(
                params.radius_x * body.scale,
                1.0,
                params.radius_z * body.scale,
            ))
            .with_blur(params.blur),
    );
}

/// Append one item's primitives: a ball, a bamboo stick or a hat.
pub fn draw_item(list: &mut DrawList, item: &ItemState) {
    let body = &item.body;
    let s = body.scale;
    let sy = s * body.squash_factor;
    let yaw = body.rotation.to_radians();
    let pos = body.position;

    match item.kind {
        ItemKind::Toy => {
            list.push(
                PrimitiveInstance::new(Shape::Sphere, pos, 0.15, TOY_COLOR)
                    .with_scale(Vec3::new(s, sy, s))
                    .with_yaw(yaw),
            );
        }
        ItemKind::Food => {
            list.push(
                PrimitiveInstance::new(Shape::Cylinder, pos, 0.05, BAMBOO_COLOR)
                    .with_scale(Vec3::new(s, 0.3 * sy, s))
                    .with_yaw(yaw),
            );
        }
        ItemKind::Clothing => {
            list.push(
                PrimitiveInstance::new(Shape::Disk, pos, 0.2, HAT_COLOR)
                    .with_scale(Vec3::new(s, sy, s))
                    .with_yaw(yaw),
            );
            list.push(
                PrimitiveInstance::new(Shape::Cone, pos + Vec3::new(0.0, 0.05 * sy, 0.0), 0.15, HAT_COLOR)
                    .with_scale(Vec3::new(s, 0.2 * sy, s))
                    .with_yaw(yaw),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ItemId;

    #[test]
    fn each_item_kind_has_its_shape() {
        let mut list = DrawList::new();
        draw_item(&mut list, &ItemState::new(ItemId(1), ItemKind::Toy, Vec3::ZERO));
        draw_item(&mut list, &ItemState::new(ItemId(2), ItemKind::Food, Vec3::ZERO));
        draw_item(&mut list, &ItemState::new(ItemId(3), ItemKind::Clothing, Vec3::ZERO));
        assert_eq!(list.count_of(Shape::Sphere), 1);
        assert_eq!(list.count_of(Shape::Cylinder), 1);
        assert_eq!(list.count_of(Shape::Disk), 1);
        assert_eq!(list.count_of(Shape::Cone), 1);
    }

    #[test]
    fn shadow_sits_on_ground_below_body() {
        let mut list = DrawList::new();
        let body = PhysicsBody::at(Vec3::new(0.5, 1.0, -0.2));
        draw_shadow(&mut list, &body, &ShadowParams::default(), -0.8);
        let shadow = list.instances()[0];
        assert_eq!(shadow.kind(), Some(Shape::Shadow));
        assert_eq!(shadow.center(), Vec3::new(0.5, -0.8, -0.2));
        assert!((shadow.a - 0.3).abs() < 1e-6);
        assert!((shadow.blur - 10.0).abs() < 1e-6);
    }
}

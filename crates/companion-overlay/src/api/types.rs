use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque identifier for a host GUI node. Assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControlId(pub u64);

/// Identifier for a loose item spawned into the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// The closed set of control kinds the overlay knows how to play with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Slider,
    Tab,
    Combo,
    Checkbox,
    Textbox,
    Other,
}

impl ControlKind {
    /// Human-readable type name, as reported in control info.
    pub fn type_name(self) -> &'static str {
        match self {
            ControlKind::Button => "button",
            ControlKind::Slider => "slider",
            ControlKind::Tab => "tab",
            ControlKind::Combo => "combobox",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Textbox => "textbox",
            ControlKind::Other => "widget",
        }
    }
}

/// Axis-aligned rectangle in pixels. Origin top-left, Y down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: the left/top edges are inside, right/bottom are not.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

/// A reference to one interactive host control, with geometry cached at the
/// index rebuild that produced it.
///
/// Handles are snapshots: the rect and flags are only meaningful until the
/// next rebuild (see `generation`). Consumers must not keep them across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlHandle {
    pub id: ControlId,
    /// Rect in the shared coordinate space.
    pub rect: Rect,
    pub kind: ControlKind,
    pub enabled: bool,
    pub visible: bool,
    /// Generation of the index snapshot this handle was read from.
    pub generation: u64,
}

impl ControlHandle {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// Summary of a control for hosts and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlInfo {
    pub id: ControlId,
    pub type_name: &'static str,
    pub center: [f32; 2],
    pub rect: Rect,
    pub enabled: bool,
    pub visible: bool,
}

impl From<&ControlHandle> for ControlInfo {
    fn from(handle: &ControlHandle) -> Self {
        let center = handle.center();
        Self {
            id: handle.id,
            type_name: handle.kind.type_name(),
            center: [center.x, center.y],
            rect: handle.rect,
            enabled: handle.enabled,
            visible: handle.visible,
        }
    }
}

/// Kinds of loose items that can be dropped into the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Toy,
    Food,
    Clothing,
}

/// Events produced by the overlay during a frame, drained by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// The character's body center moved to a new overlay-local screen position.
    CharacterMoved { x: f32, y: f32 },
    /// A synthetic activation reached a live control.
    ControlActivated { id: ControlId, kind: ControlKind },
    /// The control under the character's feet changed (drives the shadow).
    ControlBelowChanged { id: Option<ControlId> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(100.0, 100.0, 50.0, 20.0);
        assert!(r.contains(Vec2::new(100.0, 100.0)));
        assert!(r.contains(Vec2::new(149.9, 119.9)));
        assert!(!r.contains(Vec2::new(150.0, 110.0)));
        assert!(!r.contains(Vec2::new(120.0, 120.0)));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(2.0, 2.0, 0.0, 5.0)));
    }

    #[test]
    fn control_info_uses_type_name_and_center() {
        let handle = ControlHandle {
            id: ControlId(7),
            rect: Rect::new(100.0, 100.0, 50.0, 20.0),
            kind: ControlKind::Combo,
            enabled: true,
            visible: true,
            generation: 1,
        };
        let info = ControlInfo::from(&handle);
        assert_eq!(info.type_name, "combobox");
        assert_eq!(info.center, [125.0, 110.0]);
    }
}

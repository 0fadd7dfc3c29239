// host/tree.rs
//
// Recursive visitor that flattens an abstract widget tree into descriptors.
// Toolkit adapters implement `WidgetNode` for their widget type and call
// `walk_widget_tree` from `HostWindow::enumerate_interactive_controls`.

use crate::api::types::{ControlId, Rect};
use super::window::{ControlDescriptor, NodeClass};

/// Minimal view of a toolkit widget.
pub trait WidgetNode {
    fn id(&self) -> ControlId;
    fn kind_of(&self) -> NodeClass;
    /// Geometry in the shared coordinate space.
    fn geometry(&self) -> Rect;
    fn is_visible(&self) -> bool;
    fn is_enabled(&self) -> bool;
    /// Visit direct children in paint order (back to front).
    fn for_each_child(&self, visit: &mut dyn FnMut(&dyn WidgetNode));
}

/// Flatten a widget tree in paint order (pre-order, parents before children).
///
/// Hidden nodes prune their whole subtree. A disabled node disables its
/// descendants, matching how toolkits propagate enablement.
pub fn walk_widget_tree(root: &dyn WidgetNode) -> Vec<ControlDescriptor> {
    let mut out = Vec::new();
    visit(root, None, true, &mut out);
    out
}

fn visit(
    node: &dyn WidgetNode,
    parent: Option<ControlId>,
    parent_enabled: bool,
    out: &mut Vec<ControlDescriptor>,
) {
    if !node.is_visible() {
        return;
    }
    let enabled = parent_enabled && node.is_enabled();
    let id = node.id();
    out.push(ControlDescriptor {
        id,
        parent,
        rect: node.geometry(),
        class: node.kind_of(),
        enabled,
        visible: true,
    });
    node.for_each_child(&mut |child| visit(child, Some(id), enabled, out));
}

//! Cursor marker overlays.
//!
//! Each viewer that shows a cursor marker owns up to two marks: the
//! primary mark tracking the cursor in that viewer, and a matched mark
//! mirroring a cursor that lives in some other viewer. Marks are created
//! lazily the first time a viewer needs one and toggled visible per event.

use glam::DVec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::viewer::ViewerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkRole {
    /// Tracks the cursor in the viewer it belongs to.
    Primary,
    /// Mirrors the cursor position from a matched viewer.
    Matched,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MarkShape {
    /// A point at a data-space position.
    Point { pos: DVec2 },
    /// A full-height vertical line at a data-space x.
    VerticalLine { x: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub shape: MarkShape,
    pub visible: bool,
}

#[derive(Default)]
pub struct MarkStore {
    marks: HashMap<(ViewerId, MarkRole), Mark>,
}

impl MarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places (or moves) a mark and makes it visible.
    pub fn show(&mut self, viewer: ViewerId, role: MarkRole, shape: MarkShape) {
        self.marks.insert(
            (viewer, role),
            Mark {
                shape,
                visible: true,
            },
        );
    }

    /// Hides the mark if it exists; lazily created marks that were never
    /// shown stay absent.
    pub fn hide(&mut self, viewer: ViewerId, role: MarkRole) {
        if let Some(mark) = self.marks.get_mut(&(viewer, role)) {
            mark.visible = false;
        }
    }

    pub fn hide_all(&mut self) {
        for mark in self.marks.values_mut() {
            mark.visible = false;
        }
    }

    pub fn get(&self, viewer: ViewerId, role: MarkRole) -> Option<&Mark> {
        self.marks.get(&(viewer, role))
    }

    pub fn visible(&self, viewer: ViewerId, role: MarkRole) -> bool {
        self.get(viewer, role).is_some_and(|m| m.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_move_hide() {
        let mut store = MarkStore::new();
        let viewer = ViewerId::unique();

        assert!(store.get(viewer, MarkRole::Primary).is_none());
        store.show(viewer, MarkRole::Primary, MarkShape::VerticalLine { x: 5.0 });
        assert!(store.visible(viewer, MarkRole::Primary));

        store.show(viewer, MarkRole::Primary, MarkShape::VerticalLine { x: 7.0 });
        assert_eq!(
            store.get(viewer, MarkRole::Primary).unwrap().shape,
            MarkShape::VerticalLine { x: 7.0 }
        );

        store.hide(viewer, MarkRole::Primary);
        assert!(!store.visible(viewer, MarkRole::Primary));
        // the mark object survives hiding
        assert!(store.get(viewer, MarkRole::Primary).is_some());
    }

    #[test]
    fn hide_all_spares_nothing() {
        let mut store = MarkStore::new();
        let a = ViewerId::unique();
        let b = ViewerId::unique();
        store.show(a, MarkRole::Primary, MarkShape::VerticalLine { x: 1.0 });
        store.show(b, MarkRole::Matched, MarkShape::VerticalLine { x: 2.0 });
        store.hide_all();
        assert!(!store.visible(a, MarkRole::Primary));
        assert!(!store.visible(b, MarkRole::Matched));
    }
}

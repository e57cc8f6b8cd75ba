//! Application event hub.
//!
//! Components that react to cursor activity do not call each other
//! directly; they publish on the [`Hub`] and consumers drain it. The model
//! is single threaded, so the hub is a plain queue.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::compass::CompassState;
use crate::viewer::ViewerId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HubEvent {
    /// User-facing warning, e.g. attempting to blink a single layer.
    Warning { text: String },
    /// Compass overlay should redraw with this state.
    CompassUpdate {
        viewer: ViewerId,
        state: CompassState,
    },
    /// Compass overlay should clear.
    CompassClear { viewer: ViewerId },
    /// A plugin line profile tracks the cursor and needs a refresh.
    LineProfileRefresh { viewer: ViewerId, x: f64, y: f64 },
    /// The viewer toolbar follows cursor presence.
    ToolbarEnabled { viewer: ViewerId, enabled: bool },
}

/// Cursor event kinds a viewer forwards to the coordinate readout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CursorEventKind {
    MouseMove,
    MouseEnter,
    MouseLeave,
    KeyPress,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorEvent {
    pub kind: CursorEventKind,
    /// Data-space position, present for mouse events.
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Pressed key, present for key events.
    pub key: Option<char>,
}

impl CursorEvent {
    pub fn mouse_move(x: f64, y: f64) -> Self {
        Self {
            kind: CursorEventKind::MouseMove,
            x: Some(x),
            y: Some(y),
            key: None,
        }
    }

    pub fn mouse_enter(x: f64, y: f64) -> Self {
        Self {
            kind: CursorEventKind::MouseEnter,
            x: Some(x),
            y: Some(y),
            key: None,
        }
    }

    pub fn mouse_leave() -> Self {
        Self {
            kind: CursorEventKind::MouseLeave,
            x: None,
            y: None,
            key: None,
        }
    }

    pub fn key_press(key: char) -> Self {
        Self {
            kind: CursorEventKind::KeyPress,
            x: None,
            y: None,
            key: Some(key),
        }
    }
}

#[derive(Default)]
pub struct Hub {
    events: Vec<HubEvent>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: HubEvent) {
        self.events.push(event);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.publish(HubEvent::Warning { text: text.into() });
    }

    /// Removes and returns everything published since the last drain.
    pub fn drain(&mut self) -> Vec<HubEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending(&self) -> &[HubEvent] {
        &self.events
    }
}

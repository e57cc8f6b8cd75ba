#![allow(dead_code)]
#![allow(unused_imports)]

pub mod cache;
pub mod compass;
pub mod data;
pub mod engine;
pub mod events;
pub mod marks;
pub mod scene;
pub mod snapshot;
pub mod units;
pub mod viewer;
pub mod wcs;

pub use engine::CoordsInfo;
pub use events::{CursorEvent, Hub};
pub use scene::Scene;
pub use snapshot::CursorSnapshot;
pub use viewer::{Viewer, ViewerKind, ViewerStore};

use std::path::Path;

use common::log_setup::setup_logging;
use skyview::engine::CoordsInfo;
use skyview::events::{CursorEvent, Hub};
use skyview::scene::Scene;

fn main() -> anyhow::Result<()> {
    setup_logging("info");

    let scene_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_resources/test_scene.yml");
    let scene = Scene::from_yaml_file(scene_path)?;
    let (dc, mut viewers) = scene.build();

    let mut hub = Hub::new();
    let mut coords = CoordsInfo::new();

    for (x, y) in [(0.5, 0.5), (2.0, 2.0), (3.4, 1.2)] {
        coords.handle_event(&dc, &mut viewers, &mut hub, "image-0", &CursorEvent::mouse_move(x, y));
        let (row1, row2, row3) = coords.rows.as_text();
        println!("cursor at ({x}, {y}):\n{row1}\n{row2}\n{row3}\n");
    }

    // blink to the other layer and read out again
    coords.handle_event(&dc, &mut viewers, &mut hub, "image-0", &CursorEvent::key_press('b'));
    let (row1, row2, row3) = coords.rows.as_text();
    println!("after blink:\n{row1}\n{row2}\n{row3}\n");

    for event in hub.drain() {
        tracing::info!(?event, "hub event");
    }
    Ok(())
}

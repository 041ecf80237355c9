//! Terminal room view over the simulator: watch the computed tag fix chase
//! the simulated tag around the anchors. Handy for eyeballing solver
//! behavior without hardware.

mod gui;

use std::sync::{Arc, Mutex};

use gui::engage_gui;
use pinpoint::config::SessionConfig;
use pinpoint::dummy_source::DummyLineSource;
use pinpoint::measurement_store::MeasurementStore;
use pinpoint::tracker::Tracker;
use pinpoint::Point;

fn main() {
    env_logger::init();

    let config = SessionConfig::default();
    let room = config.room;
    let layout = config
        .layout()
        .expect("default distances fit the default room");

    let aux_station = config.aux_anchor.map(|id| {
        (
            id,
            Point {
                x: room.width * 0.7,
                y: room.height * 0.75,
            },
        )
    });
    let mut stations: Vec<Point> = layout.anchors.to_vec();
    stations.extend(aux_station.map(|(_, p)| p));

    let source = Arc::new(Mutex::new(DummyLineSource::new(&layout, &room, aux_station)));
    let tick_source = Arc::clone(&source);

    let store = MeasurementStore::new();
    let tracker = Tracker::new(layout, config.aux_anchor);

    let _ = engage_gui(
        room,
        stations,
        Box::new(move || {
            for line in tick_source.lock().unwrap().by_ref() {
                store.ingest_line(&line);
            }
            // Clamp for display only; the solver output itself is raw.
            tracker.poll(&store).map(|fix| room.clamp(fix.position))
        }),
    );

    source.lock().unwrap().stop();
}

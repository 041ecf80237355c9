//! A stand-in for the radio: a background thread that synthesizes the
//! firmware's telemetry lines for a tag orbiting the room. Useful for the
//! monitor and for exercising the pipeline without hardware on the desk.

use rand::prelude::*;

use crate::layout::{AnchorLayout, RoomBounds};
use crate::measurement::{Id, LineSource};
use crate::Point;

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Simulated telemetry source. Lines appear in an internal buffer at a
/// steady cadence and are drained by iterating.
pub struct DummyLineSource {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    lines: Arc<Mutex<VecDeque<String>>>,
}

enum Signal {
    Noise(f64),
    Speed(f64),
    Stop,
}

impl DummyLineSource {
    /// Start the generator thread. The simulated tag circles the room
    /// center; `aux_station` places the auxiliary anchor, which reports
    /// ranges like any other.
    pub fn new(layout: &AnchorLayout, room: &RoomBounds, aux_station: Option<(Id, Point)>) -> Self {
        let (tx, rx) = mpsc::channel::<Signal>();
        let lines = Arc::new(Mutex::new(VecDeque::new()));
        let th_lines = Arc::clone(&lines);

        let mut stations: Vec<(Id, Point)> = layout
            .anchors
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as Id, p))
            .collect();
        stations.extend(aux_station);
        let center = Point {
            x: room.width / 2.0,
            y: room.height / 2.0,
        };
        let radius = 0.35 * room.width.min(room.height);

        let handle = thread::spawn(move || {
            let mut running = true;
            let mut noise = 0.01;
            let mut speed = 0.4; // radians per tick
            let mut phase: f64 = 0.0;
            while running {
                if let Ok(received) = rx.try_recv() {
                    match received {
                        Signal::Noise(new_noise) => noise = new_noise,
                        Signal::Speed(new_speed) => speed = new_speed,
                        Signal::Stop => running = false,
                    }
                }

                let tag = Point {
                    x: center.x + radius * phase.cos(),
                    y: center.y + radius * phase.sin(),
                };
                phase = (phase + speed) % (2.0 * PI);

                th_lines
                    .lock()
                    .unwrap()
                    .append(&mut render_lines(&stations, tag, noise));
                spin_sleep::sleep(Duration::from_millis(100));
            }
        });

        DummyLineSource {
            handle: Some(handle),
            tx,
            lines,
        }
    }

    /// Range noise amplitude in meters, uniform either way.
    pub fn set_noise(&self, noise: f64) {
        self.tx.send(Signal::Noise(noise)).unwrap();
    }

    /// Angular speed of the orbit, radians per tick.
    pub fn set_speed(&self, speed: f64) {
        self.tx.send(Signal::Speed(speed)).unwrap();
    }

    /// Stop the generator thread and wait for it.
    pub fn stop(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(thread) = self.handle.take() {
            thread.join().unwrap();
        }
    }
}

impl Iterator for DummyLineSource {
    type Item = String;
    fn next(&mut self) -> Option<Self::Item> {
        self.lines.lock().unwrap().pop_front()
    }
}

impl LineSource for DummyLineSource {
    fn clear(&mut self) {
        self.lines.lock().unwrap().clear();
    }
}

/// One tick's worth of telemetry: a distance line per station, some angle
/// lines, and the same garnish the real firmware produces (color codes,
/// boot chatter).
fn render_lines(stations: &[(Id, Point)], tag: Point, noise: f64) -> VecDeque<String> {
    let mut rng = thread_rng();
    let mut lines = VecDeque::new();

    for &(id, station) in stations {
        let mut range_m = station.distance_to(&tag);
        if noise > 0.0 {
            range_m += rng.gen_range(-noise..noise);
        }
        let cm = (range_m * 100.0).round().max(0.0) as i64;

        if rng.gen_bool(0.25) {
            // The firmware colors some log lines; the decoder must not care.
            lines.push_back(format!(
                "INFO : TWR[{id}].distance : \u{1b}[1;32m{cm}\u{1b}[0m"
            ));
        } else {
            lines.push_back(format!("INFO : TWR[{id}].distance : {cm}"));
        }
        lines.push_back(format!("INFO : TWR[{id}].nLos : 0"));
        if rng.gen_bool(0.5) {
            let azimuth = rng.gen_range(-60.0..60.0);
            lines.push_back(format!("INFO : TWR[{id}].aoa_azimuth : {azimuth:.1}"));
        }
    }
    if rng.gen_bool(0.1) {
        lines.push_back("SYS : ranging round complete".to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::measurement_store::MeasurementStore;

    #[test]
    fn rendered_lines_complete_a_measurement_set() {
        let room = RoomBounds {
            width: 10.0,
            height: 8.0,
        };
        let layout = compute_layout(6.0, 6.0, 6.0, &room).unwrap();
        let stations: Vec<(Id, Point)> = layout
            .anchors
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as Id, p))
            .collect();

        let store = MeasurementStore::new();
        for line in render_lines(&stations, Point { x: 4.0, y: 4.0 }, 0.0) {
            store.ingest_line(&line);
        }

        let set = store.try_take_complete_set(&[0, 1, 2]).unwrap();
        let expected = (layout.anchors[0].distance_to(&Point { x: 4.0, y: 4.0 }) * 100.0).round();
        assert_eq!(set.anchors[0].distance, Some(expected as i32));
        assert_eq!(set.anchors[0].n_los, Some(0));
    }

    #[test]
    fn source_buffers_and_clears() {
        let room = RoomBounds {
            width: 10.0,
            height: 8.0,
        };
        let layout = compute_layout(6.0, 6.0, 6.0, &room).unwrap();
        let mut source = DummyLineSource::new(&layout, &room, Some((3, Point { x: 1.0, y: 1.0 })));

        // The generator emits within its first tick.
        let mut tries = 0;
        while source.lines.lock().unwrap().is_empty() && tries < 50 {
            thread::sleep(Duration::from_millis(20));
            tries += 1;
        }
        assert!(source.next().is_some());

        source.clear();
        source.stop();
    }
}

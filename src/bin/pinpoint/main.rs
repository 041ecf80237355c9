//! Live tracking pipeline: serial (or simulated) telemetry in, position
//! fixes out on the log.

use clap::Parser;
use log::{info, warn};
use pinpoint::{
    args::{PinpointArgs, SerialCommand, SimulateCommand, SourceCommand},
    config::SessionConfig,
    dummy_source::DummyLineSource,
    gui::device_selector,
    layout::AnchorLayout,
    measurement_store::MeasurementStore,
    stage::{run_stage, LineToFix},
    tracker::{TagFix, Tracker},
    Point,
};

use serial2::SerialPort;
use std::{
    process::exit,
    str,
    sync::mpsc,
    thread::spawn,
    time::{Duration, Instant},
};

// Example:
// cargo run --bin pinpoint --
//                          --room-width  10
//                          --room-height 8
//                          --distances   6 6 6
//                          --aux         3 serial
//                          --port        /dev/ttyACM0

fn main() {
    env_logger::init();
    let args = PinpointArgs::parse();

    let config = session_config(&args);
    let layout = match config.layout() {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("cannot place anchors: {}", e);
            exit(1);
        }
    };
    info!(
        "anchors at {}, {}, {}",
        layout.anchors[0], layout.anchors[1], layout.anchors[2]
    );

    match args.command {
        SourceCommand::Serial(cmd) => run_serial(cmd, &config, layout),
        SourceCommand::Simulate(cmd) => run_simulated(cmd, &config, layout),
    }
}

/// Start from the config file (or defaults) and fold the commandline
/// overrides in on top.
fn session_config(args: &PinpointArgs) -> SessionConfig {
    let mut config = match &args.config {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("cannot read {}: {}", path.display(), e);
                exit(1);
            }
        },
        None => SessionConfig::default(),
    };

    if let Some(width) = args.room_width {
        config.room.width = width;
    }
    if let Some(height) = args.room_height {
        config.room.height = height;
    }
    if let Some(distances) = &args.distances {
        // clap guarantees exactly three values
        config.d01 = distances[0];
        config.d02 = distances[1];
        config.d12 = distances[2];
    }
    if let Some(id) = args.aux_anchor {
        config.aux_anchor = Some(id);
    }
    if let Some(hz) = args.update_hz {
        config.update_hz = hz;
    }
    config
}

fn log_fix(fix: &TagFix) {
    info!("tag at {}", fix.position);
    if let Some(level) = fix.proximity {
        info!("aux anchor proximity level {}", level.level());
    }
}

fn run_serial(cmd: SerialCommand, config: &SessionConfig, layout: AnchorLayout) {
    let port_path = match cmd.port {
        Some(path) => path,
        None => {
            let available =
                SerialPort::available_ports().expect("Failed to list serial devices");
            match device_selector(available) {
                Ok(Some(path)) => path,
                Ok(None) => {
                    eprintln!("no serial device selected");
                    return;
                }
                Err(e) => {
                    eprintln!("{}", e);
                    exit(1);
                }
            }
        }
    };

    let mut port = SerialPort::open(&port_path, cmd.baud).expect("Failed to open port");
    // Block in read() until the radio has something to say
    // (about 584,942,417,355 years, which is close enough to forever)
    port.set_read_timeout(Duration::MAX)
        .expect("Failed to set read timeout");
    info!("listening on {} at {} baud", port_path.display(), cmd.baud);

    let store = MeasurementStore::new();
    let tracker = Tracker::new(layout, config.aux_anchor);
    let (line_tx, line_rx) = mpsc::channel::<String>();
    let (fix_tx, fix_rx) = mpsc::channel();
    let stage = run_stage(LineToFix::new(store.clone(), tracker), line_rx, fix_tx);

    let _reader = spawn(move || {
        let mut buffer = [0; 256];
        let mut read_buf = Vec::new();

        loop {
            let read_len = match port.read(&mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    // Closing the channel below finalizes the stage, which
                    // clears the store; a reconnect starts from scratch.
                    warn!("serial link lost: {}", e);
                    break;
                }
            };

            for &c in buffer.iter().take(read_len) {
                read_buf.push(c);
                if c == b'\n' {
                    match str::from_utf8(&read_buf) {
                        Ok(s) => {
                            if line_tx.send(s.to_owned()).is_err() {
                                return;
                            }
                        }
                        // Often happens right after power-up while the
                        // hardware buffer still holds garbage
                        Err(e) => warn!("failed to decode utf-8: {:?}", e),
                    }
                    read_buf.clear();
                }
            }
        }
    });

    for fix in fix_rx.iter().flatten() {
        log_fix(&fix);
    }
    stage.join().expect("stage thread panicked");
}

fn run_simulated(cmd: SimulateCommand, config: &SessionConfig, layout: AnchorLayout) {
    let room = config.room;
    let aux_station = config.aux_anchor.map(|id| {
        (
            id,
            Point {
                x: room.width * 0.7,
                y: room.height * 0.75,
            },
        )
    });

    let mut source = DummyLineSource::new(&layout, &room, aux_station);
    source.set_noise(cmd.noise);
    let store = MeasurementStore::new();
    let tracker = Tracker::new(layout, config.aux_anchor);

    let period = Duration::from_secs_f32(1.0 / config.update_hz.max(1.0));
    let started = Instant::now();
    loop {
        for line in source.by_ref() {
            store.ingest_line(&line);
        }
        if let Some(fix) = tracker.poll(&store) {
            log_fix(&fix);
        }

        let done = cmd
            .seconds
            .is_some_and(|s| started.elapsed() >= Duration::from_secs(s));
        if done {
            break;
        }
        spin_sleep::sleep(period);
    }

    source.stop();
    store.clear();
}

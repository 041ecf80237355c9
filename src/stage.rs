//! Defines the Stage trait, to be used by each step of the tracking
//! pipeline. A stage consumes data from the preceding stage over a
//! channel, processes it, and passes new data to the subsequent stage, so
//! steps like line ingestion can run on their own threads.

use log::{info, warn};

use crate::measurement_store::MeasurementStore;
use crate::tracker::{TagFix, Tracker};

use std::fmt;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// What a stage can fail with while shutting down.
#[derive(Debug)]
pub enum StageError {
    /// An io failure while flushing stage state.
    IoError(std::io::Error),
}

/// One step of the tracking pipeline.
pub trait Stage: ToString {
    /// What the stage consumes.
    type InData;
    /// What the stage produces.
    type OutData;

    /// Converts an input of type `InData` into an output of type `OutData`.
    fn convert(&mut self, input: Self::InData) -> Self::OutData;

    /// Cleans up when the pipeline shuts down.
    fn finalize(&mut self) -> Result<(), StageError>;
}

/// Runs the given stage on its own thread. Each value received on `input`
/// is converted and sent to `output`; when the input channel closes, the
/// stage is finalized and the thread exits.
pub fn run_stage<S: Stage + Send + 'static>(
    mut stage: S,
    input: Receiver<S::InData>,
    output: Sender<S::OutData>,
) -> JoinHandle<()>
where
    S::InData: Send + 'static,
    S::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            let out_data = stage.convert(data);
            if let Err(error) = output.send(out_data) {
                warn!("{}: receiver hung up: {}", stage.to_string(), error);
                break;
            }
        }

        if let Err(stage_error) = stage.finalize() {
            warn!(
                "{}: error during shutdown: {:?}",
                stage.to_string(),
                stage_error
            );
        }
        info!("{}: terminated", stage.to_string());
    })
}

/// The whole core as a single stage: raw telemetry lines in, an
/// occasional fix out. `None` outputs just mean "no complete set yet".
pub struct LineToFix {
    store: MeasurementStore,
    tracker: Tracker,
    fixes: u64,
}

impl LineToFix {
    /// Wire a store and a tracker together into a stage.
    pub fn new(store: MeasurementStore, tracker: Tracker) -> Self {
        LineToFix {
            store,
            tracker,
            fixes: 0,
        }
    }
}

impl Stage for LineToFix {
    type InData = String;
    type OutData = Option<TagFix>;

    fn convert(&mut self, line: String) -> Option<TagFix> {
        self.store.ingest_line(&line);
        let fix = self.tracker.poll(&self.store);
        if fix.is_some() {
            self.fixes += 1;
        }
        fix
    }

    fn finalize(&mut self) -> Result<(), StageError> {
        self.store.clear();
        info!("line-to-fix: {} fixes this session", self.fixes);
        Ok(())
    }
}

impl fmt::Display for LineToFix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line-to-fix")
    }
}

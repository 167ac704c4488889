pub mod audio_model;
pub mod xtts_worker;

pub use audio_model::{AudioModelPort, Device, ModelError, SynthesisCall};
pub use xtts_worker::{DevicePreference, WorkerError, XttsWorker, XttsWorkerConfig};

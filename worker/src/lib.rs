//! Pipeline Worker (spec §4.6, component C6): drains the job queue and
//! drives each generation request through script, voice, video, and
//! composition stages to a finished `Video` row.

mod error;
mod pipeline;
mod runner;

pub use error::WorkerError;
pub use pipeline::PipelineWorker;
pub use pipeline::VEO_MAX_POLLS;
pub use pipeline::VEO_POLL_INTERVAL;
pub use runner::StartRateLimiter;
pub use runner::run;

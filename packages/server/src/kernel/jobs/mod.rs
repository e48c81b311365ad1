//! Scrape job queue: persistent job records, the enqueue service, and the
//! worker loop that executes jobs against the external source.

pub mod job;
pub mod service;
pub mod worker;

pub use job::{JobStatus, ScrapeJob, TargetType};
pub use service::{ScrapeRequest, ScrapeService};
pub use worker::{ScrapeWorker, WorkerConfig};

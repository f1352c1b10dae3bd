//! Sprite Gen - asynchronous generation task orchestration
//!
//! Submits jobs to remote image (LiblibAI) and 3D model (Tripo3D) services,
//! polls them to completion under a deadline, downloads the artifacts, and runs
//! sequential batches with skip-existing and bounded retries.

pub mod batch;
pub mod clock;
pub mod config;
pub mod extract;
pub mod http;
pub mod plan;
pub mod retrieve;
pub mod service;
pub mod services;
pub mod signing;
pub mod task;
pub mod wait;

#[cfg(test)]
mod testing;

pub use batch::{
    BatchItem, BatchItemOutcome, BatchOptions, BatchOrchestrator, BatchRun, PostProcess,
    RetryPolicy,
};
pub use clock::{CancelFlag, Clock, SystemClock};
pub use config::SpriteConfig;
pub use plan::{BatchPlan, PlanFile, PlannedItem};
pub use retrieve::{ArtifactRetriever, HttpRetriever};
pub use service::{
    styled_prompt, GenerationParams, PollStatus, Service, TaskInput, TaskRequest, TaskService,
};
pub use services::create_service;
pub use signing::Credentials;
pub use task::{GenerationTask, TaskReport, TaskState};
pub use wait::{PollTiming, TaskRunner};

//! Serial update queue for the shared map artifact
//!
//! Producers enqueue [`UpdateTask`]s from anywhere; a single worker task is the
//! only writer of the artifact and applies tasks strictly in submission order.

mod render;
mod task;
mod worker;

pub use render::{CollaboratorError, CommandRenderer, CompanionNotifier, Renderer, UpdateNotifier};
pub use task::{Locator, LocatorParseError, Point, UpdateTask};
pub use worker::{QueueMetrics, UpdateQueue, stage_fresh};

//! Engine layer for the Herald agent
//!
//! This crate turns resolved configuration into remote document
//! operations:
//!
//! - **SyncEngine**: push marked sections from source documents into
//!   their targets, writing only when content actually changed
//! - **ThreadLifecycle**: rotate scheduled threads, keep live thread
//!   bodies synced between rotations, and migrate predecessors
//!   (approval, pinning, redirect notice, link rewrites)
//! - **Runner**: the wakeup loop tying both together, sync first
//!
//! All remote access goes through the [`DocumentHost`] trait; the
//! engine itself never talks to a network. Failures of a single target
//! or item are captured in a [`TickReport`] rather than aborting the
//! pass.

pub mod endpoint;
pub mod error;
pub mod host;
pub mod report;
pub mod run;
pub mod sync;
pub mod thread;

pub use endpoint::EndpointId;
pub use error::{Error, Result};
pub use host::{CreatedPost, DocumentHost, HostError, HostResult, PostInfo};
pub use report::{
    PairReport, TargetOutcome, TargetReport, ThreadOutcome, ThreadReport, TickReport,
};
pub use run::Runner;
pub use sync::SyncEngine;
pub use thread::{AUTO_SYNC_PATTERN, ThreadLifecycle};

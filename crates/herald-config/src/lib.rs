//! Configuration and persistent state for the Herald agent
//!
//! This crate owns everything the agent reads before touching a remote
//! document:
//!
//! - **Static configuration**: TOML/JSON files describing accounts,
//!   sync items, and managed threads ([`model`], [`loader`])
//! - **Layer resolution**: folding defaults, item, and target overlays
//!   into validated per-item settings ([`resolver`])
//! - **Rotation intervals**: floating and fixed calendar schedules
//!   ([`interval`])
//! - **Dynamic state**: which thread is live per item, persisted
//!   atomically as JSON ([`state`], [`store`])
//! - **Single-instance locking** next to the state file ([`lock`])
//!
//! Static configuration is declarative and layered; each field of a
//! work item resolves from the most specific layer that set it. The
//! dynamic state file is the agent's only mutable record and its
//! updates are the commit points for thread rotation.

pub mod error;
pub mod interval;
pub mod loader;
pub mod lock;
pub mod model;
pub mod overlay;
pub mod paths;
pub mod resolver;
pub mod settings;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use interval::{FloatingUnit, IntervalParseError, IntervalSpec, IntervalUnit};
pub use loader::{load_static, write_example};
pub use lock::InstanceLock;
pub use model::{AccountSettings, EXAMPLE_CONFIG, StaticConfig, SyncItem, SyncModule, ThreadsModule};
pub use overlay::{
    EndpointOverlay, InitialOverlay, TargetContextOverlay, ThreadOverlay, flatten_context,
};
pub use paths::{default_config_path, default_state_path};
pub use resolver::{ConfigResolver, EndpointRole};
pub use settings::{
    DEFAULT_REDIRECT_TEMPLATE, DEFAULT_TITLE_TEMPLATE, EndpointKind, EndpointSettings,
    InitialThread, PinMode, SyncPair, SyncTarget, ThreadSettings, Toggle,
};
pub use state::{DynamicState, ThreadState};
pub use store::StateStore;

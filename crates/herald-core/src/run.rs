//! The wakeup loop
//!
//! Each tick runs every sync pair first, then rotates due threads.
//! `current_thread` targets resolve against state as it stood at
//! wakeup, so a rotation is picked up by sync on the next tick; the
//! rotation itself seeds the fresh body from the same sources.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use herald_config::{ConfigResolver, StateStore, StaticConfig};

use crate::Result;
use crate::host::DocumentHost;
use crate::report::{PairReport, ThreadReport, TickReport};
use crate::sync::SyncEngine;
use crate::thread::ThreadLifecycle;

/// Drives one configured agent, one tick per wakeup.
pub struct Runner<'a> {
    host: &'a (dyn DocumentHost + Sync),
    config: &'a StaticConfig,
    store: StateStore,
}

impl<'a> Runner<'a> {
    pub fn new(
        host: &'a (dyn DocumentHost + Sync),
        config: &'a StaticConfig,
        store: StateStore,
    ) -> Self {
        Self {
            host,
            config,
            store,
        }
    }

    /// One full pass over every configured item.
    ///
    /// # Errors
    ///
    /// Returns an error only when the state file cannot be loaded or
    /// saved; per-item problems are reported in the [`TickReport`].
    pub fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let resolver = ConfigResolver::new(self.config);
        let mut state = self.store.load()?;
        let loaded = state.clone();
        let mut report = TickReport::default();

        // Seed thread records up front so alias targets can resolve an
        // adopted thread on the very first tick.
        let thread_items = resolver.thread_items();
        for settings in thread_items.iter().filter_map(|(_, item)| item.as_ref().ok()) {
            if settings.enabled {
                state.thread_entry(settings);
            }
        }
        let thread_ids: BTreeMap<String, String> = state
            .threads
            .iter()
            .filter_map(|(key, record)| record.thread_id.clone().map(|id| (key.clone(), id)))
            .collect();

        let engine = SyncEngine::with_thread_ids(self.host, thread_ids);
        for (key, pair) in resolver.sync_pairs() {
            match pair {
                Ok(pair) => report.pairs.push(engine.sync_pair(&pair)),
                Err(error) => report
                    .pairs
                    .push(PairReport::source_failed(&key, error.to_string())),
            }
        }

        let lifecycle = ThreadLifecycle::new(self.host, &self.store);
        for (key, item) in thread_items {
            match item {
                Ok(settings) if !settings.enabled => {
                    debug!(item = %key, "thread item disabled");
                }
                Ok(settings) => {
                    report.threads.push(lifecycle.manage(&settings, &mut state, now));
                }
                Err(error) => report.threads.push(ThreadReport::failed(&key, error.to_string())),
            }
        }

        // Rotations flush their own commits. This save covers record
        // seeding and adoption timestamps, and retries a rotation flush
        // that failed mid-tick.
        if state != loaded {
            self.store.save(&state)?;
        }
        Ok(report)
    }

    /// Run ticks until `stop` is raised, sleeping `wake_interval_secs`
    /// between passes.
    ///
    /// # Errors
    ///
    /// Stops at the first tick-level error; supervision and restart
    /// belong to the caller.
    pub fn run_loop(&self, stop: &AtomicBool) -> Result<()> {
        let wake = Duration::from_secs(self.config.wake_interval_secs.max(1));
        info!(interval_secs = wake.as_secs(), "agent loop started");

        while !stop.load(Ordering::Relaxed) {
            let report = self.run_tick(Utc::now())?;
            info!(summary = %report.summary(), "tick complete");

            // Sleep in short slices so a stop request lands promptly.
            let mut remaining = wake;
            while !remaining.is_zero() && !stop.load(Ordering::Relaxed) {
                let slice = remaining.min(Duration::from_millis(200));
                std::thread::sleep(slice);
                remaining -= slice;
            }
        }

        info!("agent loop stopped");
        Ok(())
    }
}

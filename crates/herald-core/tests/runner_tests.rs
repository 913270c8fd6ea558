//! End-to-end tick tests for the Runner

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use herald_config::StateStore;
use herald_core::{Runner, TargetOutcome, ThreadOutcome, TickReport};
use herald_test_utils::{MemoryHost, base_config, config_from_toml, datetime};

const OBSERVING_TEMPLATE: &str =
    "[](/# Thread Body Start)\n\nShare what you can see tonight.\n\n[](/# Thread Body End)";

const INTRO_TEMPLATE: &str = "[](/# Intro Start)\n\ntonight: meteor shower\n\n[](/# Intro End)";

/// One thread item plus a sync item feeding its live thread; both read
/// the same source section, so rotation and the alias pair push the
/// same content.
const AGENT_ITEMS: &str = r#"
[threads.items.observing]
title_template = "Observing #{thread_number}"
interval = "monthly"

[threads.items.observing.source]
name = "intro-template"
pattern = "Intro"

[sync.items.intro.source]
name = "intro-template"
pattern = "Intro"

[sync.items.intro.targets.live]
kind = "current_thread"
name = "observing"
pattern = "Auto Sync"
"#;

fn agent_host() -> MemoryHost {
    let host = MemoryHost::new();
    host.seed_wiki("pics", "observing-template", OBSERVING_TEMPLATE);
    host.seed_wiki("pics", "intro-template", INTRO_TEMPLATE);
    host
}

#[test]
fn test_tick_syncs_then_rotates() {
    let config = base_config(AGENT_ITEMS);
    let host = agent_host();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("state.json"));
    let runner = Runner::new(&host, &config, store.clone());

    // First tick: sync runs before the lifecycle, so the alias has no
    // thread to point at yet; the bootstrap rotation then seeds the
    // body from the same source.
    let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();
    match &report.pairs[0].targets[0].outcome {
        TargetOutcome::Failed { reason } => {
            assert!(reason.contains("no live thread"), "got: {reason}");
        }
        other => panic!("expected a cold-start failure, got {other:?}"),
    }
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0001".to_string(),
            thread_number: 1,
        }
    );
    assert_eq!(
        host.post_body("t3_0001").unwrap(),
        "[](/# Auto Sync Start)\n\ntonight: meteor shower\n\n[](/# Auto Sync End)",
    );
    assert_eq!(
        store.load().unwrap().threads["observing"].thread_id.as_deref(),
        Some("t3_0001"),
    );

    // Same month again: the alias now reaches the live thread, and the
    // rotation already wrote exactly what both paths push.
    let report = runner.run_tick(datetime(2024, 5, 20, 6, 0)).unwrap();
    assert_eq!(report.pairs[0].targets[0].outcome, TargetOutcome::Unchanged);
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Unchanged,
        }
    );
    assert!(!report.has_failures());
    assert_eq!(host.created_ids().len(), 1);
    assert_eq!(host.write_count(), 0);

    // Next month: a successor is posted and the redirect lands in the
    // old thread. The alias still pointed at the old thread this tick.
    let report = runner.run_tick(datetime(2024, 6, 1, 0, 10)).unwrap();
    assert_eq!(report.pairs[0].targets[0].outcome, TargetOutcome::Unchanged);
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0002".to_string(),
            thread_number: 2,
        }
    );
    assert!(
        host.post_body("t3_0002")
            .unwrap()
            .contains("tonight: meteor shower")
    );
    assert!(
        host.post_body("t3_0001")
            .unwrap()
            .starts_with("This thread is no longer being updated")
    );
    assert_eq!(
        store.load().unwrap().threads["observing"].thread_id.as_deref(),
        Some("t3_0002"),
    );

    // The tick after the rotation, the alias follows the state forward.
    let report = runner.run_tick(datetime(2024, 6, 15, 6, 0)).unwrap();
    assert_eq!(report.pairs[0].targets[0].outcome, TargetOutcome::Unchanged);
    assert!(!report.has_failures());
    assert_eq!(host.created_ids().len(), 2);
}

#[test]
fn test_alias_reaches_an_adopted_thread_on_the_first_tick() {
    let config = base_config(&format!(
        "{AGENT_ITEMS}\n[threads.items.observing.initial]\nthread_id = \"t3_adopted\"\n"
    ));
    let host = agent_host();
    host.seed_post(
        "pics",
        "t3_adopted",
        "[](/# Auto Sync Start)\n\nstale intro\n\n[](/# Auto Sync End)",
        datetime(2024, 5, 10, 9, 0),
    );
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("state.json"));
    let runner = Runner::new(&host, &config, store.clone());

    let report = runner.run_tick(datetime(2024, 5, 20, 6, 0)).unwrap();

    // The configured thread is reachable before any rotation ever ran.
    assert_eq!(report.pairs[0].targets[0].outcome, TargetOutcome::Updated);
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Unchanged,
        }
    );
    assert!(host.created_ids().is_empty());
    assert!(
        host.post_body("t3_adopted")
            .unwrap()
            .contains("tonight: meteor shower")
    );

    // Record seeding and the adoption timestamp were persisted.
    let saved = store.load().unwrap();
    assert_eq!(saved.threads["observing"].thread_id.as_deref(), Some("t3_adopted"));
    assert_eq!(
        saved.threads["observing"].last_post_time,
        Some(datetime(2024, 5, 10, 9, 0)),
    );
}

#[test]
fn test_tick_reports_broken_items_without_stopping() {
    let config = base_config(
        r#"
[threads.items.broken]
account = "ghost"
interval = "monthly"

[threads.items.broken.source]
name = "observing-template"
pattern = "Thread Body"

[sync.items.empty.source]
name = "rules"
pattern = "Rules"

[sync.items.good.source]
name = "rules"
pattern = "Rules"

[sync.items.good.targets.mirror]
name = "rules-mirror"
"#,
    );

    let host = MemoryHost::new();
    host.seed_wiki(
        "pics",
        "rules",
        "[](/# Rules Start)\n\n1. be nice\n\n[](/# Rules End)",
    );
    host.seed_wiki(
        "pics",
        "rules-mirror",
        "[](/# Rules Start)\nstale\n[](/# Rules End)",
    );

    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("state.json"));
    let runner = Runner::new(&host, &config, store);

    let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();

    assert!(report.has_failures());

    assert_eq!(report.threads.len(), 1);
    assert_eq!(report.threads[0].key, "broken");
    match &report.threads[0].outcome {
        ThreadOutcome::Failed { reason } => {
            assert!(reason.contains("Unknown account `ghost`"), "got: {reason}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }

    assert_eq!(report.pairs.len(), 2);
    assert_eq!(report.pairs[0].key, "empty");
    let reason = report.pairs[0].source_error.as_deref().unwrap();
    assert!(reason.contains("declares no targets"), "got: {reason}");

    // The healthy item still ran.
    assert_eq!(report.pairs[1].key, "good");
    assert_eq!(report.pairs[1].targets[0].outcome, TargetOutcome::Updated);
    assert!(
        host.wiki("pics", "rules-mirror")
            .unwrap()
            .contains("1. be nice")
    );
}

#[test]
fn test_disabled_items_produce_an_empty_tick() {
    let config = base_config(
        r#"
[threads.items.observing]
enabled = false
interval = "monthly"

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"

[sync.items.intro]
enabled = false

[sync.items.intro.source]
name = "intro-template"
pattern = "Intro"

[sync.items.intro.targets.live]
name = "intro-mirror"
"#,
    );
    let host = agent_host();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("state.json"));
    let runner = Runner::new(&host, &config, store);

    let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();

    assert_eq!(report, TickReport::default());
    assert!(host.created_ids().is_empty());
    assert_eq!(host.write_count(), 0);
}

#[test]
fn test_loop_stops_between_ticks_on_request() {
    let config = config_from_toml(
        r#"
wake_interval_secs = 1

[accounts.bot]
site = "example"

[defaults]
account = "bot"
community = "pics"

[threads.items.observing]
interval = "monthly"

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"
"#,
    );
    let host = agent_host();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("state.json"));
    let runner = Runner::new(&host, &config, store);

    let stop = AtomicBool::new(false);
    std::thread::scope(|scope| {
        let handle = scope.spawn(|| runner.run_loop(&stop));
        std::thread::sleep(Duration::from_millis(300));
        stop.store(true, Ordering::Relaxed);
        handle
            .join()
            .expect("loop thread should not panic")
            .expect("loop should stop cleanly");
    });

    // Exactly one tick ran before the stop request landed.
    assert_eq!(host.created_ids().len(), 1);
}

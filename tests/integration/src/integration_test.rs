//! End-to-end integration test for the full agent tick
//!
//! These tests drive [`Runner`] from a configuration file on disk, the
//! way the deployed agent runs: load the config, tick, then check the
//! remote documents and the state file afterwards.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use herald_config::{DynamicState, StateStore, ThreadState, load_static};
use herald_core::{Runner, TargetOutcome, ThreadOutcome};
use herald_test_utils::{MemoryHost, datetime};

/// Full agent configuration: one source fanned out to a sidebar widget
/// and the live thread, plus the managed thread reading the same
/// template.
const AGENT_CONFIG: &str = r#"
wake_interval_secs = 45

[accounts.main_bot]
site = "example"

[defaults]
account = "main_bot"
community = "astronomy"

[defaults.context]
signoff = "clear skies"

[sync.items.observing.source]
name = "observing-template"
pattern = "Thread Body"

[sync.items.observing.targets.live]
kind = "current_thread"
name = "observing"
pattern = "Auto Sync"

[sync.items.observing.targets.sidebar]
kind = "widget"
name = "Observing Widget"
pattern = false
truncate_lines = 4

[[sync.items.observing.targets.sidebar.replace_patterns]]
find = "Share what you can see tonight."
replace = "Tonight's sky:"

[threads.items.observing]
title_template = "What's up in {community}? (#{thread_number})"
interval = "monthly"

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"
"#;

/// Threads-only configuration with every migration step switched on.
const ROTATION_CONFIG: &str = r#"
[accounts.main_bot]
site = "example"

[defaults]
account = "main_bot"
community = "astronomy"

[defaults.context]
signoff = "clear skies"

[threads.items.observing]
title_template = "What's up in {community}? (#{thread_number})"
interval = "monthly"
redirect_template = "Moved to [{post_title}]({thread_url}), {signoff}"
link_update_pages = ["index"]

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"
"#;

const JSON_CONFIG: &str = r#"
{
  "accounts": { "main_bot": { "site": "example" } },
  "defaults": { "account": "main_bot", "community": "astronomy" },
  "sync": {
    "items": {
      "rules": {
        "source": { "name": "rules", "pattern": "Rules" },
        "targets": { "mirror": { "name": "rules-mirror", "pattern": "Rules" } }
      }
    }
  }
}
"#;

/// The template's section as it lands in a generated thread body.
const LIVE_BODY: &str = "[](/# Auto Sync Start)\n\n\
     Share what you can see tonight.\n\
     Planets, clusters, the museum schedule.\n\
     Be kind to newcomers.\n\
     Clear skies!\n\n\
     [](/# Auto Sync End)";

fn write_config(temp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Host seeded with the wiki pages and widget the configuration points
/// at.
fn seeded_host() -> MemoryHost {
    let host = MemoryHost::new();
    host.seed_wiki(
        "astronomy",
        "observing-template",
        "[](/# Thread Body Start)\n\n\
         Share what you can see tonight.\n\
         Planets, clusters, the museum schedule.\n\
         Be kind to newcomers.\n\
         Clear skies!\n\n\
         [](/# Thread Body End)\n",
    );
    host.seed_widget("astronomy", "Observing Widget", "old widget text");
    host
}

#[test]
fn test_first_tick_bootstraps_and_syncs() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "config.toml", AGENT_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();

    // The thread item bootstraps its first post from the template.
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0001".to_string(),
            thread_number: 1,
        }
    );
    assert!(report.threads[0].warnings.is_empty());
    assert_eq!(
        host.post_title("t3_0001").unwrap(),
        "What's up in astronomy? (#1)"
    );
    assert_eq!(host.post_body("t3_0001").unwrap(), LIVE_BODY);
    assert_eq!(host.approvals(), vec!["t3_0001".to_string()]);
    // No predecessor, so there is no pin slot to mirror.
    assert!(host.pinned_in("astronomy").is_empty());

    // Sync ran before the rotation, so the alias had nothing to point
    // at yet; the widget fanout still landed.
    match &report.pairs[0].targets[0].outcome {
        TargetOutcome::Failed { reason } => {
            assert!(reason.contains("no live thread"), "got: {reason}");
        }
        other => panic!("expected a cold-start failure, got {other:?}"),
    }
    assert_eq!(report.pairs[0].targets[1].key, "sidebar");
    assert_eq!(
        host.widget("astronomy", "Observing Widget").unwrap(),
        "\n\nTonight's sky:\nPlanets, clusters, the museum schedule.\n\n"
    );
    assert_eq!(
        report.summary(),
        "1 updated, 0 unchanged, 1 failed; 1 rotated, 0 thread failures"
    );

    // The state file records the live thread.
    let state = StateStore::new(&state_path).load().unwrap();
    assert_eq!(
        state.threads.get("observing"),
        Some(&ThreadState {
            thread_id: Some("t3_0001".to_string()),
            thread_number: 1,
            last_post_time: Some(datetime(2024, 5, 1, 6, 0)),
        })
    );
}

#[test]
fn test_repeat_tick_within_the_period_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "config.toml", AGENT_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));

    // Bootstrap tick; the alias only fails while no thread exists.
    runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();

    let second = runner.run_tick(datetime(2024, 5, 10, 6, 0)).unwrap();
    assert!(!second.has_failures());
    let writes_so_far = host.write_count();

    // Steady state: every document already matches its source.
    let third = runner.run_tick(datetime(2024, 5, 20, 6, 0)).unwrap();
    assert_eq!(
        third.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Unchanged,
        }
    );
    for target in &third.pairs[0].targets {
        assert_eq!(target.outcome, TargetOutcome::Unchanged);
    }
    assert_eq!(
        third.summary(),
        "0 updated, 3 unchanged, 0 failed; 0 rotated, 0 thread failures"
    );
    assert_eq!(host.write_count(), writes_so_far);
    assert_eq!(host.created_ids(), vec!["t3_0001".to_string()]);
}

#[test]
fn test_rotation_migrates_the_retiring_thread() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "config.toml", ROTATION_CONFIG);
    let state_path = temp.path().join("state.json");

    let host = seeded_host();
    host.seed_post(
        "astronomy",
        "t3_old",
        "Old observing notes.",
        datetime(2024, 4, 15, 0, 0),
    );
    host.pin_existing("astronomy", "t3_old");
    host.seed_wiki(
        "astronomy",
        "index",
        "Megathread archive\n\nLatest: https://host.example/astronomy/comments/t3_old\n",
    );

    // A previous process left the April thread in the state file.
    let mut state = DynamicState::default();
    state.threads.insert(
        "observing".to_string(),
        ThreadState {
            thread_id: Some("t3_old".to_string()),
            thread_number: 6,
            last_post_time: Some(datetime(2024, 4, 15, 0, 0)),
        },
    );
    StateStore::new(&state_path).save(&state).unwrap();

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(datetime(2024, 5, 1, 0, 30)).unwrap();

    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0001".to_string(),
            thread_number: 7,
        }
    );
    assert!(report.threads[0].warnings.is_empty());

    // Successor live, predecessor redirected, pin slot carried over,
    // and the archive link rewritten.
    assert_eq!(
        host.post_title("t3_0001").unwrap(),
        "What's up in astronomy? (#7)"
    );
    assert_eq!(host.post_body("t3_0001").unwrap(), LIVE_BODY);
    assert_eq!(
        host.post_body("t3_old").unwrap(),
        "Moved to [What's up in astronomy? (#7)](https://host.example/astronomy/comments/t3_0001), clear skies\n\nOld observing notes."
    );
    assert_eq!(host.pinned_in("astronomy"), vec!["t3_0001".to_string()]);
    assert_eq!(
        host.wiki("astronomy", "index").unwrap(),
        "Megathread archive\n\nLatest: https://host.example/astronomy/comments/t3_0001\n"
    );

    let saved = StateStore::new(&state_path).load().unwrap();
    assert_eq!(
        saved.threads.get("observing"),
        Some(&ThreadState {
            thread_id: Some("t3_0001".to_string()),
            thread_number: 7,
            last_post_time: Some(datetime(2024, 5, 1, 0, 30)),
        })
    );
}

#[test]
fn test_template_edits_reach_the_live_thread_between_rotations() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "config.toml", ROTATION_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));

    let first = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();
    assert!(matches!(first.threads[0].outcome, ThreadOutcome::Rotated { .. }));
    assert_eq!(host.post_body("t3_0001").unwrap(), LIVE_BODY);

    // A moderator edits the template mid-month.
    host.seed_wiki(
        "astronomy",
        "observing-template",
        "[](/# Thread Body Start)\n\nComet week! Get outside.\n\n[](/# Thread Body End)\n",
    );

    let second = runner.run_tick(datetime(2024, 5, 15, 6, 0)).unwrap();
    assert_eq!(
        second.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Updated,
        }
    );
    assert_eq!(
        host.post_body("t3_0001").unwrap(),
        "[](/# Auto Sync Start)\n\nComet week! Get outside.\n\n[](/# Auto Sync End)",
    );
}

#[test]
fn test_json_config_drives_the_same_engine() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, "config.json", JSON_CONFIG);
    let state_path = temp.path().join("state.json");

    let host = MemoryHost::new();
    host.seed_wiki(
        "astronomy",
        "rules",
        "[](/# Rules Start)\n\n## be nice\n\n[](/# Rules End)\n",
    );
    host.seed_wiki(
        "astronomy",
        "rules-mirror",
        "Mirror of the rules.\n\n[](/# Rules Start)\nstale\n[](/# Rules End)\n",
    );

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));

    let first = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();
    assert_eq!(first.pairs[0].targets[0].outcome, TargetOutcome::Updated);
    assert_eq!(
        host.wiki("astronomy", "rules-mirror").unwrap(),
        "Mirror of the rules.\n\n[](/# Rules Start)\n\n## be nice\n\n[](/# Rules End)\n"
    );

    let second = runner.run_tick(datetime(2024, 5, 1, 7, 0)).unwrap();
    assert_eq!(second.pairs[0].targets[0].outcome, TargetOutcome::Unchanged);
    assert_eq!(host.write_count(), 1);
}

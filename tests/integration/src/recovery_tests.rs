//! Restart and contention scenarios
//!
//! Several short-lived [`Runner`]s share one state file here, the way
//! successive agent processes would. A restart must pick up exactly
//! where the file says the previous process stopped.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use herald_config::{InstanceLock, StateStore, ThreadState, load_static};
use herald_core::{Runner, TargetOutcome, ThreadOutcome};
use herald_test_utils::{MemoryHost, datetime};

const ROTATING_CONFIG: &str = r#"
[accounts.main_bot]
site = "example"

[defaults]
account = "main_bot"
community = "astronomy"

[threads.items.observing]
title_template = "Observing Megathread #{thread_number}"
interval = "monthly"

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"
"#;

/// Same item, but adopting a thread that predates the agent.
const ADOPTING_CONFIG: &str = r#"
[accounts.main_bot]
site = "example"

[defaults]
account = "main_bot"
community = "astronomy"

[threads.items.observing]
title_template = "Observing Megathread #{thread_number}"
interval = "monthly"

[threads.items.observing.initial]
thread_id = "t3_adopted"
thread_number = 6

[threads.items.observing.source]
name = "observing-template"
pattern = "Thread Body"
"#;

fn write_config(temp: &TempDir, contents: &str) -> PathBuf {
    let path = temp.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

fn seeded_host() -> MemoryHost {
    let host = MemoryHost::new();
    host.seed_wiki(
        "astronomy",
        "observing-template",
        "[](/# Thread Body Start)\n\nFresh month, fresh sky.\n\n[](/# Thread Body End)\n",
    );
    host
}

#[test]
fn test_restart_resumes_numbering_from_the_state_file() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, ROTATING_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();
    let config = load_static(&config_path).unwrap();

    // First process bootstraps the thread, then exits.
    {
        let runner = Runner::new(&host, &config, StateStore::new(&state_path));
        let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();
        assert_eq!(
            report.threads[0].outcome,
            ThreadOutcome::Rotated {
                thread_id: "t3_0001".to_string(),
                thread_number: 1,
            }
        );
    }

    // A fresh process within the same month only maintains the body,
    // which the bootstrap already wrote in its final form.
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(datetime(2024, 5, 20, 6, 0)).unwrap();
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Unchanged,
        }
    );
    assert_eq!(host.created_ids(), vec!["t3_0001".to_string()]);

    // Next month it rotates and keeps counting where the file left off.
    let report = runner.run_tick(datetime(2024, 6, 1, 0, 5)).unwrap();
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0002".to_string(),
            thread_number: 2,
        }
    );
    assert!(
        host.post_body("t3_0001")
            .unwrap()
            .starts_with("This thread is no longer being updated")
    );
}

#[test]
fn test_adopted_thread_age_is_persisted_by_the_first_tick() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, ADOPTING_CONFIG);
    let state_path = temp.path().join("state.json");

    let host = seeded_host();
    host.seed_post(
        "astronomy",
        "t3_adopted",
        "[](/# Auto Sync Start)\n\nExisting discussion.\n\n[](/# Auto Sync End)",
        datetime(2024, 5, 10, 9, 0),
    );

    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));

    // Mid-May the adopted thread is still current, so nothing rotates.
    // Its body is pulled up to date and the looked-up creation time
    // lands in the state file.
    let report = runner.run_tick(datetime(2024, 5, 20, 12, 0)).unwrap();
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Synced {
            body: TargetOutcome::Updated,
        }
    );
    assert!(host.created_ids().is_empty());

    let state = StateStore::new(&state_path).load().unwrap();
    assert_eq!(
        state.threads.get("observing"),
        Some(&ThreadState {
            thread_id: Some("t3_adopted".to_string()),
            thread_number: 6,
            last_post_time: Some(datetime(2024, 5, 10, 9, 0)),
        })
    );

    // Come June a new process retires the adopted thread like any
    // other predecessor.
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(datetime(2024, 6, 2, 0, 0)).unwrap();
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0001".to_string(),
            thread_number: 7,
        }
    );
    assert!(
        host.post_body("t3_adopted")
            .unwrap()
            .starts_with("This thread is no longer being updated")
    );
}

#[test]
fn test_rotation_replays_when_the_commit_never_landed() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, ROTATING_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();
    let config = load_static(&config_path).unwrap();

    let now = datetime(2024, 5, 1, 6, 0);
    {
        let runner = Runner::new(&host, &config, StateStore::new(&state_path));
        runner.run_tick(now).unwrap();
    }

    // Crash window: the post exists but the flush never reached disk.
    fs::remove_file(&state_path).unwrap();

    // The restarted process cannot know about the orphan and posts
    // again. Duplicates are possible; missed rotations are not.
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(now).unwrap();
    assert_eq!(
        report.threads[0].outcome,
        ThreadOutcome::Rotated {
            thread_id: "t3_0002".to_string(),
            thread_number: 1,
        }
    );
    assert_eq!(
        host.created_ids(),
        vec!["t3_0001".to_string(), "t3_0002".to_string()]
    );

    let state = StateStore::new(&state_path).load().unwrap();
    assert_eq!(
        state
            .threads
            .get("observing")
            .and_then(|record| record.thread_id.clone()),
        Some("t3_0002".to_string())
    );
}

#[test]
fn test_unreadable_state_stops_the_tick_before_any_host_write() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, ROTATING_CONFIG);
    // The state path cannot be opened: its parent is a regular file.
    fs::write(temp.path().join("blocked"), "not a directory").unwrap();
    let state_path = temp.path().join("blocked").join("state.json");

    let host = seeded_host();
    let config = load_static(&config_path).unwrap();
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));

    assert!(runner.run_tick(datetime(2024, 5, 1, 6, 0)).is_err());
    assert!(host.created_ids().is_empty());
    assert_eq!(host.write_count(), 0);
}

#[test]
fn test_second_agent_instance_is_locked_out() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(&temp, ROTATING_CONFIG);
    let state_path = temp.path().join("state.json");
    let host = seeded_host();
    let config = load_static(&config_path).unwrap();

    let lock_path = InstanceLock::path_for(&state_path);
    let held = InstanceLock::acquire(&lock_path).unwrap();

    // A competing instance gives up before touching any state.
    assert!(matches!(
        InstanceLock::acquire(&lock_path),
        Err(herald_config::Error::InstanceAlreadyRunning { .. })
    ));

    // The holder itself keeps ticking; the lock is advisory and does
    // not block its own state file.
    let runner = Runner::new(&host, &config, StateStore::new(&state_path));
    let report = runner.run_tick(datetime(2024, 5, 1, 6, 0)).unwrap();
    assert!(!report.has_failures());

    drop(held);
    assert!(InstanceLock::acquire(&lock_path).is_ok());
}

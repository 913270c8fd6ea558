//! Info command implementation
//!
//! Prints every resolved work item plus a snapshot of the dynamic
//! state. The state file is read without taking the instance lock, so
//! this is safe to run next to a live agent.

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;

use herald_config::{
    ConfigResolver, DynamicState, EndpointSettings, StateStore, ThreadSettings, ThreadState,
    load_static,
};

use crate::error::Result;

/// Run the info command
pub fn run_info(config_path: &Path, state_path: &Path) -> Result<()> {
    let config = load_static(config_path)?;
    let resolver = ConfigResolver::new(&config);
    let state = StateStore::new(state_path).load()?;
    let now = Utc::now();

    println!("{}", "Sync items".bold());
    let pairs = resolver.sync_pairs();
    if pairs.is_empty() {
        println!("   (none)");
    }
    for (key, pair) in &pairs {
        match pair {
            Ok(pair) => {
                println!(
                    "   {} {}: {}",
                    "+".green(),
                    key.cyan(),
                    endpoint_label(&pair.source)
                );
                for target in &pair.targets {
                    match &target.settings {
                        Ok(settings) => {
                            println!(
                                "      -> {} ({})",
                                endpoint_label(settings),
                                target.key.dimmed()
                            );
                        }
                        Err(error) => println!("      {} {}: {}", "!".red(), target.key, error),
                    }
                }
            }
            Err(error) => println!("   {} {}: {}", "!".red(), key.cyan(), error),
        }
    }

    println!();
    println!("{}", "Thread items".bold());
    let items = resolver.thread_items();
    if items.is_empty() {
        println!("   (none)");
    }
    for (key, item) in &items {
        match item {
            Ok(item) if !item.enabled => {
                println!("   {} {} (disabled)", "-".yellow(), key.cyan());
            }
            Ok(item) => {
                let cadence = match &item.interval {
                    Some(interval) => format!("every {interval}"),
                    None => "manual rotation only".to_string(),
                };
                println!(
                    "   {} {} in {} ({})",
                    "+".green(),
                    key.cyan(),
                    item.post_community,
                    cadence
                );
                print_thread_state(item, &state, now);
            }
            Err(error) => println!("   {} {}: {}", "!".red(), key.cyan(), error),
        }
    }

    println!();
    if state_path.exists() {
        println!("State file: {}", state_path.display());
    } else {
        println!("State file: {} (not created yet)", state_path.display());
    }
    Ok(())
}

/// One-line summary of where an endpoint points and what part of the
/// document it covers.
fn endpoint_label(settings: &EndpointSettings) -> String {
    let section = match &settings.marker.pattern {
        Some(pattern) => format!("section \"{pattern}\""),
        None => "whole document".to_string(),
    };
    format!(
        "{} {}/{} ({section})",
        settings.kind, settings.community, settings.name
    )
}

fn print_thread_state(settings: &ThreadSettings, state: &DynamicState, now: DateTime<Utc>) {
    let seeded;
    let record = match state.threads.get(&settings.key) {
        Some(record) => record,
        None => {
            seeded = ThreadState::from_initial(&settings.initial);
            &seeded
        }
    };
    match (record.thread_id.as_deref(), record.last_post_time) {
        (Some(id), Some(last)) => {
            let due = settings
                .interval
                .is_some_and(|interval| interval.next_due(last, now));
            if due {
                println!(
                    "      thread {} (#{}), {}",
                    id,
                    record.thread_number,
                    "due for rotation".yellow()
                );
            } else {
                println!(
                    "      thread {} (#{}), rotated {}",
                    id,
                    record.thread_number,
                    last.format("%Y-%m-%d")
                );
            }
        }
        (Some(id), None) => {
            println!(
                "      thread {} (#{}), creation time looked up on the next run",
                id, record.thread_number
            );
        }
        (None, _) => println!("      no live thread yet"),
    }
}

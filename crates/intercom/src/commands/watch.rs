//! Continuous polling: registers an observer and prints every cycle.

use std::sync::Arc;

use chrono::Local;
use intercom_core::{
    EntityRegistry, RegistryDiff, StatusSnapshot, UpdateCoordinator, display_name,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, OutputOpts};

use super::status::{channel_rows, event_lines, health_line};

fn render_cycle(snapshot: &StatusSnapshot, diff: &RegistryDiff, opts: &OutputOpts) -> String {
    match opts.format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(snapshot, true),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(snapshot)),
        OutputFormat::Table | OutputFormat::Plain => {
            let stamp = snapshot.fetched_at.with_timezone(&Local).format("%H:%M:%S");
            let mut out = vec![format!("{stamp}  {}", health_line(snapshot, opts.color))];
            out.extend(
                diff.added
                    .iter()
                    .map(|k| format!("  + {}", display_name(k.kind, &k.channel))),
            );
            out.extend(
                diff.removed
                    .iter()
                    .map(|k| format!("  - {}", display_name(k.kind, &k.channel))),
            );
            out.extend(event_lines(snapshot).into_iter().map(|l| format!("  {l}")));
            out.join("\n")
        }
    }
}

pub async fn handle(
    coordinator: &UpdateCoordinator,
    args: &WatchArgs,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let mut remaining = args.count;
    if remaining == Some(0) {
        return Ok(());
    }

    let mut registry = EntityRegistry::new();
    if let Some(initial) = coordinator.current_snapshot() {
        registry.apply(&initial);
        if matches!(opts.format, OutputFormat::Table) {
            opts.print(&output::render_table(&channel_rows(&initial)));
        }
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<StatusSnapshot>>();
    let id = coordinator.register_observer(move |snapshot| {
        let _ = tx.send(Arc::clone(snapshot));
    });
    debug!(interval = ?coordinator.poll_interval(), "watching");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let diff = registry.apply(&snapshot);
                opts.print(&render_cycle(&snapshot, &diff, opts));

                if let Some(n) = remaining.as_mut() {
                    *n -= 1;
                    if *n == 0 {
                        break;
                    }
                }
            }
        }
    }

    coordinator.remove_observer(id);
    Ok(())
}

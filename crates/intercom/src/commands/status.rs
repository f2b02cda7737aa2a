//! One-shot status: the snapshot taken during setup.

use intercom_core::{Entity, PortSensor, StatusSnapshot, SwitchEntity, UpdateCoordinator};
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{self, OutputOpts};

use super::state_word;

#[derive(Tabled)]
pub(crate) struct ChannelRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Channel")]
    channel: String,
    #[tabled(rename = "State")]
    state: &'static str,
}

impl ChannelRow {
    fn new(entity: &impl Entity, state: Option<bool>) -> Self {
        let key = entity.key();
        Self {
            name: entity.name(),
            kind: key.kind.to_string(),
            channel: key.channel.to_string(),
            state: state_word(state),
        }
    }

    fn plain(&self) -> String {
        format!("{} {} {}", self.kind, self.channel, self.state)
    }
}

pub(crate) fn channel_rows(snapshot: &StatusSnapshot) -> Vec<ChannelRow> {
    let ports = snapshot.ports.iter().map(|p| {
        let sensor = PortSensor::new(p.id.clone(), snapshot);
        ChannelRow::new(&sensor, sensor.is_on())
    });
    let switches = snapshot.switches.iter().map(|s| {
        let switch = SwitchEntity::new(s.id.clone(), snapshot);
        ChannelRow::new(&switch, switch.is_on())
    });
    ports.chain(switches).collect()
}

pub(crate) fn health_line(snapshot: &StatusSnapshot, color: bool) -> String {
    let h = snapshot.health;
    format!(
        "ports {}  switches {}  events {}",
        output::health_word(h.ports, color),
        output::health_word(h.switches, color),
        output::health_word(h.events, color),
    )
}

pub(crate) fn event_lines(snapshot: &StatusSnapshot) -> Vec<String> {
    snapshot
        .events
        .iter()
        .map(|e| {
            let kind = e.kind.as_deref().unwrap_or("?");
            if e.params.is_null() {
                format!("event {kind}")
            } else {
                format!("event {kind} {}", e.params)
            }
        })
        .collect()
}

fn render(snapshot: &StatusSnapshot, opts: &OutputOpts) -> String {
    match opts.format {
        OutputFormat::Table => {
            let mut out = vec![health_line(snapshot, opts.color)];
            let rows = channel_rows(snapshot);
            if !rows.is_empty() {
                out.push(output::render_table(&rows));
            }
            out.extend(event_lines(snapshot));
            out.join("\n")
        }
        OutputFormat::Plain => {
            let mut out: Vec<String> =
                channel_rows(snapshot).iter().map(ChannelRow::plain).collect();
            out.extend(event_lines(snapshot));
            out.join("\n")
        }
        OutputFormat::Json => output::render_json(snapshot, false),
        OutputFormat::JsonCompact => output::render_json(snapshot, true),
        OutputFormat::Yaml => output::render_yaml(snapshot),
    }
}

pub fn handle(coordinator: &UpdateCoordinator, opts: &OutputOpts) -> Result<(), CliError> {
    let snapshot = coordinator
        .current_snapshot()
        .ok_or_else(|| CliError::Internal("no snapshot after setup".into()))?;
    opts.print(&render(&snapshot, opts));
    Ok(())
}

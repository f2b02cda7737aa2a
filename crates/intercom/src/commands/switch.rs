//! Switch control: on, off, trigger.

use intercom_core::{ButtonEntity, ChannelId, SwitchAction, SwitchEntity, UpdateCoordinator};
use serde::Serialize;

use crate::cli::{SwitchArgs, SwitchCommand};
use crate::error::CliError;
use crate::output::{self, OutputOpts};

use super::state_word;

#[derive(Serialize)]
struct SwitchOutcome {
    switch: String,
    action: SwitchAction,
    /// Optimistic state after the command; absent for triggers.
    active: Option<bool>,
}

pub async fn handle(
    coordinator: &UpdateCoordinator,
    args: SwitchArgs,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let (action, target) = match args.command {
        SwitchCommand::On(t) => (SwitchAction::On, t),
        SwitchCommand::Off(t) => (SwitchAction::Off, t),
        SwitchCommand::Trigger(t) => (SwitchAction::Trigger, t),
    };
    let channel = ChannelId::from(target.id.as_str());

    let snapshot = coordinator
        .current_snapshot()
        .ok_or_else(|| CliError::Internal("no snapshot after setup".into()))?;
    if snapshot.health.switches && snapshot.switch(&channel).is_none() {
        return Err(CliError::NotFound {
            resource_type: "switch".into(),
            identifier: channel.to_string(),
            list_command: "status".into(),
        });
    }

    let (accepted, active) = match action {
        SwitchAction::On => {
            let mut switch = SwitchEntity::new(channel.clone(), &snapshot);
            (switch.turn_on(coordinator).await, switch.is_on())
        }
        SwitchAction::Off => {
            let mut switch = SwitchEntity::new(channel.clone(), &snapshot);
            (switch.turn_off(coordinator).await, switch.is_on())
        }
        SwitchAction::Trigger => {
            let button = ButtonEntity::new(channel.clone(), &snapshot);
            (button.press(coordinator).await, None)
        }
    };

    if !accepted {
        return Err(CliError::CommandRejected {
            action: action.to_string(),
            switch: channel.to_string(),
        });
    }

    let outcome = SwitchOutcome {
        switch: channel.to_string(),
        action,
        active,
    };
    let rendered = output::render_single(
        opts.format,
        &outcome,
        |o| match o.active {
            Some(_) => format!("switch {}: {}", o.switch, state_word(o.active)),
            None => format!("switch {}: {}", o.switch, o.action),
        },
        |o| format!("{} {}", o.switch, o.action),
    );
    opts.print(&rendered);
    Ok(())
}

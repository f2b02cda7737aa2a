//! Command dispatch: bridges CLI args -> coordinator -> output formatting.

pub mod config_cmd;
pub mod info;
pub mod status;
pub mod switch;
pub mod watch;

use intercom_core::UpdateCoordinator;

use crate::cli::Command;
use crate::error::CliError;
use crate::output::OutputOpts;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &UpdateCoordinator,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Info => {
            info::handle(coordinator, opts);
            Ok(())
        }
        Command::Status => status::handle(coordinator, opts),
        Command::Watch(args) => watch::handle(coordinator, &args, opts).await,
        Command::Switch(args) => switch::handle(coordinator, args, opts).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// `on` / `off`, or `unavailable` when the subsystem did not answer.
pub(crate) fn state_word(state: Option<bool>) -> &'static str {
    match state {
        Some(true) => "on",
        Some(false) => "off",
        None => "unavailable",
    }
}

//! Clap derive structures for the `intercom` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// intercom -- status and switch control for 2N intercoms
#[derive(Debug, Parser)]
#[command(
    name = "intercom",
    version,
    about = "Poll 2N intercoms and control their switches",
    long_about = "Reads port, switch and event status from a 2N intercom over its HTTP API,\n\
        keeps polling while you watch, and sends switch commands.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "INTERCOM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host or URL (overrides profile)
    #[arg(long, short = 'H', env = "INTERCOM_HOST", global = true)]
    pub host: Option<String>,

    /// API username (overrides profile)
    #[arg(long, short = 'u', env = "INTERCOM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "INTERCOM_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "INTERCOM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "INTERCOM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show device identity and firmware
    Info,

    /// Poll once and print port, switch and event status
    #[command(alias = "st")]
    Status,

    /// Keep polling and print every cycle until interrupted
    Watch(WatchArgs),

    /// Switch an output on or off, or trigger it
    #[command(alias = "sw")]
    Switch(SwitchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycles (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

// ── Switch ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SwitchArgs {
    #[command(subcommand)]
    pub command: SwitchCommand,
}

#[derive(Debug, Subcommand)]
pub enum SwitchCommand {
    /// Turn a switch on
    On(SwitchTarget),
    /// Turn a switch off
    Off(SwitchTarget),
    /// Trigger a switch (momentary)
    Trigger(SwitchTarget),
}

#[derive(Debug, Args)]
pub struct SwitchTarget {
    /// Switch number as reported by `status`
    pub id: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets masked)
    Show,
    /// Print the config file path
    Path,
    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

use clap::{Parser, Subcommand};

pub const DEFAULT_TESTSERVER_NAME: &str = "trackhub-local-testcontainer";

#[derive(Parser)]
#[command(name = "trackhub")]
#[command(about = "TrackHub CLI — manage automations and the local test backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and TRACKHUB_BASE_URL env var)
    #[arg(short, long, global = true, env = "TRACKHUB_BASE_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(
        short,
        long,
        global = true,
        env = "TRACKHUB_PROFILE",
        default_value = "default"
    )]
    pub profile: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage automations
    Automation(AutomationArgs),
    /// Manage the local test backend
    Testserver(TestserverArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct AutomationArgs {
    #[command(subcommand)]
    pub command: AutomationCommands,
}

#[derive(Subcommand)]
pub enum AutomationCommands {
    /// List automations
    List(ListArgs),
    /// Delete an automation by name
    Delete(DeleteArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Owning entity (defaults to all projects visible to you)
    #[arg(long)]
    pub entity: Option<String>,
    /// Filter by automation name
    #[arg(long)]
    pub name: Option<String>,
    /// Results requested per page
    #[arg(long)]
    pub per_page: Option<u32>,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Automation name
    pub name: String,
    /// Owning entity
    #[arg(long)]
    pub entity: Option<String>,
}

#[derive(clap::Args)]
pub struct TestserverArgs {
    #[command(subcommand)]
    pub command: TestserverCommands,
}

#[derive(Subcommand)]
pub enum TestserverCommands {
    /// Start a local test backend, or register an external one
    Start(StartArgs),
    /// Check that a known test backend is healthy and print its ports
    Connect(ConnectArgs),
    /// Stop test backends started by this tool
    Stop(StopArgs),
    /// Dump the state file for debugging
    PrintDebug,
}

#[derive(clap::Args)]
pub struct StartArgs {
    /// The name for the server, used by `connect` afterwards
    #[arg(long, default_value = DEFAULT_TESTSERVER_NAME)]
    pub name: String,
    /// Hostname of an already-running backend (e.g. localhost). When
    /// provided, --base-port and --fixture-port are required too.
    #[arg(long)]
    pub hostname: Option<String>,
    /// The backend's base port (usually 8080)
    #[arg(long)]
    pub base_port: Option<u16>,
    /// The backend's fixture port (usually 9015)
    #[arg(long)]
    pub fixture_port: Option<u16>,
}

#[derive(clap::Args)]
pub struct ConnectArgs {
    /// The name used in the `start` command
    #[arg(long, default_value = DEFAULT_TESTSERVER_NAME)]
    pub name: String,
}

#[derive(clap::Args)]
pub struct StopArgs {
    /// A name passed to `start`. When omitted, stops all servers.
    #[arg(long = "name")]
    pub names: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, entity)
    pub key: String,
    /// Value
    pub value: String,
}

use clap::{Parser, Subcommand, ValueEnum};
use medportal_client::AuthMode;

#[derive(Parser)]
#[command(name = "medportal")]
#[command(about = "MedPortal CLI for doctor, lab, patient and admin dashboards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and MEDPORTAL_URL env var)
    #[arg(short, long, global = true, env = "MEDPORTAL_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "MEDPORTAL_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Credential deployment (overrides config)
    #[arg(long, global = true, env = "MEDPORTAL_AUTH_MODE")]
    pub auth_mode: Option<AuthModeArg>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AuthModeArg {
    /// Bearer token stored per profile
    Bearer,
    /// Session cookie with CSRF priming
    Cookie,
}

impl From<AuthModeArg> for AuthMode {
    fn from(arg: AuthModeArg) -> Self {
        match arg {
            AuthModeArg::Bearer => AuthMode::Bearer,
            AuthModeArg::Cookie => AuthMode::Cookie,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to the portal
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Log out and forget the stored session
    Logout,
    /// Check the stored session against the server
    Whoami,
    /// Show a role dashboard
    Dashboard(DashboardArgs),
    /// Administer doctor accounts
    Doctors(DoctorsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,
    /// Password
    #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Account email
    #[arg(short, long)]
    pub email: String,
    /// Password (also used as confirmation)
    #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Requested role (doctor, lab, patient)
    #[arg(long)]
    pub role: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DashboardRole {
    Doctor,
    Lab,
    Patient,
}

#[derive(clap::Args)]
pub struct DashboardArgs {
    /// Which dashboard to show
    pub role: DashboardRole,
}

#[derive(clap::Args)]
pub struct DoctorsArgs {
    #[command(subcommand)]
    pub command: DoctorsCommands,
}

#[derive(Subcommand)]
pub enum DoctorsCommands {
    /// List doctor accounts
    List(DoctorsListArgs),
    /// Mark a doctor account as verified
    Verify(VerifyArgs),
}

#[derive(clap::Args)]
pub struct DoctorsListArgs {
    /// Filter by name or email substring
    #[arg(long)]
    pub search: Option<String>,
    /// Only show doctors awaiting verification
    #[arg(long)]
    pub unverified: bool,
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Doctor id
    pub id: u64,
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
    /// Key to set (server, format, auth_mode)
    pub key: String,
    /// Value
    pub value: String,
}

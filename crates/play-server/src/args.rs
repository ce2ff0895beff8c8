use clap::{Parser, ValueEnum};

use agent::config::PolicyKind;

#[derive(Parser, Debug)]
#[command(about = "Browser presenter for the 2048 environment")]
pub struct Args {
    /// Policy driving the AI player.
    #[arg(long, value_enum, default_value = "lookahead")]
    pub policy: PolicyArg,
    /// Seed for the game session; drawn from entropy if omitted.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Host interface to bind (default 0.0.0.0).
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind (default 8080).
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Optional tracing filter, e.g. "info", "debug".
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    Lookahead,
    Random,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Lookahead => PolicyKind::Lookahead,
            PolicyArg::Random => PolicyKind::Random,
        }
    }
}

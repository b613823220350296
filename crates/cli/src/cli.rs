use clap::{Parser, Subcommand, ValueEnum};
use pairly_config::StoreBackend;

#[derive(Parser)]
#[command(name = "pairly")]
#[command(about = "Invite pairing coordinator")]
pub struct Cli {
    /// Override `store.backend` from the loaded settings
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Emit logs as JSON
    #[arg(long, env = "PAIRLY_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Backend {
    Redis,
    Memory,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Redis => StoreBackend::Redis,
            Backend::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an invite
    Create {
        /// Identity of the inviter
        #[arg(long)]
        inviter: String,

        /// Lifetime in milliseconds (defaults to `invite.default_ttl_ms`)
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Show the stored record as-is (no expiry check)
    Get {
        /// Invite id
        invite_id: String,
    },
    /// Join an invite, or check its status as the inviter
    Join {
        /// Invite id
        invite_id: String,

        /// Identity of the caller
        #[arg(long)]
        caller: String,
    },
    /// Replace an invite with a fresh code, revoking the old one
    Reissue {
        /// Invite id
        invite_id: String,

        /// Identity of the caller (must be the inviter)
        #[arg(long)]
        caller: String,
    },
    /// Revoke an invite without replacing it
    Revoke {
        /// Invite id
        invite_id: String,

        /// Identity of the caller (must be the inviter)
        #[arg(long)]
        caller: String,
    },
    /// Walk one invite through create, join, and rejection against the configured backend
    Demo {
        #[arg(long, default_value = "alice")]
        inviter: String,

        #[arg(long, default_value = "bob")]
        invitee: String,

        #[arg(long, default_value = "carol")]
        outsider: String,
    },
}

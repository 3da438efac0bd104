//! CLI argument definitions using clap derive macros.

use clap::Parser;

use da_export_core::api::DEFAULT_BATCH_SIZE;
use da_export_core::config::AuthConfig;

/// Export DeviantArt gallery metadata to a resumable TSV file.
///
/// da-export authenticates through the DeviantArt OAuth2 flow, walks a
/// user's gallery (all of it or interactively selected folders), and
/// appends one row per deviation to a tab-separated file, skipping ids
/// recorded by previous runs.
#[derive(Parser, Debug)]
#[command(name = "da-export")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// OAuth2 client id of the registered DeviantArt application
    #[arg(long, env = "DA_CLIENT_ID")]
    pub client_id: String,

    /// OAuth2 client secret of the registered DeviantArt application
    #[arg(long, env = "DA_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Loopback port for the OAuth redirect listener (1024-65535)
    #[arg(long, default_value_t = AuthConfig::DEFAULT_REDIRECT_PORT, value_parser = clap::value_parser!(u16).range(1024..))]
    pub redirect_port: u16,

    /// Seconds to wait for the browser redirect (10-3600)
    #[arg(long, default_value_t = AuthConfig::DEFAULT_AUTH_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(10..=3600))]
    pub auth_timeout_secs: u64,

    /// Deviation ids per metadata request (1-50)
    #[arg(short = 'b', long, default_value_t = DEFAULT_BATCH_SIZE as u8, value_parser = clap::value_parser!(u8).range(1..=50))]
    pub batch_size: u8,
}

impl Args {
    /// Assembles the OAuth configuration from the parsed flags.
    pub fn auth_config(&self) -> AuthConfig {
        let mut config = AuthConfig::new(self.client_id.clone(), self.client_secret.clone());
        config.redirect_port = self.redirect_port;
        config.auth_timeout_secs = self.auth_timeout_secs;
        config
    }
}

//! Command-line and environment options.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// NELA download server - streams installers and model files from Google Drive
#[derive(Parser, Debug)]
#[command(name = "nela-server")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "NELA_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// TOML file mapping named downloads to Drive file ids
    #[arg(long, env = "NELA_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Drive API root (override for testing against a mock server)
    #[arg(long, env = "NELA_DRIVE_BASE_URL", default_value = nela_drive::DEFAULT_BASE_URL)]
    pub drive_base_url: String,

    /// Seconds allowed for authentication, metadata and stream setup
    #[arg(long, env = "NELA_SETUP_TIMEOUT_SECS", default_value_t = 30)]
    pub setup_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Setup timeout as a duration.
    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "nela_server=debug,nela_download=debug,nela_drive=debug,nela_gcp_auth=debug,tower_http=debug"
        } else {
            "info"
        }
    }
}

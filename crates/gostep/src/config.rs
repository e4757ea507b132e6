use clap::Parser;
use engine::{FixConfig, FixPlacement, GoToolchainConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the history file location.
pub const HISTORY_PATH_ENV: &str = "GOSTEP_HISTORY";

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Go file to extend; its original content is restored on exit
    pub file: Option<PathBuf>,

    /// `go` binary to use
    #[arg(long)]
    pub go: Option<PathBuf>,

    /// `goimports` binary to use
    #[arg(long)]
    pub goimports: Option<PathBuf>,

    /// Seconds a single run may take before it is killed
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Compile attempts per statement before giving up on unused identifiers
    #[arg(long)]
    pub max_fix_passes: Option<usize>,

    /// Where discard statements go relative to the new statement
    #[arg(long, value_parser = parse_placement)]
    pub fix_placement: Option<FixPlacement>,
}

fn parse_placement(raw: &str) -> Result<FixPlacement, String> {
    raw.parse()
}

/// Resolved session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    pub toolchain: GoToolchainConfig,
    pub fix: FixConfig,
    /// None disables history persistence
    pub history_path: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        let override_path = std::env::var(HISTORY_PATH_ENV).ok();
        Self {
            toolchain: GoToolchainConfig::default(),
            fix: FixConfig::default(),
            history_path: resolve_history_path(home.as_deref(), override_path.as_deref()),
        }
    }
}

impl ReplConfig {
    /// Environment defaults with command-line flags applied on top
    pub fn from_args(args: &CliArgs) -> Self {
        let mut config = Self::default();

        if let Some(go) = &args.go {
            config.toolchain.go_bin = go.clone();
        }
        if let Some(goimports) = &args.goimports {
            config.toolchain.goimports_bin = goimports.clone();
        }
        if let Some(secs) = args.timeout {
            config.toolchain.run_timeout_secs = secs;
        }
        if let Some(passes) = args.max_fix_passes {
            config.fix.max_fix_passes = passes;
        }
        if let Some(placement) = args.fix_placement {
            config.fix.placement = placement;
        }
        config
    }
}

/// Resolve the history file.
///
/// - override `~` or `~/...`: under HOME
/// - relative override: under HOME
/// - absolute override: as-is
/// - no override: `${HOME}/.gostep_history`
pub fn resolve_history_path(home: Option<&Path>, override_path: Option<&str>) -> Option<PathBuf> {
    let home_path = || home.map(Path::to_path_buf);

    if let Some(raw) = override_path
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        if raw == "~" {
            return home_path();
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return home_path().map(|home| home.join(rest));
        }
        let configured = PathBuf::from(raw);
        if configured.is_relative() {
            return home_path().map(|home| home.join(configured));
        }
        return Some(configured);
    }

    home_path().map(|home| home.join(".gostep_history"))
}

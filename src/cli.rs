// src/cli.rs

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;

use crate::core::config::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS, DEFAULT_MAX_RETRIES, DEFAULT_USER_AGENT, ScanConfig,
};
use crate::core::error::ConfigError;
use crate::core::normalizer::parse_domain_list;

#[derive(Parser, Debug)]
#[command(
    name = "vanguard-httpcheck",
    version,
    about = "Concurrent HTTP(S) reachability, TLS and security-header checker",
    long_about = "Probes every domain over HTTPS first, retries with exponential backoff, falls back to HTTP, \
                  and reports status, timings, redirects, TLS metadata and security headers.",
    after_help = "EXAMPLES:
    vanguard-httpcheck
    vanguard-httpcheck -d example.com --headless
    vanguard-httpcheck -i domains.txt -c 20 -t 5 -o report.json --headless"
)]
pub struct Cli {
    #[arg(short, long, help = "Single domain or URL to check", help_heading = "TARGETS")]
    pub domain: Option<String>,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "File with one domain per line ('#' starts a comment)",
        help_heading = "TARGETS"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "concurrent",
        default_value_t = DEFAULT_CONCURRENCY,
        help = "Maximum number of domains checked at the same time",
        help_heading = "SCAN OPTIONS"
    )]
    pub concurrent: usize,

    #[arg(
        short,
        long,
        default_value_t = 10.0,
        help = "Per-attempt deadline in seconds",
        help_heading = "SCAN OPTIONS"
    )]
    pub timeout: f64,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_MAX_RETRIES,
        help = "Extra attempts per scheme after the first one",
        help_heading = "SCAN OPTIONS"
    )]
    pub retries: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_REDIRECTS,
        help = "Maximum number of redirects followed per attempt",
        help_heading = "SCAN OPTIONS"
    )]
    pub max_redirects: usize,

    #[arg(long, default_value = DEFAULT_USER_AGENT, help_heading = "SCAN OPTIONS")]
    pub user_agent: String,

    #[arg(long, help = "Accept invalid or self-signed certificates", help_heading = "SCAN OPTIONS")]
    pub no_ssl_verify: bool,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write a JSON report to this file",
        help_heading = "OUTPUT"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Run without the terminal UI and print a summary", help_heading = "OUTPUT")]
    pub headless: bool,
}

impl Cli {
    /// Builds the validated engine configuration from the flags.
    pub fn to_config(&self) -> Result<ScanConfig, ConfigError> {
        let config = ScanConfig::new()
            .with_concurrency(self.concurrent)
            .with_timeout_secs(self.timeout)?
            .with_max_retries(self.retries)
            .with_max_redirects(self.max_redirects)
            .with_verify_tls(!self.no_ssl_verify)
            .with_user_agent(self.user_agent.clone());
        config.validate()?;
        Ok(config)
    }

    /// Targets from `--domain` and `--input`, in that order. Entries from the
    /// file are already normalized; `--domain` is passed through as typed.
    pub fn targets(&self) -> io::Result<Vec<String>> {
        let mut targets: Vec<String> = self.domain.iter().cloned().collect();
        if let Some(path) = &self.input {
            let content = fs::read_to_string(path)?;
            targets.extend(parse_domain_list(&content).into_iter().map(|d| d.to_string()));
        }
        Ok(targets)
    }
}

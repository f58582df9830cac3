//! # Terminal Output
//!
//! Status lines printed by the CLI use emoji markers on capable terminals and
//! bracketed plain-text markers everywhere else (CI logs, pipes, `NO_COLOR`).
//!
//! The policy follows, in order:
//! - `--color=always|never` wins outright
//! - `NO_COLOR` (any value) disables, per https://no-color.org/
//! - `CLICOLOR=0` disables, `CLICOLOR_FORCE=1` enables
//! - `TERM=dumb` disables
//! - otherwise, whatever the terminal on stderr supports

use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

/// Kinds of status line the CLI prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Scan,
    Package,
    Success,
    Failure,
}

impl OutputConfig {
    /// Create an output configuration from the environment and the
    /// `--color` flag value.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        // Status lines go to stderr, so that is the stream that matters
        console::Term::stderr().features().colors_supported()
    }

    /// Marker for a status line.
    pub fn marker(&self, status: Status) -> &'static str {
        match (status, self.use_color) {
            (Status::Scan, true) => "🔍",
            (Status::Package, true) => "📦",
            (Status::Success, true) => "✅",
            (Status::Failure, true) => "❌",
            (Status::Scan, false) => "[SCAN]",
            (Status::Package, false) => "[PACK]",
            (Status::Success, false) => "[OK]",
            (Status::Failure, false) => "[FAIL]",
        }
    }

    /// Print `<marker> <message>` to stderr.
    pub fn status(&self, status: Status, message: &str) {
        eprintln!("{} {}", self.marker(status), message);
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

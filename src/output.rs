//! # Output and Reporting
//!
//! Two pieces live here:
//!
//! - [`OutputConfig`] decides whether colors and emojis are used, based on
//!   the `--color` flag and the usual environment conventions.
//! - [`Reporter`] is the sink every component reports progress through. It is
//!   passed explicitly to each call; verbosity is a field, not global state.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;
use log::Level;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
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

        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Reporting sink handed to every reconciliation component.
///
/// Each message becomes a `log` record. Progress messages are also echoed to
/// stdout as `[level] message` when running verbose. Warnings and errors are
/// always shown: on stderr when the installed logger filters them out.
#[derive(Debug, Clone)]
pub struct Reporter {
    verbose: bool,
    output: OutputConfig,
}

impl Reporter {
    pub fn new(verbose: bool, output: OutputConfig) -> Self {
        Self { verbose, output }
    }

    /// A reporter that only logs, except for warnings.
    pub fn quiet() -> Self {
        Self::new(false, OutputConfig::without_color())
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Report `msg` at `level`.
    pub fn shout(&self, level: Level, msg: &str) {
        log::log!(level, "{}", msg);
        if level <= Level::Warn {
            if !log::log_enabled!(level) {
                eprintln!("{}", self.format_line(level, msg));
            }
        } else if self.verbose {
            println!("{}", self.format_line(level, msg));
        }
    }

    pub fn info(&self, msg: &str) {
        self.shout(Level::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.shout(Level::Warn, msg);
    }

    fn format_line(&self, level: Level, msg: &str) -> String {
        let tag = format!("[{}]", level.as_str().to_lowercase());
        if !self.output.use_color {
            return format!("{} {}", tag, msg);
        }
        let tag = match level {
            Level::Error => style(tag).red().bold(),
            Level::Warn => style(tag).yellow().bold(),
            _ => style(tag).dim(),
        };
        format!("{} {}", tag, msg)
    }
}

// file: src/utils/logging.rs
// description: tracing subscriber initialization and coloured cli messages

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// lance and datafusion log every table scan at info
const QUIET_DEPENDENCIES: &[&str] = &["lance=warn", "lancedb=warn", "datafusion=warn"];

fn default_directives(verbose: bool) -> String {
    let own = if verbose { "debug" } else { "info" };
    std::iter::once(own)
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Logs go to stderr so `export` and `search` output can be piped.
/// `RUST_LOG` replaces the default directives when set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    // a second init (tests, embedding callers) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn badge(symbol: &str, color: Color, msg: &str, tint_message: bool) -> String {
    let body = if tint_message {
        msg.color(color).to_string()
    } else {
        msg.to_string()
    };
    format!("{} {}", symbol.color(color).bold(), body)
}

pub fn format_success(msg: &str) -> String {
    badge("✓", Color::Green, msg, true)
}

pub fn format_error(msg: &str) -> String {
    badge("✗", Color::Red, msg, true)
}

pub fn format_warning(msg: &str) -> String {
    badge("⚠", Color::Yellow, msg, true)
}

pub fn format_info(msg: &str) -> String {
    badge("ℹ", Color::Blue, msg, false)
}

pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    badge(&format!("[{}/{}]", step, total), Color::Cyan, msg, false)
}

pub fn format_heading(msg: &str) -> String {
    msg.bold().underline().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_their_text() {
        colored::control::set_override(false);
        assert_eq!(format_success("added"), "✓ added");
        assert_eq!(format_error("failed"), "✗ failed");
        assert_eq!(format_info("3 datasets"), "ℹ 3 datasets");
        assert_eq!(format_step(1, 3, "cognify"), "[1/3] cognify");
        assert_eq!(format_heading("History"), "History");
    }

    #[test]
    fn test_default_directives_quiet_storage_crates() {
        assert_eq!(
            default_directives(false),
            "info,lance=warn,lancedb=warn,datafusion=warn"
        );
        assert!(default_directives(true).starts_with("debug,"));
    }

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(false, false);
        init_logger(false, true);
    }
}

use core::fmt;
use std::fs::OpenOptions;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as tracingfmt};

/// Environment variable that replaces the default console log directives
pub const LOG_ENV_VAR: &str = "CALYPSO_LOG";

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

struct AlignedFormatter;

impl<S, N> FormatEvent<S, N> for AlignedFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: format::Writer<'_>, event: &tracing::Event<'_>) -> fmt::Result {
        let metadata = event.metadata();

        let (color_level, color_reset) = if writer.has_ansi_escapes() {
            match *metadata.level() {
                tracing::Level::ERROR => ("\x1b[31m", "\x1b[0m"),
                tracing::Level::WARN => ("\x1b[33m", "\x1b[0m"),
                tracing::Level::INFO => ("\x1b[32m", "\x1b[0m"),
                tracing::Level::DEBUG => ("\x1b[34m", "\x1b[0m"),
                tracing::Level::TRACE => ("\x1b[35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };

        let location = format!(
            "{}{:<5}{} {}:{}:",
            color_level,
            metadata.level(),
            color_reset,
            short_location(metadata.file().unwrap_or("unknown")),
            metadata.line().unwrap_or(0)
        );

        let mut message_buf = String::new();
        let message_writer = format::Writer::new(&mut message_buf);
        ctx.field_format().format_fields(message_writer, event)?;

        // Console traffic is logged as "-> cmd" / "<- reply"; pull those left a bit
        let mut padding = 52;
        if message_buf.starts_with("->") || message_buf.starts_with("<-") {
            padding -= 3;
        }

        write!(writer, "{:<width$} {}", location, message_buf, width = padding)?;
        writeln!(writer)
    }
}

/// Turns "crates/calypso-console/src/telnet/session.rs" into "[console/telnet] session.rs"
fn short_location(file_path: &str) -> String {
    let Some(src_idx) = file_path.find("/src/") else {
        return file_path.to_string();
    };
    let before_src = &file_path[..src_idx];
    let after_src = &file_path[src_idx + 5..];

    let crate_name = if let Some(idx) = before_src.rfind("calypso-") {
        &before_src[idx + 8..]
    } else {
        before_src.rsplit('/').next().unwrap_or("unknown")
    };

    if let Some(last_slash) = after_src.rfind('/') {
        let first_module = after_src[..last_slash].split('/').next().unwrap_or("");
        format!("[{}/{}] {}", crate_name, first_module, &after_src[last_slash + 1..])
    } else {
        format!("[{}] {}", crate_name, after_src)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    setup_logging(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stderr and optionally, a verbose log file.
/// Returns a guard that needs to be kept alive for logging to file to work.
///
/// Stdout is left alone: the tools print their status lines there and the
/// launcher captures it.
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let stderr_filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => get_default_stderr_filter(),
    };
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(stderr_filter, logfile_and_filter)
}

pub fn get_default_stderr_filter() -> EnvFilter {
    // Console traffic is noisy; operations report progress at info
    EnvFilter::new("warn,calypso_ops=info,calypso_launcher=info,calypso_console=warn,calypso_hlr=info")
}

fn get_default_logfile_filter() -> EnvFilter {
    EnvFilter::new("debug")
}

/// Sets up logging to stderr and optionally, a verbose log file.
/// If an output file is requested and could be opened, returns Some<WorkerGuard>.
/// Keep this value alive or logging to file may cease working.
fn setup_logging(stderr_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    let file = outfile.and_then(|(path, filter)| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => Some((f, filter)),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    if let Some((file, outfile_filter)) = file {
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        INIT_LOG.call_once(|| {
            let file_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(file_writer)
                .with_ansi(false);

            let stderr_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(file_layer.with_filter(outfile_filter))
                .with(stderr_layer.with_filter(stderr_filter))
                .init();
        });

        Some(guard)
    } else {
        INIT_LOG.call_once(|| {
            let stderr_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(stderr_layer.with_filter(stderr_filter))
                .init();
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_location() {
        assert_eq!(
            short_location("crates/calypso-console/src/telnet/session.rs"),
            "[console/telnet] session.rs"
        );
        assert_eq!(short_location("crates/calypso-hlr/src/store.rs"), "[hlr] store.rs");
        assert_eq!(short_location("bins/sms-flood/src/main.rs"), "[sms-flood] main.rs");
        assert_eq!(short_location("weird.rs"), "weird.rs");
    }
}

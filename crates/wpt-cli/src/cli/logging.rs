use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter};
use wpt_core::config::LogFormat;

/// Logs go to stderr; stdout stays free for anything a caller wants to pipe.
pub fn init_logging(directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_span_list(false)
            .init(),
        LogFormat::Text => builder.with_target(false).with_ansi(false).init(),
    }
}

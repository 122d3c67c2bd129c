use std::env;
use std::io::Write;

use chrono::Local;
use env_logger::Builder;

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Initializes the global logger.
///
/// The filter is `level` when given, otherwise the `LOG_LEVEL` environment
/// variable, otherwise `info`. Later calls are no-ops.
pub fn init(level: Option<&str>) {
    let filters = level
        .map(String::from)
        .or_else(|| env::var(LOG_LEVEL_ENV).ok())
        .unwrap_or_else(|| String::from("info"))
        .to_lowercase();

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .parse_filters(&filters)
        .try_init()
        .ok();
}

use chrono::Utc;
use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Timestamped stderr logging. `RUST_LOG`, when set, replaces `level` entirely.
pub fn init_logger(level: LevelFilter) {
    let mut builder = Builder::new();

    builder.format(|formatter, record| {
        writeln!(
            formatter,
            "{} [{}] ({}): {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Ok(var) = env::var("RUST_LOG") {
        builder.parse_filters(&var);
    } else {
        builder.filter(None, level);
    }

    builder.init();
}

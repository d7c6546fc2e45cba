use color_eyre::eyre::Result;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

/// Set up file logging under the user's state directory and return the log
/// file path. Debug mode lowers the filter to `Debug`.
pub fn init_logging(debug: bool) -> Result<PathBuf> {
    let log_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_dir = default_log_dir();
    fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("gitpane.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    env_logger::Builder::new()
        .filter_level(log_level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] - {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    log::info!("Logging initialized with level: {log_level}");
    Ok(log_file)
}

fn default_log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gitpane")
}

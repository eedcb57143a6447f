use chrono::{Datelike, Local, Timelike};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

fn timestamp() -> String {
    let time = Local::now();

    format!(
        "{:02}.{:02} {:02}:{:02}:{:02}",
        time.day(),
        time.month(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {:<5} {}", timestamp(), record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

use std::sync::OnceLock;

use log::{LevelFilter, Metadata, Record};

static LOGGER: CatalogLogger = CatalogLogger;
static MAX_LEVEL: OnceLock<LevelFilter> = OnceLock::new();

struct CatalogLogger;

impl log::Log for CatalogLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= *MAX_LEVEL.get().unwrap_or(&LevelFilter::Info)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{} [{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let _ = MAX_LEVEL.set(level);
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

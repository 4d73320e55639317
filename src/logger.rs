//! Logger.
//!
//! A [`log`] backend printing timestamped, colour-coded lines on the standard output.

use chrono::{Datelike, Local, Timelike};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: StdoutLogger = StdoutLogger;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StdoutLogger;

impl Log for StdoutLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }

    println!(
      "\x1b[90m{} \x1b[{}m> {}\x1b[0m",
      now(),
      colour(record.level()),
      record.args()
    );
  }

  fn flush(&self) {}
}

fn colour(level: Level) -> u8 {
  match level {
    Level::Error => 31,
    Level::Warn => 33,
    Level::Info => 34,
    Level::Debug | Level::Trace => 90,
  }
}

/// Install the stdout logger, filtering out anything less severe than `level`.
///
/// Installing it a second time only changes the level.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_max_level(level);

  match log::set_logger(&LOGGER) {
    Ok(()) => Ok(()),
    // already installed by a previous call
    Err(_) if is_installed() => Ok(()),
    Err(e) => Err(e),
  }
}

fn is_installed() -> bool {
  let installed: *const dyn Log = log::logger();
  let ours: *const dyn Log = &LOGGER;

  installed as *const () == ours as *const ()
}

pub fn now() -> String {
  let t = Local::now();

  format!(
    "{month:0>2}/{day:0>2}/{year} {hour:0>2}:{min:0>2}:{secs:0>2}:{nsecs:0>9}",
    month = t.month(),
    day = t.day(),
    year = t.year(),
    hour = t.hour(),
    min = t.minute(),
    secs = t.second(),
    nsecs = t.nanosecond()
  )
}

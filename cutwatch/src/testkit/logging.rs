use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum LogLevel {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
  Off,
}
impl LogLevel {
  pub const MIN: LogLevel = LogLevel::Trace;

  pub fn filter(self) -> LevelFilter {
    match self {
      LogLevel::Trace => LevelFilter::TRACE,
      LogLevel::Debug => LevelFilter::DEBUG,
      LogLevel::Info => LevelFilter::INFO,
      LogLevel::Warn => LevelFilter::WARN,
      LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
      LogLevel::Off => LevelFilter::OFF,
    }
  }
}

/// Installs a global fmt subscriber writing through the test harness. `RUST_LOG` wins over
/// `level` when it is set. Calling this more than once is harmless.
pub fn init_logging(level: LogLevel) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(level.filter().to_string()));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_test_writer()
    .try_init();
}

#[test]
fn test_log_level_filters() {
  assert_eq!(LogLevel::MIN.filter(), LevelFilter::TRACE);
  assert_eq!(LogLevel::Fatal.filter(), LevelFilter::ERROR);
  assert!(LogLevel::Warn.filter() < LogLevel::Debug.filter());
  init_logging(LogLevel::Off);
  init_logging(LogLevel::Debug);
}

//! Helpers for tests and demos: alert builders, pre-populated ring views and log setup.

mod alerts;
mod logging;

#[rustfmt::skip]
pub use {
  alerts::alert,
  alerts::alert_with,
  alerts::endpoint,
  alerts::populated_view,
  alerts::TEST_CONFIGURATION,
  logging::init_logging,
  logging::LogLevel,
};

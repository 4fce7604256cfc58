//! The vocabulary shared by the ring view and the cut detector: member addresses, alerts and the
//! ring-number bitset.
//!
//! ### Alerts
//! An [`AlertMessage`] is raised by a monitor about one of the members it watches. The monitor
//! may watch the same member on several rings at once, so one alert can carry several ring
//! numbers. Alerts are always scoped to a [`ConfigurationId`]; anything raised under a different
//! configuration is ignored by the detector.
//!
//! ```ignore
//! let alert = AlertMessage::new(
//!   Endpoint::from_parts("10.0.0.1", 7000),
//!   Endpoint::from_parts("10.0.0.2", 7000),
//!   EdgeStatus::Down,
//!   ConfigurationId(42),
//!   vec![0, 3],
//! );
//! ```

mod alert;
mod endpoint;
mod ring_set;

#[rustfmt::skip]
pub use {
  alert::AlertMessage,
  alert::ConfigurationId,
  alert::EdgeStatus,
  endpoint::Endpoint,
  endpoint::EndpointParseError,
  endpoint::Host,
  endpoint::NodeId,
  ring_set::RingSet,
  ring_set::MAX_RINGS,
};

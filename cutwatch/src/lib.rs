//! Cut detection for cluster membership. Members watch each other along `K` hash rings and raise
//! alerts when a watched member goes up or down. `cutwatch` decides, from those alerts, *when*
//! and *which* members have changed status, and delivers them together as one cut to whatever
//! agrees on the next configuration.
//!
//! - [`core`]: endpoints, alerts and ring-number sets.
//! - [`membership`]: the [`RingView`](membership::RingView), who observes whom.
//! - [`detection`]: the [`CutDetector`](detection::CutDetector) and the ways to share it.
//! - [`testkit`]: builders and log setup for tests.
//!
//! Transport, alert dissemination and the consensus on the next configuration live outside this
//! crate.

pub mod core;
pub mod detection;
pub mod membership;
pub mod testkit;

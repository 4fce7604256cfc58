//! Turning alerts into cuts.
//!
//! ### Watermarks
//! Every alert names a subject and the rings on which it was observed changing status. The
//! [`CutDetector`] counts, per subject, the distinct rings it was reported on. Two thresholds
//! are applied to that count:
//!
//! - Below `l`, the reports are treated as noise. They have no effect on anything else. Noise
//!   about endpoints outside the view is kept for a bounded number of them only.
//! - From `l` up to `h`, the subject is *in progress*: something is going on, but not enough
//!   monitors agree yet.
//! - At `h`, the subject is *sealed*. It is queued and delivered with the next cut.
//!
//! A cut is only delivered when no subject is in progress. When several members fail at about
//! the same time, their reports interleave, and the first ones to seal wait for the stragglers.
//! The whole group then goes out as a single cut, and the layer above only has to agree on a
//! single configuration change.
//!
//! ### Failing observers
//! If enough of a subject's own observers are failing, it can never collect `h` reports. While a
//! subject is in progress, any of its observers that is itself in progress or sealed counts as
//! having reported it on that ring.
//!
//! ### Sharing a detector
//! A [`CutDetector`] is a plain struct. Alerts arrive from many connections at once, so a node
//! wraps it either in a [`SharedCutDetector`] (one mutex, held for a whole alert) or in a
//! [`DetectorService`] (one task owning the detector, fed by a channel).
//!
//! ```ignore
//! let config = DetectorConfig::new(10, 9, 4)?;
//! let detector = CutDetector::new(config, ConfigurationId(7))?;
//! let (tx, mut cuts) = tokio::sync::mpsc::unbounded_channel();
//! let service = DetectorService::spawn(detector, tx);
//! service.alert(alert, view.clone());
//! let cut = cuts.recv().await;
//! ```

mod config;
mod cut_detector;
mod error;
mod service;
mod shared;

#[rustfmt::skip]
pub use {
  config::DetectorConfig,
  config::K_MIN,
  cut_detector::CutDetector,
  cut_detector::MAX_UNCONFIRMED_SUBJECTS,
  error::DetectionError,
  service::DecidedCut,
  service::DetectorMsg,
  service::DetectorRef,
  service::DetectorService,
  shared::SharedCutDetector,
};

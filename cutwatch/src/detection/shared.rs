use crate::core::{AlertMessage, ConfigurationId, Endpoint};
use crate::detection::{CutDetector, DetectionError};
use crate::membership::RingView;
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`CutDetector`] shared between threads. Every call holds the lock for its whole duration.
#[derive(Clone)]
pub struct SharedCutDetector {
  inner: Arc<Mutex<CutDetector>>,
}
impl SharedCutDetector {
  pub fn new(detector: CutDetector) -> SharedCutDetector {
    SharedCutDetector {
      inner: Arc::new(Mutex::new(detector)),
    }
  }

  pub fn aggregate(
    &self,
    alert: &AlertMessage,
    view: &RingView,
  ) -> Result<Vec<Endpoint>, DetectionError> {
    self.inner.lock().aggregate(alert, view)
  }

  pub fn reset_for_new_epoch(&self, configuration_id: ConfigurationId) {
    self.inner.lock().reset_for_new_epoch(configuration_id)
  }

  pub fn num_proposals(&self) -> u64 {
    self.inner.lock().num_proposals()
  }

  pub fn configuration_id(&self) -> ConfigurationId {
    self.inner.lock().configuration_id()
  }

  /// Runs `f` with the detector locked.
  pub fn with<F, T>(&self, f: F) -> T
  where
    F: FnOnce(&mut CutDetector) -> T,
  {
    f(&mut self.inner.lock())
  }
}

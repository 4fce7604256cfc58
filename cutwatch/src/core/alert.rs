use crate::core::{Endpoint, RingSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Identifies the membership configuration an alert was raised under.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Ord, PartialOrd)]
pub struct ConfigurationId(pub i64);
impl From<i64> for ConfigurationId {
  fn from(id: i64) -> Self {
    ConfigurationId(id)
  }
}
impl fmt::Display for ConfigurationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Serialize, Deserialize, Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum EdgeStatus {
  Up,
  Down,
}

/// `src`, monitoring `dst` on each of `ring_numbers`, saw `dst` go `status`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct AlertMessage {
  pub src: Endpoint,
  pub dst: Endpoint,
  pub status: EdgeStatus,
  pub configuration_id: ConfigurationId,
  pub ring_numbers: SmallVec<[u32; 4]>,
}
impl AlertMessage {
  pub fn new<I>(
    src: Endpoint,
    dst: Endpoint,
    status: EdgeStatus,
    configuration_id: ConfigurationId,
    rings: I,
  ) -> AlertMessage
  where
    I: IntoIterator<Item = u32>,
  {
    AlertMessage {
      src: src,
      dst: dst,
      status: status,
      configuration_id: configuration_id,
      ring_numbers: rings.into_iter().collect(),
    }
  }

  /// Checks the alert against a ring count of `k`. The error string is meant for the log line of
  /// whoever drops the message.
  pub fn validate(&self, k: usize) -> Result<(), String> {
    if self.ring_numbers.is_empty() {
      return Err(format!("alert {} -> {} carries no ring numbers", self.src, self.dst));
    }
    if let Some(r) = self.ring_numbers.iter().find(|r| **r as usize >= k) {
      return Err(format!(
        "alert {} -> {} has ring number {} outside [0, {})",
        self.src, self.dst, r, k
      ));
    }
    if self.src == self.dst {
      return Err(format!("alert {} is about its own source", self.src));
    }
    Ok(())
  }

  pub fn rings(&self) -> RingSet {
    self.ring_numbers.iter().copied().collect()
  }
}

#[cfg(test)]
fn test_alert(rings: Vec<u32>) -> AlertMessage {
  AlertMessage::new(
    Endpoint::from_parts("127.0.0.1", 1),
    Endpoint::from_parts("127.0.0.2", 2),
    EdgeStatus::Down,
    ConfigurationId(-1),
    rings,
  )
}

#[test]
fn test_alert_validation() {
  assert_eq!(test_alert(vec![0, 9]).validate(10), Ok(()));
  assert!(test_alert(vec![]).validate(10).is_err());
  assert!(test_alert(vec![3, 10]).validate(10).is_err());

  let mut selfish = test_alert(vec![1]);
  selfish.dst = selfish.src.clone();
  assert!(selfish.validate(10).is_err());
}

#[test]
fn test_alert_rings_dedupe() {
  let alert = test_alert(vec![4, 1, 4, 1]);
  assert_eq!(alert.rings().len(), 2);
  assert_eq!(alert.rings().iter().collect::<Vec<_>>(), vec![1, 4]);
}

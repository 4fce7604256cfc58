use crate::core::{AlertMessage, ConfigurationId, Endpoint, RingSet};
use crate::detection::{DetectionError, DetectorConfig};
use crate::membership::RingView;
use hashbrown::HashMap;
use linked_hash_map::LinkedHashMap;
use std::cmp::max;
use std::mem;
use tracing::{debug, error, info, trace};

/// How many subjects outside the view may sit below the low watermark at once. Past that, the
/// one reported least recently is forgotten.
pub const MAX_UNCONFIRMED_SUBJECTS: usize = 4096;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
  Accumulating,
  InProgress,
  Sealed,
  Decided,
}

#[derive(Clone, Copy, Debug)]
struct Reports {
  rings: RingSet,
  phase: Phase,
}

/// Aggregates alerts into cuts. A subject is delivered once `h` distinct rings reported it, but
/// only when no other subject has between `l` and `h` reports; until then the sealed subjects
/// wait in a ready list and go out together with the ones that were still in progress.
///
/// All methods take `&mut self`, so one call sees and updates a consistent view of every
/// subject. See [`SharedCutDetector`](crate::detection::SharedCutDetector) and
/// [`DetectorService`](crate::detection::DetectorService) for sharing one detector.
#[derive(Clone, Debug)]
pub struct CutDetector {
  config: DetectorConfig,
  configuration_id: ConfigurationId,
  reports: HashMap<Endpoint, Reports>,
  // Subjects in [l, h), in the order they got there.
  in_flux: LinkedHashMap<Endpoint, ()>,
  ready: Vec<Endpoint>,
  // Non-members below the low watermark, least recently reported first.
  unconfirmed: LinkedHashMap<Endpoint, ()>,
  unconfirmed_limit: usize,
  num_proposals: u64,
  disabled: bool,
}
impl CutDetector {
  pub fn new(
    config: DetectorConfig,
    configuration_id: ConfigurationId,
  ) -> Result<CutDetector, DetectionError> {
    config.check()?;
    Ok(CutDetector {
      config: config,
      configuration_id: configuration_id,
      reports: HashMap::new(),
      in_flux: LinkedHashMap::new(),
      ready: Vec::new(),
      unconfirmed: LinkedHashMap::new(),
      unconfirmed_limit: MAX_UNCONFIRMED_SUBJECTS,
      num_proposals: 0,
      disabled: false,
    })
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  pub fn configuration_id(&self) -> ConfigurationId {
    self.configuration_id
  }

  /// Number of cuts delivered over the lifetime of this detector.
  pub fn num_proposals(&self) -> u64 {
    self.num_proposals
  }

  /// Number of subjects holding back the next cut.
  pub fn in_progress(&self) -> usize {
    self.in_flux.len()
  }

  /// Sealed subjects waiting for the next cut, in the order they sealed.
  pub fn pending(&self) -> &[Endpoint] {
    &self.ready
  }

  /// Distinct rings on which `subject` has been reported in the current configuration. Zero once
  /// the subject went out in a cut.
  pub fn reports_for(&self, subject: &Endpoint) -> usize {
    self.reports.get(subject).map(|r| r.rings.len()).unwrap_or(0)
  }

  pub fn is_disabled(&self) -> bool {
    self.disabled
  }

  /// Number of subjects with reports in the current configuration.
  pub fn tracked_subjects(&self) -> usize {
    self.reports.len()
  }

  /// Bounds the subjects outside the view that are tracked below the low watermark. Defaults to
  /// [`MAX_UNCONFIRMED_SUBJECTS`]; at least one is always kept.
  pub fn set_unconfirmed_limit(&mut self, limit: usize) {
    self.unconfirmed_limit = max(limit, 1);
    self.evict_unconfirmed();
  }

  /// Feeds one alert to the detector and returns the cut it completes, if any. The cut is in the
  /// order its subjects sealed. An empty cut means more evidence is needed.
  ///
  /// Alerts from another configuration are ignored. Once an invariant violation is reported
  /// the detector refuses every further alert.
  pub fn aggregate(
    &mut self,
    alert: &AlertMessage,
    view: &RingView,
  ) -> Result<Vec<Endpoint>, DetectionError> {
    if self.disabled {
      return Err(DetectionError::Disabled);
    }
    alert
      .validate(self.config.k)
      .map_err(DetectionError::InvalidMessage)?;
    if alert.configuration_id != self.configuration_id {
      trace!(
        src = %alert.src,
        dst = %alert.dst,
        alert_configuration = %alert.configuration_id,
        configuration = %self.configuration_id,
        "ignoring alert from another configuration"
      );
      return Ok(Vec::new());
    }
    let result = self.aggregate_checked(alert, view);
    if let Err(DetectionError::InvariantViolation(reason)) = &result {
      error!(%reason, "disabling cut detector");
      self.disabled = true;
    }
    result
  }

  fn aggregate_checked(
    &mut self,
    alert: &AlertMessage,
    view: &RingView,
  ) -> Result<Vec<Endpoint>, DetectionError> {
    let member = view.contains(&alert.dst);
    let mut cut = self.report(&alert.dst, alert.rings(), member)?;
    cut.extend(self.invalidate_failing_edges(view)?);
    Ok(cut)
  }

  /// Drops everything learned under the previous configuration.
  pub fn reset_for_new_epoch(&mut self, configuration_id: ConfigurationId) {
    debug!(
      from = %self.configuration_id,
      to = %configuration_id,
      subjects = self.reports.len(),
      in_progress = self.in_flux.len(),
      pending = self.ready.len(),
      "resetting cut detector"
    );
    self.reports.clear();
    self.in_flux.clear();
    self.ready.clear();
    self.unconfirmed.clear();
    self.configuration_id = configuration_id;
  }

  fn report(
    &mut self,
    subject: &Endpoint,
    rings: RingSet,
    member: bool,
  ) -> Result<Vec<Endpoint>, DetectionError> {
    // With l = 0 the first report is the one that crosses.
    let low = max(self.config.l, 1);
    let high = self.config.h;
    let entry = self.reports.entry(subject.clone()).or_insert(Reports {
      rings: RingSet::EMPTY,
      phase: Phase::Accumulating,
    });
    if entry.phase == Phase::Sealed || entry.phase == Phase::Decided {
      return Ok(Vec::new());
    }
    let before = entry.rings.len();
    entry.rings = entry.rings.union(rings);
    let after = entry.rings.len();
    trace!(%subject, rings = after, "ring report recorded");

    if before < low && after >= low {
      entry.phase = Phase::InProgress;
      self.unconfirmed.remove(subject);
      self.in_flux.insert(subject.clone(), ());
      debug!(%subject, rings = after, "subject in progress");
    } else if after < low {
      if !member {
        self.unconfirmed.insert(subject.clone(), ());
        self.evict_unconfirmed();
      }
      return Ok(Vec::new());
    }
    if after < high {
      return Ok(Vec::new());
    }

    entry.phase = Phase::Sealed;
    if self.in_flux.remove(subject).is_none() {
      return Err(DetectionError::InvariantViolation(format!(
        "{} sealed without being in progress",
        subject
      )));
    }
    self.ready.push(subject.clone());
    debug!(%subject, blocked_by = self.in_flux.len(), "subject sealed");
    if !self.in_flux.is_empty() {
      return Ok(Vec::new());
    }
    self.flush()
  }

  fn flush(&mut self) -> Result<Vec<Endpoint>, DetectionError> {
    for subject in self.ready.iter() {
      match self.reports.get_mut(subject) {
        Some(r) if r.phase == Phase::Sealed => {
          r.rings = RingSet::EMPTY;
          r.phase = Phase::Decided;
        }
        _ => {
          return Err(DetectionError::InvariantViolation(format!(
            "{} is ready but has no sealed reports",
            subject
          )))
        }
      }
    }
    self.num_proposals += 1;
    let cut = mem::take(&mut self.ready);
    info!(
      size = cut.len(),
      proposal = self.num_proposals,
      configuration = %self.configuration_id,
      "cut detected"
    );
    Ok(cut)
  }

  // When an observer of an in-progress subject is itself failing, the subject may never collect
  // the reports it is missing. Count the failing observer's edge as reported.
  fn invalidate_failing_edges(&mut self, view: &RingView) -> Result<Vec<Endpoint>, DetectionError> {
    if self.in_flux.is_empty() {
      return Ok(Vec::new());
    }
    let mut implicit = Vec::new();
    for subject in self.in_flux.keys() {
      // Joiners are not on the rings yet.
      let observers = match view.observers_of(subject) {
        Ok(o) => o,
        Err(_) => continue,
      };
      for (ring, observer) in observers.iter().enumerate().take(self.config.k) {
        if self.is_unstable(observer) {
          implicit.push((observer.clone(), subject.clone(), ring as u32));
        }
      }
    }
    let mut cut = Vec::new();
    for (observer, subject, ring) in implicit {
      debug!(%observer, %subject, ring, "invalidating edge from failing observer");
      cut.extend(self.report(&subject, Some(ring).into_iter().collect(), true)?);
    }
    Ok(cut)
  }

  fn evict_unconfirmed(&mut self) {
    while self.unconfirmed.len() > self.unconfirmed_limit {
      if let Some((subject, _)) = self.unconfirmed.pop_front() {
        self.reports.remove(&subject);
        trace!(%subject, "forgetting unconfirmed subject");
      }
    }
  }

  fn is_unstable(&self, endpoint: &Endpoint) -> bool {
    match self.reports.get(endpoint) {
      Some(r) => r.phase == Phase::InProgress || r.phase == Phase::Sealed,
      None => false,
    }
  }
}

#[cfg(test)]
use crate::core::EdgeStatus;

#[cfg(test)]
fn test_alert(dst: &Endpoint, src_port: u16, rings: Vec<u32>) -> AlertMessage {
  AlertMessage::new(
    Endpoint::from_parts("127.0.0.1", src_port),
    dst.clone(),
    EdgeStatus::Down,
    ConfigurationId(-1),
    rings,
  )
}

#[test]
fn test_low_watermark_zero() {
  let mut detector =
    CutDetector::new(DetectorConfig::new(5, 2, 0).unwrap(), ConfigurationId(-1)).unwrap();
  let view = RingView::new(5).unwrap();
  let a = Endpoint::from_parts("127.0.0.2", 2);
  let b = Endpoint::from_parts("127.0.0.3", 2);
  assert!(detector.aggregate(&test_alert(&a, 1, vec![0]), &view).unwrap().is_empty());
  assert_eq!(detector.in_progress(), 1);
  assert!(detector.aggregate(&test_alert(&b, 1, vec![0]), &view).unwrap().is_empty());
  assert_eq!(detector.in_progress(), 2);
  assert!(detector.aggregate(&test_alert(&a, 2, vec![1]), &view).unwrap().is_empty());
  assert_eq!(detector.pending(), &[a.clone()]);
  let cut = detector.aggregate(&test_alert(&b, 2, vec![1]), &view).unwrap();
  assert_eq!(cut, vec![a, b]);
  assert_eq!(detector.num_proposals(), 1);
}

#[test]
fn test_multi_ring_alert_crosses_both_watermarks() {
  let mut detector =
    CutDetector::new(DetectorConfig::new(10, 8, 2).unwrap(), ConfigurationId(-1)).unwrap();
  let view = RingView::new(10).unwrap();
  let a = Endpoint::from_parts("127.0.0.2", 2);
  let cut = detector
    .aggregate(&test_alert(&a, 1, (0..10).collect()), &view)
    .unwrap();
  assert_eq!(cut, vec![a.clone()]);
  assert_eq!(detector.in_progress(), 0);
  assert_eq!(detector.reports_for(&a), 0);
  assert!(detector.aggregate(&test_alert(&a, 1, vec![0]), &view).unwrap().is_empty());
  assert_eq!(detector.reports_for(&a), 0);
}

#[test]
fn test_invariant_violation_disables() {
  let mut detector =
    CutDetector::new(DetectorConfig::new(10, 8, 2).unwrap(), ConfigurationId(-1)).unwrap();
  let view = RingView::new(10).unwrap();
  let a = Endpoint::from_parts("127.0.0.2", 2);
  detector
    .aggregate(&test_alert(&a, 1, (0..7).collect()), &view)
    .unwrap();
  detector.in_flux.clear();
  match detector.aggregate(&test_alert(&a, 1, vec![7]), &view) {
    Err(DetectionError::InvariantViolation(_)) => {}
    other => panic!("expected an invariant violation, got {:?}", other),
  }
  assert!(detector.is_disabled());
  assert_eq!(
    detector.aggregate(&test_alert(&a, 1, vec![8]), &view),
    Err(DetectionError::Disabled)
  );
  detector.reset_for_new_epoch(ConfigurationId(0));
  assert!(detector.is_disabled());
}

#[test]
fn test_invalid_alert_leaves_state_alone() {
  let mut detector =
    CutDetector::new(DetectorConfig::new(10, 8, 2).unwrap(), ConfigurationId(-1)).unwrap();
  let view = RingView::new(10).unwrap();
  let a = Endpoint::from_parts("127.0.0.2", 2);
  detector
    .aggregate(&test_alert(&a, 1, vec![0, 1, 2]), &view)
    .unwrap();
  let bad = test_alert(&a, 1, vec![3, 10]);
  match detector.aggregate(&bad, &view) {
    Err(DetectionError::InvalidMessage(_)) => {}
    other => panic!("expected an invalid message error, got {:?}", other),
  }
  assert_eq!(detector.reports_for(&a), 3);
  assert!(!detector.is_disabled());
}

#[test]
fn test_unconfirmed_limit_applies_at_once() {
  let mut detector =
    CutDetector::new(DetectorConfig::new(10, 8, 2).unwrap(), ConfigurationId(-1)).unwrap();
  let view = RingView::new(10).unwrap();
  let subjects = (2..8)
    .map(|p| Endpoint::from_parts("127.0.0.2", p))
    .collect::<Vec<_>>();
  for s in subjects.iter() {
    assert!(detector.aggregate(&test_alert(s, 1, vec![0]), &view).unwrap().is_empty());
  }
  assert_eq!(detector.tracked_subjects(), 6);

  detector.set_unconfirmed_limit(0);
  assert_eq!(detector.tracked_subjects(), 1);
  assert_eq!(detector.reports_for(&subjects[5]), 1);

  detector.reset_for_new_epoch(ConfigurationId(-1));
  assert!(detector.unconfirmed.is_empty());
  assert_eq!(detector.tracked_subjects(), 0);
}

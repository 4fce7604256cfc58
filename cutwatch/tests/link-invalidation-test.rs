use cutwatch::core::{EdgeStatus, Endpoint};
use cutwatch::detection::{CutDetector, DetectorConfig};
use cutwatch::membership::RingView;
use cutwatch::testkit::{
  alert_with, endpoint, init_logging, populated_view, LogLevel, TEST_CONFIGURATION,
};
use std::collections::HashSet;

const K: usize = 10;
const H: usize = 8;
const L: usize = 2;
const NUM_NODES: u16 = 30;

fn detector() -> CutDetector {
  CutDetector::new(DetectorConfig::new(K, H, L).unwrap(), TEST_CONFIGURATION).unwrap()
}

fn down(src: &Endpoint, dst: &Endpoint, ring: usize) -> cutwatch::core::AlertMessage {
  alert_with(src, dst, EdgeStatus::Down, TEST_CONFIGURATION, vec![ring as u32])
}

// A member whose observers on rings [H - 1, K) are all different nodes, so each of them fails
// on its own.
fn pick_subject(view: &RingView, members: &[Endpoint]) -> Endpoint {
  members
    .iter()
    .find(|m| {
      let observers = view.observers_of(m).unwrap();
      observers[H - 1..].iter().collect::<HashSet<_>>().len() == K - H + 1
    })
    .cloned()
    .expect("no member with distinct tail observers")
}

#[test]
fn cut_detection_link_invalidation() {
  init_logging(LogLevel::Warn);
  let (view, members) = populated_view(K, NUM_NODES, 42).unwrap();
  let mut wb = detector();

  let dst = pick_subject(&view, &members);
  let observers = view.observers_of(&dst).unwrap();
  assert_eq!(observers.len(), K);

  let mut ret = HashSet::new();
  // Alerts from observers [0, H - 1) of dst.
  for i in 0..H - 1 {
    ret.extend(wb.aggregate(&down(&observers[i], &dst, i), &view).unwrap());
    assert_eq!(ret.len(), 0);
    assert_eq!(wb.num_proposals(), 0);
  }

  // Then alerts *about* observers [H - 1, K) of dst.
  let mut failed_observers = HashSet::new();
  for i in H - 1..K {
    let observers_of_observer = view.observers_of(&observers[i]).unwrap();
    failed_observers.insert(observers[i].clone());
    for j in 0..K {
      let msg = down(&observers_of_observer[j], &observers[i], j);
      ret.extend(wb.aggregate(&msg, &view).unwrap());
    }
  }

  // The failing observers drag dst past H with them.
  assert_eq!(ret.len(), 4);
  assert_eq!(wb.num_proposals(), 3);
  for node in ret.iter() {
    assert!(failed_observers.contains(node) || node == &dst);
  }
  assert!(ret.contains(&dst));
}

#[test]
fn failing_observer_completes_its_subject() {
  let (view, members) = populated_view(K, NUM_NODES, 7).unwrap();
  let mut wb = detector();
  let dst = pick_subject(&view, &members);
  let observers = view.observers_of(&dst).unwrap();
  let failing = observers[K - 1].clone();

  for i in 0..H - 1 {
    assert!(wb.aggregate(&down(&observers[i], &dst, i), &view).unwrap().is_empty());
  }
  assert_eq!(wb.reports_for(&dst), H - 1);

  let watchers = view.observers_of(&failing).unwrap();
  assert!(wb.aggregate(&down(&watchers[0], &failing, 0), &view).unwrap().is_empty());
  // The failing observer is now in progress, so its edge to dst counts and dst seals.
  assert!(wb.aggregate(&down(&watchers[1], &failing, 1), &view).unwrap().is_empty());
  assert_eq!(wb.pending(), &[dst.clone()]);
  assert_eq!(wb.in_progress(), 1);

  let mut cut = Vec::new();
  for j in 2..K {
    cut.extend(wb.aggregate(&down(&watchers[j], &failing, j), &view).unwrap());
  }
  assert_eq!(cut, vec![dst, failing]);
  assert_eq!(wb.num_proposals(), 1);
}

#[test]
fn joiners_are_not_invalidated() {
  let (view, members) = populated_view(K, NUM_NODES, 3).unwrap();
  let mut wb = detector();
  let joiner = endpoint("127.0.0.3", 1);
  let observer = members[0].clone();

  for i in 0..H - 1 {
    let msg = alert_with(&members[i], &joiner, EdgeStatus::Up, TEST_CONFIGURATION, vec![i as u32]);
    assert!(wb.aggregate(&msg, &view).unwrap().is_empty());
  }
  // Put one of the members in progress as well; the joiner has no ring edges to invalidate.
  let watchers = view.observers_of(&observer).unwrap();
  for j in 0..L {
    assert!(wb.aggregate(&down(&watchers[j], &observer, j), &view).unwrap().is_empty());
  }
  assert_eq!(wb.reports_for(&joiner), H - 1);
  assert_eq!(wb.in_progress(), 2);
}

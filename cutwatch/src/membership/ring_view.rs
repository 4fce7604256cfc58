use crate::core::{Endpoint, NodeId, MAX_RINGS};
use hashbrown::HashSet;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::ops::Bound::{Excluded, Unbounded};
use thiserror::Error;
use wyhash::WyHash;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
  #[error("{0} is already in the ring")]
  AlreadyPresent(Endpoint),
  #[error("node id {0} is already used by another member")]
  DuplicateId(NodeId),
  #[error("{0} is not in the ring")]
  NotFound(Endpoint),
  #[error("ring count must be in [1, 64], got {0}")]
  InvalidRingCount(usize),
}

// The endpoint breaks ties between ids that hash to the same spot.
type RingKey = (u64, Endpoint);

/// `k` independent hash rings over the members of one configuration. A member's successor on
/// ring `r` is its observer on `r`, and it is in turn the observer of its predecessor.
///
/// Positions depend only on the member's [`NodeId`] and the ring index, so every node that
/// holds the same membership computes the same observers.
#[derive(Clone, Debug)]
pub struct RingView {
  rings: Vec<BTreeSet<RingKey>>,
  members: BTreeMap<Endpoint, NodeId>,
  ids: HashSet<NodeId>,
}
impl RingView {
  pub fn new(k: usize) -> Result<RingView, MembershipError> {
    if k == 0 || k > MAX_RINGS {
      return Err(MembershipError::InvalidRingCount(k));
    }
    Ok(RingView {
      rings: vec![BTreeSet::new(); k],
      members: BTreeMap::new(),
      ids: HashSet::new(),
    })
  }

  pub fn k(&self) -> usize {
    self.rings.len()
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  pub fn contains(&self, endpoint: &Endpoint) -> bool {
    self.members.contains_key(endpoint)
  }

  pub fn node_id(&self, endpoint: &Endpoint) -> Option<NodeId> {
    self.members.get(endpoint).copied()
  }

  /// All members, sorted by endpoint.
  pub fn members(&self) -> Vec<Endpoint> {
    self.members.keys().cloned().collect()
  }

  /// Members of ring `ring` in ring order.
  pub fn ring(&self, ring: usize) -> Vec<Endpoint> {
    self
      .rings
      .get(ring)
      .map(|r| r.iter().map(|(_, e)| e.clone()).collect())
      .unwrap_or_default()
  }

  pub fn add_node(&mut self, endpoint: Endpoint, id: NodeId) -> Result<(), MembershipError> {
    if self.members.contains_key(&endpoint) {
      return Err(MembershipError::AlreadyPresent(endpoint));
    }
    if self.ids.contains(&id) {
      return Err(MembershipError::DuplicateId(id));
    }
    for (r, ring) in self.rings.iter_mut().enumerate() {
      ring.insert((ring_hash(id, r), endpoint.clone()));
    }
    self.ids.insert(id);
    self.members.insert(endpoint, id);
    Ok(())
  }

  pub fn remove_node(&mut self, endpoint: &Endpoint) -> Result<(), MembershipError> {
    let id = self
      .members
      .remove(endpoint)
      .ok_or_else(|| MembershipError::NotFound(endpoint.clone()))?;
    self.ids.remove(&id);
    for (r, ring) in self.rings.iter_mut().enumerate() {
      ring.remove(&(ring_hash(id, r), endpoint.clone()));
    }
    Ok(())
  }

  /// The successor of `endpoint` on each ring, in ring order. Shorter than `k` only when there
  /// are fewer than `k` members.
  pub fn observers_of(&self, endpoint: &Endpoint) -> Result<Vec<Endpoint>, MembershipError> {
    let id = self
      .node_id(endpoint)
      .ok_or_else(|| MembershipError::NotFound(endpoint.clone()))?;
    Ok(self.neighbours(endpoint, id, |ring, key| {
      ring
        .range::<RingKey, _>((Excluded(key), Unbounded))
        .next()
        .or_else(|| ring.iter().next())
    }))
  }

  /// The predecessor of `endpoint` on each ring, i.e. the members it observes.
  pub fn subjects_of(&self, endpoint: &Endpoint) -> Result<Vec<Endpoint>, MembershipError> {
    let id = self
      .node_id(endpoint)
      .ok_or_else(|| MembershipError::NotFound(endpoint.clone()))?;
    Ok(self.neighbours(endpoint, id, |ring, key| {
      ring
        .range::<RingKey, _>((Unbounded, Excluded(key)))
        .next_back()
        .or_else(|| ring.iter().next_back())
    }))
  }

  /// The rings on which `observer` monitors `subject`. This is what goes into the ring numbers of
  /// an alert `observer` raises about `subject`.
  pub fn ring_numbers(
    &self,
    observer: &Endpoint,
    subject: &Endpoint,
  ) -> Result<Vec<u32>, MembershipError> {
    Ok(
      self
        .observers_of(subject)?
        .iter()
        .positions(|o| o == observer)
        .map(|p| p as u32)
        .collect(),
    )
  }

  fn neighbours<'a, F>(&'a self, endpoint: &Endpoint, id: NodeId, step: F) -> Vec<Endpoint>
  where
    F: Fn(&'a BTreeSet<RingKey>, &RingKey) -> Option<&'a RingKey>,
  {
    if self.members.len() <= 1 {
      return Vec::new();
    }
    // Only clusters smaller than `k` drop rings; from `k` members on, observers may repeat.
    let cap = if self.members.len() < self.k() {
      self.members.len() - 1
    } else {
      self.k()
    };
    self
      .rings
      .iter()
      .enumerate()
      .take(cap)
      .filter_map(|(r, ring)| {
        let key = (ring_hash(id, r), endpoint.clone());
        step(ring, &key).map(|(_, e)| e.clone())
      })
      .collect()
  }
}

fn ring_hash(id: NodeId, ring: usize) -> u64 {
  let mut hasher = WyHash::with_seed(ring as u64);
  id.hash(&mut hasher);
  hasher.finish()
}

#[cfg(test)]
fn test_members(n: u16) -> Vec<(Endpoint, NodeId)> {
  (0..n)
    .map(|x| {
      (
        Endpoint::from_parts("127.0.0.1", 5000 + x),
        NodeId(0x9e37_79b9_7f4a_7c15u64.wrapping_mul(x as u64 + 1)),
      )
    })
    .collect()
}

#[test]
fn test_ring_view_observers_and_subjects() {
  let mut view = RingView::new(4).unwrap();
  for (e, id) in test_members(10) {
    view.add_node(e, id).unwrap();
  }
  for member in view.members() {
    let observers = view.observers_of(&member).unwrap();
    assert_eq!(observers.len(), 4);
    assert!(!observers.contains(&member));
    for (r, observer) in observers.iter().enumerate() {
      assert_eq!(view.subjects_of(observer).unwrap()[r], member);
      assert!(view.ring_numbers(observer, &member).unwrap().contains(&(r as u32)));
    }
  }
}

#[test]
fn test_ring_view_insertion_order_independent() {
  let mut forward = RingView::new(5).unwrap();
  let mut backward = RingView::new(5).unwrap();
  let members = test_members(12);
  for (e, id) in members.iter() {
    forward.add_node(e.clone(), *id).unwrap();
  }
  for (e, id) in members.iter().rev() {
    backward.add_node(e.clone(), *id).unwrap();
  }
  for r in 0..5 {
    assert_eq!(forward.ring(r), backward.ring(r));
  }
  for (e, _) in members.iter() {
    assert_eq!(forward.observers_of(e), backward.observers_of(e));
    assert_eq!(forward.subjects_of(e), backward.subjects_of(e));
  }
}

#[test]
fn test_ring_view_errors() {
  let mut view = RingView::new(3).unwrap();
  let members = test_members(3);
  let (a, a_id) = members[0].clone();
  let (b, _) = members[1].clone();
  view.add_node(a.clone(), a_id).unwrap();
  assert_eq!(
    view.add_node(a.clone(), NodeId(1)),
    Err(MembershipError::AlreadyPresent(a.clone()))
  );
  assert_eq!(view.add_node(b.clone(), a_id), Err(MembershipError::DuplicateId(a_id)));
  assert_eq!(view.remove_node(&b), Err(MembershipError::NotFound(b.clone())));
  assert_eq!(view.observers_of(&b), Err(MembershipError::NotFound(b.clone())));
  assert!(view.observers_of(&a).unwrap().is_empty());
  view.remove_node(&a).unwrap();
  assert!(view.is_empty());
  for r in 0..3 {
    assert!(view.ring(r).is_empty());
  }
  // The id is free again once its owner is gone.
  view.add_node(b, a_id).unwrap();
  assert_eq!(RingView::new(0).err(), Some(MembershipError::InvalidRingCount(0)));
  assert_eq!(RingView::new(65).err(), Some(MembershipError::InvalidRingCount(65)));
}

#[test]
fn test_ring_view_small_cluster_cap() {
  let mut view = RingView::new(10).unwrap();
  for (e, id) in test_members(3) {
    view.add_node(e, id).unwrap();
  }
  for member in view.members() {
    assert_eq!(view.observers_of(&member).unwrap().len(), 2);
    assert_eq!(view.subjects_of(&member).unwrap().len(), 2);
  }
}

#[test]
fn test_ring_view_k_members_keep_every_ring() {
  let mut view = RingView::new(5).unwrap();
  for (e, id) in test_members(5) {
    view.add_node(e, id).unwrap();
  }
  for member in view.members() {
    let observers = view.observers_of(&member).unwrap();
    assert_eq!(observers.len(), 5);
    assert_eq!(view.subjects_of(&member).unwrap().len(), 5);
    assert!(!observers.contains(&member));
  }
}

#[test]
fn test_ring_view_removal_touches_neighbours_only() {
  let mut view = RingView::new(4).unwrap();
  let members = test_members(16);
  for (e, id) in members.iter() {
    view.add_node(e.clone(), *id).unwrap();
  }
  let before = view
    .members()
    .into_iter()
    .map(|m| (m.clone(), view.observers_of(&m).unwrap()))
    .collect::<BTreeMap<_, _>>();
  let gone = members[7].0.clone();
  let subjects = view.subjects_of(&gone).unwrap();
  view.remove_node(&gone).unwrap();
  for (member, observers) in before {
    if member == gone {
      continue;
    }
    let after = view.observers_of(&member).unwrap();
    for (r, (old, new)) in observers.iter().zip(after.iter()).enumerate() {
      if old != new {
        assert_eq!(old, &gone);
        assert_eq!(subjects[r], member);
      }
    }
  }
}

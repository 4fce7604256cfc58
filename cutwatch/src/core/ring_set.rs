use serde::{Deserialize, Serialize};
use std::fmt;

/// The largest ring count a [`RingSet`] can hold.
pub const MAX_RINGS: usize = 64;

/// A set of ring numbers in `[0, 64)`, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingSet(u64);
impl RingSet {
  pub const EMPTY: RingSet = RingSet(0);

  pub fn new() -> RingSet {
    RingSet::EMPTY
  }

  /// Returns false if the ring was already present or is out of range.
  pub fn insert(&mut self, ring: u32) -> bool {
    if ring as usize >= MAX_RINGS {
      return false;
    }
    let before = self.0;
    self.0 |= 1u64 << ring;
    before != self.0
  }

  pub fn contains(&self, ring: u32) -> bool {
    (ring as usize) < MAX_RINGS && self.0 & (1u64 << ring) != 0
  }

  pub fn union(&self, other: RingSet) -> RingSet {
    RingSet(self.0 | other.0)
  }

  pub fn len(&self) -> usize {
    self.0.count_ones() as usize
  }

  pub fn is_empty(&self) -> bool {
    self.0 == 0
  }

  pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
    let bits = self.0;
    (0..MAX_RINGS as u32).filter(move |r| bits & (1u64 << r) != 0)
  }
}
impl std::iter::FromIterator<u32> for RingSet {
  fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
    let mut set = RingSet::new();
    for ring in iter {
      set.insert(ring);
    }
    set
  }
}
impl fmt::Debug for RingSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[test]
fn test_ring_set() {
  let mut set = RingSet::new();
  assert!(set.is_empty());
  assert!(set.insert(0));
  assert!(set.insert(63));
  assert!(!set.insert(63));
  assert!(!set.insert(64));
  assert_eq!(set.len(), 2);
  assert!(set.contains(63));
  assert!(!set.contains(64));
  assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63]);

  let other: RingSet = vec![1, 2, 2, 63].into_iter().collect();
  let both = set.union(other);
  assert_eq!(both.len(), 4);
  assert_eq!(format!("{:?}", both), "{0, 1, 2, 63}");
}

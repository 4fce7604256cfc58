use cutwatch::core::{Endpoint, NodeId};
use cutwatch::membership::{MembershipError, RingView};
use cutwatch::testkit::{endpoint, populated_view};
use maplit::btreeset;
use std::collections::BTreeSet;

const K: usize = 10;

fn check_consistent(view: &RingView) {
  let members = view.members().into_iter().collect::<BTreeSet<_>>();
  for r in 0..view.k() {
    assert_eq!(view.ring(r).into_iter().collect::<BTreeSet<_>>(), members);
  }
  for member in members.iter() {
    let observers = view.observers_of(member).unwrap();
    let subjects = view.subjects_of(member).unwrap();
    let expected = if members.len() < K { members.len() - 1 } else { K };
    assert_eq!(observers.len(), expected);
    assert_eq!(subjects.len(), observers.len());
    for (r, observer) in observers.iter().enumerate() {
      assert_ne!(observer, member);
      assert!(members.contains(observer));
      assert_eq!(&view.subjects_of(observer).unwrap()[r], member);
    }
    for (r, subject) in subjects.iter().enumerate() {
      assert_eq!(&view.observers_of(subject).unwrap()[r], member);
    }
  }
}

#[test]
fn observers_and_subjects_are_inverse() {
  let (view, members) = populated_view(K, 50, 1).unwrap();
  assert_eq!(view.len(), 50);
  assert_eq!(view.members(), members);
  check_consistent(&view);
}

#[test]
fn churn_keeps_rings_consistent() {
  let (mut view, members) = populated_view(K, 30, 2).unwrap();
  let leaving = members.iter().step_by(4).cloned().collect::<Vec<Endpoint>>();
  for m in leaving.iter() {
    view.remove_node(m).unwrap();
  }
  check_consistent(&view);
  assert_eq!(view.len(), 30 - leaving.len());

  for (i, m) in leaving.iter().enumerate() {
    view.add_node(m.clone(), NodeId(0xdead_0000 + i as u64)).unwrap();
  }
  check_consistent(&view);
  assert_eq!(view.len(), 30);
}

#[test]
fn ring_numbers_name_every_monitoring_ring() {
  let (view, members) = populated_view(K, 12, 5).unwrap();
  for subject in members.iter() {
    let observers = view.observers_of(subject).unwrap();
    let distinct = observers.iter().cloned().collect::<BTreeSet<_>>();
    let mut seen = BTreeSet::new();
    for observer in distinct.iter() {
      for ring in view.ring_numbers(observer, subject).unwrap() {
        assert_eq!(&observers[ring as usize], observer);
        assert!(seen.insert(ring));
      }
    }
    assert_eq!(seen, (0..K as u32).collect::<BTreeSet<_>>());
    assert!(view.ring_numbers(subject, subject).unwrap().is_empty());
  }
}

#[test]
fn exactly_k_members_use_every_ring() {
  let (view, members) = populated_view(K, K as u16, 1).unwrap();
  check_consistent(&view);
  for subject in members.iter() {
    let observers = view.observers_of(subject).unwrap();
    assert_eq!(observers.len(), K);
    let mut rings = BTreeSet::new();
    for observer in observers.iter() {
      rings.extend(view.ring_numbers(observer, subject).unwrap());
    }
    assert_eq!(rings, (0..K as u32).collect::<BTreeSet<_>>());
  }
}

#[test]
fn two_member_view() {
  let mut view = RingView::new(K).unwrap();
  let a = endpoint("127.0.0.2", 2);
  let b = endpoint("127.0.0.2", 3);
  view.add_node(a.clone(), NodeId(1)).unwrap();
  view.add_node(b.clone(), NodeId(2)).unwrap();
  assert_eq!(view.observers_of(&a).unwrap(), vec![b.clone()]);
  assert_eq!(view.subjects_of(&b).unwrap(), vec![a.clone()]);
  assert_eq!(view.members().into_iter().collect::<BTreeSet<_>>(), btreeset! {a.clone(), b});

  let c = endpoint("127.0.0.2", 4);
  assert_eq!(view.ring_numbers(&a, &c), Err(MembershipError::NotFound(c)));
}

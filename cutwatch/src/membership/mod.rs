//! Who watches whom.
//!
//! Members do not monitor every other member, only a small subset. The alternative would lead to
//! a quadratic increase in probing traffic as the cluster grows. Instead, every member is placed
//! on `K` independent [consistent hashing](https://en.wikipedia.org/wiki/Consistent_hashing)
//! rings (a [`RingView`] in code), at a position derived from its [`NodeId`] and the ring index.
//! On each ring a member is observed by its successor, so every member has up to `K` observers
//! and observes up to `K` subjects. When a member joins or leaves, only its neighbours on each
//! ring change their monitoring relationships.
//!
//! A [`RingView`] is the view of one configuration. It is only changed when a new configuration
//! is adopted; in between, readers (the cut detector among them) borrow it.
//!
//! [`NodeId`]: crate::core::NodeId

mod ring_view;

#[rustfmt::skip]
pub use {
  ring_view::MembershipError,
  ring_view::RingView,
};

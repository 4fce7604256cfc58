use crate::core::{AlertMessage, ConfigurationId, EdgeStatus, Endpoint, NodeId};
use crate::membership::{MembershipError, RingView};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Configuration used by alerts built with [`alert`].
pub const TEST_CONFIGURATION: ConfigurationId = ConfigurationId(-1);

pub fn endpoint(host: &str, port: u16) -> Endpoint {
  Endpoint::from_parts(host, port)
}

/// A single-ring alert under [`TEST_CONFIGURATION`].
pub fn alert(src: &Endpoint, dst: &Endpoint, ring: u32) -> AlertMessage {
  alert_with(src, dst, EdgeStatus::Up, TEST_CONFIGURATION, vec![ring])
}

pub fn alert_with<I>(
  src: &Endpoint,
  dst: &Endpoint,
  status: EdgeStatus,
  configuration_id: ConfigurationId,
  rings: I,
) -> AlertMessage
where
  I: IntoIterator<Item = u32>,
{
  AlertMessage::new(src.clone(), dst.clone(), status, configuration_id, rings)
}

/// A `k`-ring view of `n` members on `127.0.0.2`, ports from 2 upwards, with node ids drawn
/// from a generator seeded with `seed`. Returns the members in port order.
pub fn populated_view(
  k: usize,
  n: u16,
  seed: u64,
) -> Result<(RingView, Vec<Endpoint>), MembershipError> {
  let mut rng = SmallRng::seed_from_u64(seed);
  let mut view = RingView::new(k)?;
  let mut members = Vec::with_capacity(n as usize);
  for i in 0..n {
    let member = endpoint("127.0.0.2", 2 + i);
    view.add_node(member.clone(), NodeId(rng.gen()))?;
    members.push(member);
  }
  Ok((view, members))
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// The DNS name or IP address of the machine hosting a cluster member.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub enum Host {
  DNS(String),
  IP(IpAddr),
}
impl From<String> for Host {
  fn from(s: String) -> Self {
    match IpAddr::from_str(s.as_str()) {
      Ok(ip) => Host::IP(ip),
      Err(_) => Host::DNS(s),
    }
  }
}
impl From<&str> for Host {
  fn from(s: &str) -> Self {
    Host::from(s.to_string())
  }
}
impl fmt::Display for Host {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Host::DNS(s) => write!(f, "{}", s),
      Host::IP(IpAddr::V6(ip)) => write!(f, "[{}]", ip),
      Host::IP(ip) => write!(f, "{}", ip),
    }
  }
}

/// The address of a cluster member. Alerts, observers and cuts are all expressed in terms of
/// [`Endpoint`]s.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Ord, PartialOrd)]
pub struct Endpoint {
  /// The DNS name or IP address of the member.
  pub host: Host,
  /// The port the member's membership service listens on.
  pub port: u16,
}
impl Endpoint {
  /// Creates a new [`Endpoint`]
  pub fn new(host: Host, port: u16) -> Endpoint {
    Endpoint {
      host: host,
      port: port,
    }
  }

  pub fn from_parts<H: Into<Host>>(host: H, port: u16) -> Endpoint {
    Endpoint::new(host.into(), port)
  }
}
impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.host, self.port)
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointParseError {
  #[error("endpoint {0:?} is missing a port")]
  MissingPort(String),
  #[error("endpoint {0:?} has an invalid port")]
  InvalidPort(String),
  #[error("endpoint {0:?} has an empty host")]
  EmptyHost(String),
}

impl FromStr for Endpoint {
  type Err = EndpointParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let idx = s
      .rfind(':')
      .ok_or_else(|| EndpointParseError::MissingPort(s.to_string()))?;
    let (host, port) = (&s[..idx], &s[idx + 1..]);
    let port = port
      .parse::<u16>()
      .map_err(|_| EndpointParseError::InvalidPort(s.to_string()))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
      return Err(EndpointParseError::EmptyHost(s.to_string()));
    }
    Ok(Endpoint::from_parts(host, port))
  }
}

/// Identifies one incarnation of a member. A node that rejoins after being removed must come
/// back with a fresh id, since the id decides where it sits on every ring.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Ord, PartialOrd)]
pub struct NodeId(pub u64);
impl From<u64> for NodeId {
  fn from(id: u64) -> Self {
    NodeId(id)
  }
}
impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:016x}", self.0)
  }
}

#[test]
fn test_endpoint_parse() {
  let ep: Endpoint = "127.0.0.1:5000".parse().unwrap();
  assert_eq!(ep, Endpoint::from_parts("127.0.0.1", 5000));
  assert!(matches!(ep.host, Host::IP(_)));
  assert_eq!(ep.to_string(), "127.0.0.1:5000");

  let ep: Endpoint = "localhost:1".parse().unwrap();
  assert_eq!(ep.host, Host::DNS("localhost".to_string()));

  let ep: Endpoint = "[::1]:80".parse().unwrap();
  assert_eq!(ep.to_string(), "[::1]:80");

  assert_eq!(
    "localhost".parse::<Endpoint>(),
    Err(EndpointParseError::MissingPort("localhost".to_string()))
  );
  assert_eq!(
    "localhost:99999".parse::<Endpoint>(),
    Err(EndpointParseError::InvalidPort("localhost:99999".to_string()))
  );
  assert_eq!(
    ":80".parse::<Endpoint>(),
    Err(EndpointParseError::EmptyHost(":80".to_string()))
  );
}

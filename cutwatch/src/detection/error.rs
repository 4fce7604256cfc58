use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
  #[error("arguments do not satisfy 64 >= K > H >= L >= 0 and K >= 3 (K: {k}, H: {h}, L: {l})")]
  InvalidArgument { k: usize, h: usize, l: usize },
  #[error("invalid alert: {0}")]
  InvalidMessage(String),
  #[error("cut detector invariant violated: {0}")]
  InvariantViolation(String),
  #[error("cut detector is disabled after an invariant violation")]
  Disabled,
}

use crate::detection::DetectionError;
use serde::{Deserialize, Serialize};
use std::env::var;
use validator::{Validate, ValidationError};

/// Smallest ring count that still lets the watermarks sit strictly between 0 and `k`.
pub const K_MIN: usize = 3;

/// Ring count `k` and the watermarks of the cut detector. A member is only considered for a cut
/// once `h` distinct rings reported it, and it holds back every other cut once `l` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_watermarks"))]
pub struct DetectorConfig {
  #[validate(range(min = 3, max = 64))]
  pub k: usize,
  pub h: usize,
  pub l: usize,
}
impl DetectorConfig {
  pub fn new(k: usize, h: usize, l: usize) -> Result<DetectorConfig, DetectionError> {
    let cfg = DetectorConfig { k: k, h: h, l: l };
    cfg.check()?;
    Ok(cfg)
  }

  /// The defaults, overridden by `CUTWATCH_K`, `CUTWATCH_H` and `CUTWATCH_L` where those parse.
  /// The result is not checked.
  pub fn from_env() -> DetectorConfig {
    let d = DetectorConfig::default();
    DetectorConfig {
      k: env_or("CUTWATCH_K", d.k),
      h: env_or("CUTWATCH_H", d.h),
      l: env_or("CUTWATCH_L", d.l),
    }
  }

  pub fn check(&self) -> Result<(), DetectionError> {
    self.validate().map_err(|_| DetectionError::InvalidArgument {
      k: self.k,
      h: self.h,
      l: self.l,
    })
  }
}
impl Default for DetectorConfig {
  fn default() -> Self {
    DetectorConfig { k: 10, h: 9, l: 4 }
  }
}

fn validate_watermarks(cfg: &DetectorConfig) -> Result<(), ValidationError> {
  if cfg.h >= cfg.k || cfg.l > cfg.h {
    return Err(ValidationError::new("watermarks"));
  }
  Ok(())
}

fn env_or(key: &str, default: usize) -> usize {
  var(key)
    .map(|x| x.parse().ok())
    .ok()
    .flatten()
    .unwrap_or(default)
}

#[test]
fn test_detector_config_bounds() {
  assert!(DetectorConfig::default().check().is_ok());
  assert!(DetectorConfig::new(10, 8, 2).is_ok());
  assert!(DetectorConfig::new(K_MIN, K_MIN - 1, 0).is_ok());
  assert!(DetectorConfig::new(64, 63, 63).is_ok());
  for (k, h, l) in vec![(10, 11, 2), (10, 10, 2), (10, 8, 9), (2, 1, 1), (65, 9, 4)] {
    assert_eq!(
      DetectorConfig::new(k, h, l),
      Err(DetectionError::InvalidArgument { k: k, h: h, l: l })
    );
  }
}

#[test]
fn test_detector_config_from_env() {
  std::env::set_var("CUTWATCH_K", "12");
  std::env::set_var("CUTWATCH_H", "not-a-number");
  std::env::remove_var("CUTWATCH_L");
  let cfg = DetectorConfig::from_env();
  std::env::remove_var("CUTWATCH_K");
  std::env::remove_var("CUTWATCH_H");
  assert_eq!(cfg, DetectorConfig { k: 12, h: 9, l: 4 });
}

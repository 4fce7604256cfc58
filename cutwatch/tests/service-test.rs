use cutwatch::core::{ConfigurationId, EdgeStatus};
use cutwatch::detection::{CutDetector, DecidedCut, DetectorConfig, DetectorService};
use cutwatch::membership::RingView;
use cutwatch::testkit::{alert, alert_with, endpoint, TEST_CONFIGURATION};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_test::assert_ok;

const K: usize = 10;
const H: usize = 8;
const L: usize = 2;

fn detector() -> CutDetector {
  let config = assert_ok!(DetectorConfig::new(K, H, L));
  assert_ok!(CutDetector::new(config, TEST_CONFIGURATION))
}

#[tokio::test]
async fn service_delivers_cuts() {
  let (tx, mut cuts) = unbounded_channel();
  let service = DetectorService::spawn(detector(), tx);
  let view = Arc::new(RingView::new(K).unwrap());
  let dst1 = endpoint("127.0.0.2", 2);
  let dst2 = endpoint("127.0.0.3", 2);

  for ring in 0..H as u32 - 1 {
    assert!(service.alert(alert(&endpoint("127.0.0.1", 1), &dst1, ring), view.clone()));
    assert!(service.alert(alert(&endpoint("127.0.0.1", 1), &dst2, ring), view.clone()));
  }
  // Malformed alerts are dropped without stopping the service.
  let bad = alert_with(&dst1, &dst1, EdgeStatus::Down, TEST_CONFIGURATION, vec![0]);
  assert!(service.alert(bad, view.clone()));
  assert!(service.alert(alert(&endpoint("127.0.0.1", 1), &dst2, H as u32 - 1), view.clone()));
  assert!(service.alert(alert(&endpoint("127.0.0.1", 1), &dst1, H as u32 - 1), view.clone()));

  let cut = cuts.recv().await.unwrap();
  assert_eq!(
    cut,
    DecidedCut {
      configuration_id: TEST_CONFIGURATION,
      proposal: 1,
      endpoints: vec![dst2, dst1],
    }
  );
  assert_eq!(service.num_proposals().await, Some(1));
  assert!(cuts.try_recv().is_err());
}

#[tokio::test]
async fn service_reset_and_stop() {
  let (tx, mut cuts) = unbounded_channel();
  let service = DetectorService::spawn(detector(), tx);
  let view = Arc::new(RingView::new(K).unwrap());
  let dst = endpoint("127.0.0.2", 2);
  let src = endpoint("127.0.0.1", 1);

  for ring in 0..H as u32 - 1 {
    assert!(service.alert(alert(&src, &dst, ring), view.clone()));
  }
  let next = ConfigurationId(3);
  assert!(service.reset(next));
  // Old-configuration alerts no longer count.
  assert!(service.alert(alert(&src, &dst, H as u32 - 1), view.clone()));
  let all = alert_with(&src, &dst, EdgeStatus::Down, next, 0..H as u32);
  assert!(service.alert(all, view.clone()));

  let cut = cuts.recv().await.unwrap();
  assert_eq!(cut.configuration_id, next);
  assert_eq!(cut.endpoints, vec![dst]);
  assert_eq!(service.num_proposals().await, Some(1));

  assert!(service.stop());
  assert_eq!(service.num_proposals().await, None);
  assert!(cuts.recv().await.is_none());
}

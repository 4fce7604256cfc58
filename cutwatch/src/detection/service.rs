use crate::core::{AlertMessage, ConfigurationId, Endpoint};
use crate::detection::{CutDetector, DetectionError};
use crate::membership::RingView;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{error, warn};
use DetectorMsg::*;

/// A cut as handed to whoever proposes the next configuration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecidedCut {
  pub configuration_id: ConfigurationId,
  /// Running count of cuts from this detector, starting at 1.
  pub proposal: u64,
  pub endpoints: Vec<Endpoint>,
}

pub enum DetectorMsg {
  Alert(AlertMessage, Arc<RingView>),
  Reset(ConfigurationId),
  NumProposals(oneshot::Sender<u64>),
  Stop,
}

/// Owns a [`CutDetector`] on its own task. Alerts are handled one at a time in the order they
/// arrive, and every cut is sent to the subscriber exactly once.
pub struct DetectorService {
  detector: CutDetector,
  subscriber: UnboundedSender<DecidedCut>,
}
impl DetectorService {
  /// Must be called from within a tokio runtime.
  pub fn spawn(detector: CutDetector, subscriber: UnboundedSender<DecidedCut>) -> DetectorRef {
    let (tx, rx) = unbounded_channel();
    let service = DetectorService {
      detector: detector,
      subscriber: subscriber,
    };
    tokio::spawn(service.run(rx));
    DetectorRef { tx: tx }
  }

  async fn run(mut self, mut rx: UnboundedReceiver<DetectorMsg>) {
    while let Some(msg) = rx.recv().await {
      match msg {
        Alert(alert, view) => match self.detector.aggregate(&alert, &view) {
          Ok(cut) => {
            if !cut.is_empty() {
              self.deliver(cut);
            }
          }
          Err(DetectionError::InvalidMessage(reason)) => {
            warn!(src = %alert.src, dst = %alert.dst, %reason, "dropping alert");
          }
          Err(e) => {
            error!(error = %e, "stopping cut detector service");
            break;
          }
        },
        Reset(configuration_id) => self.detector.reset_for_new_epoch(configuration_id),
        NumProposals(tx) => {
          let _ = tx.send(self.detector.num_proposals());
        }
        Stop => break,
      }
    }
  }

  fn deliver(&self, endpoints: Vec<Endpoint>) {
    let cut = DecidedCut {
      configuration_id: self.detector.configuration_id(),
      proposal: self.detector.num_proposals(),
      endpoints: endpoints,
    };
    if self.subscriber.send(cut).is_err() {
      warn!("cut subscriber is gone, cut dropped");
    }
  }
}

/// Handle to a running [`DetectorService`]. The sending methods return false once the service
/// has stopped.
#[derive(Clone)]
pub struct DetectorRef {
  tx: UnboundedSender<DetectorMsg>,
}
impl DetectorRef {
  pub fn alert(&self, alert: AlertMessage, view: Arc<RingView>) -> bool {
    self.tx.send(Alert(alert, view)).is_ok()
  }

  pub fn reset(&self, configuration_id: ConfigurationId) -> bool {
    self.tx.send(Reset(configuration_id)).is_ok()
  }

  pub async fn num_proposals(&self) -> Option<u64> {
    let (tx, rx) = oneshot::channel();
    if self.tx.send(NumProposals(tx)).is_err() {
      return None;
    }
    rx.await.ok()
  }

  pub fn stop(&self) -> bool {
    self.tx.send(Stop).is_ok()
  }
}

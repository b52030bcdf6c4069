//! Access checker whose responses are released by the test
//!
//! Every `check_feature_access` call parks on a oneshot channel until the test
//! resolves it, so tests control exactly when and in which order each
//! feature's response arrives.

use async_trait::async_trait;
use parking_lot::Mutex;
use permval_core::{
    AccessCheckError, AccessChecker, DisplayMode, FeatureId, ItemGrantRecord, PrincipalSelection,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

type Outcome = Result<Vec<ItemGrantRecord>, AccessCheckError>;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One recorded `check_feature_access` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCall {
    /// Feature checked
    pub feature_id: FeatureId,
    /// Mode requested
    pub mode: DisplayMode,
    /// Principals checked against
    pub selection: PrincipalSelection,
}

#[derive(Default)]
struct Inner {
    parked: HashMap<FeatureId, VecDeque<oneshot::Sender<Outcome>>>,
    calls: Vec<AccessCall>,
}

/// Controllable [`AccessChecker`]
#[derive(Clone, Default)]
pub struct ControlledAccessChecker {
    inner: Arc<Mutex<Inner>>,
    issued: Arc<Notify>,
}

impl ControlledAccessChecker {
    /// Checker with nothing parked
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the oldest parked call for a feature.
    ///
    /// Returns whether a caller received the outcome; `false` when nothing is
    /// parked or the call was aborted.
    pub fn resolve(&self, feature_id: impl Into<FeatureId>, outcome: Outcome) -> bool {
        let feature_id = feature_id.into();
        let sender = self
            .inner
            .lock()
            .parked
            .get_mut(&feature_id)
            .and_then(VecDeque::pop_front);
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Every call made so far, in issue order
    pub fn calls(&self) -> Vec<AccessCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Number of calls parked for a feature
    pub fn parked(&self, feature_id: impl Into<FeatureId>) -> usize {
        let feature_id = feature_id.into();
        self.inner
            .lock()
            .parked
            .get(&feature_id)
            .map_or(0, VecDeque::len)
    }

    /// Wait until at least `count` calls have been made.
    ///
    /// Panics after five seconds.
    pub async fn wait_for_calls(&self, count: usize) {
        let wait = async {
            loop {
                let issued = self.issued.notified();
                if self.call_count() >= count {
                    return;
                }
                issued.await;
            }
        };
        tokio::time::timeout(WAIT_TIMEOUT, wait)
            .await
            .unwrap_or_else(|_| panic!("expected {count} access checks, saw {}", self.call_count()));
    }
}

#[async_trait]
impl AccessChecker for ControlledAccessChecker {
    async fn check_feature_access(
        &self,
        feature_id: &FeatureId,
        mode: DisplayMode,
        selection: &PrincipalSelection,
    ) -> Result<Vec<ItemGrantRecord>, AccessCheckError> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut inner = self.inner.lock();
            inner
                .parked
                .entry(feature_id.clone())
                .or_default()
                .push_back(sender);
            inner.calls.push(AccessCall {
                feature_id: feature_id.clone(),
                mode,
                selection: selection.clone(),
            });
        }
        self.issued.notify_waiters();

        receiver
            .await
            .unwrap_or_else(|_| Err(AccessCheckError::unexpected("TestCheckerDropped", "checker dropped")))
    }
}

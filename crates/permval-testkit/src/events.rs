//! Helpers for reading validator events in tests

use permval_app::{ChannelSink, RunProgress, Toast, ToastLevel, ValidatorEvent};
use permval_core::RunId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receiving side of a [`ChannelSink`] with test assertions
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<ValidatorEvent>,
    seen: Vec<ValidatorEvent>,
}

impl EventStream {
    /// A sink and the stream that reads it
    pub fn channel() -> (Arc<ChannelSink>, Self) {
        let (sink, receiver) = ChannelSink::new();
        (
            Arc::new(sink),
            Self {
                receiver,
                seen: Vec::new(),
            },
        )
    }

    /// Next event; panics after five seconds
    pub async fn next(&mut self) -> ValidatorEvent {
        let event = tokio::time::timeout(EVENT_TIMEOUT, self.receiver.recv())
            .await
            .expect("timed out waiting for validator event")
            .expect("validator event channel closed");
        self.seen.push(event.clone());
        event
    }

    /// Read events until one matches, returning it
    pub async fn next_matching<F>(&mut self, mut predicate: F) -> ValidatorEvent
    where
        F: FnMut(&ValidatorEvent) -> bool,
    {
        loop {
            let event = self.next().await;
            if predicate(&event) {
                return event;
            }
        }
    }

    /// Next progress event for `run_id`
    pub async fn next_progress(&mut self, run_id: RunId) -> RunProgress {
        match self
            .next_matching(|event| {
                matches!(event, ValidatorEvent::Progress { run_id: id, .. } if *id == run_id)
            })
            .await
        {
            ValidatorEvent::Progress { progress, .. } => progress,
            other => unreachable!("matched non-progress event {other:?}"),
        }
    }

    /// Read until the run-complete event, returning its run and progress
    pub async fn until_run_complete(&mut self) -> (RunId, RunProgress) {
        match self
            .next_matching(|event| matches!(event, ValidatorEvent::RunComplete { .. }))
            .await
        {
            ValidatorEvent::RunComplete { run_id, progress } => (run_id, progress),
            other => unreachable!("matched non-completion event {other:?}"),
        }
    }

    /// Pull every event already delivered without waiting
    pub fn drain_ready(&mut self) -> Vec<ValidatorEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            self.seen.push(event.clone());
            drained.push(event);
        }
        drained
    }

    /// Let spawned tasks run, then drain
    pub async fn settle(&mut self) -> Vec<ValidatorEvent> {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        self.drain_ready()
    }

    /// Every event read so far
    pub fn seen(&self) -> &[ValidatorEvent] {
        &self.seen
    }

    /// Toasts read so far
    pub fn toasts(&self) -> Vec<&Toast> {
        self.seen
            .iter()
            .filter_map(|event| match event {
                ValidatorEvent::Toast(toast) => Some(toast),
                _ => None,
            })
            .collect()
    }

    /// Error toasts read so far
    pub fn error_toasts(&self) -> Vec<&Toast> {
        self.toasts()
            .into_iter()
            .filter(|toast| toast.level == ToastLevel::Error)
            .collect()
    }

    /// Number of run-complete events read so far for `run_id`
    pub fn completions(&self, run_id: RunId) -> usize {
        self.seen
            .iter()
            .filter(|event| matches!(event, ValidatorEvent::RunComplete { run_id: id, .. } if *id == run_id))
            .count()
    }

    /// Number of run-complete events read so far
    pub fn total_completions(&self) -> usize {
        self.seen
            .iter()
            .filter(|event| matches!(event, ValidatorEvent::RunComplete { .. }))
            .count()
    }

    /// Progress values read so far for `run_id`, in order
    pub fn progress_trail(&self, run_id: RunId) -> Vec<(usize, usize)> {
        self.seen
            .iter()
            .filter_map(|event| match event {
                ValidatorEvent::Progress { run_id: id, progress } if *id == run_id => {
                    Some((progress.completed, progress.total))
                }
                _ => None,
            })
            .collect()
    }
}

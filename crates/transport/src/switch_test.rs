//! Switch transport tests

use std::sync::Arc;

use crate::error::TransportError;
use crate::test_support::{test_event, RecordingTransport};
use crate::transport::Transport;
use crate::TransportSwitch;

fn switch_of(children: Vec<Arc<RecordingTransport>>) -> TransportSwitch {
    TransportSwitch::new(
        children
            .into_iter()
            .map(|child| child as Arc<dyn Transport>)
            .collect(),
    )
}

#[tokio::test]
async fn test_switch_delegates_to_first_usable_child() {
    let unusable = Arc::new(RecordingTransport::unusable());
    let usable = Arc::new(RecordingTransport::new());
    let switch = switch_of(vec![unusable.clone(), usable.clone()]);

    switch.handle(vec![test_event("PressEvent")]).await.unwrap();

    assert_eq!(unusable.batch_count(), 0);
    assert_eq!(usable.batch_count(), 1);
}

#[tokio::test]
async fn test_switch_usable_iff_any_child_usable() {
    let a = Arc::new(RecordingTransport::unusable());
    let b = Arc::new(RecordingTransport::new());

    let switch = switch_of(vec![a.clone(), b.clone()]);
    assert!(switch.is_usable());

    b.set_usable(false);
    assert!(!switch.is_usable());
}

#[tokio::test]
async fn test_switch_reevaluates_usability_per_call() {
    let primary = Arc::new(RecordingTransport::new());
    let fallback = Arc::new(RecordingTransport::new());
    let switch = switch_of(vec![primary.clone(), fallback.clone()]);

    switch.handle(vec![test_event("first")]).await.unwrap();
    assert_eq!(primary.batch_count(), 1);

    // Primary loses its capability at runtime; traffic must reroute
    primary.set_usable(false);
    switch.handle(vec![test_event("second")]).await.unwrap();

    assert_eq!(primary.batch_count(), 1);
    assert_eq!(fallback.batch_count(), 1);
}

#[tokio::test]
async fn test_switch_with_no_usable_child_errors() {
    let a = Arc::new(RecordingTransport::unusable());
    let switch = switch_of(vec![a]);

    let error = switch.handle(vec![test_event("lost")]).await.unwrap_err();
    assert!(matches!(error, TransportError::NoUsableTransport));
}

#[tokio::test]
async fn test_switch_empty_batch_is_noop_success() {
    let switch = TransportSwitch::new(vec![]);
    switch.handle(vec![]).await.unwrap();
}

//! End-to-end tracking tests
//!
//! Exercises the full chain: tracker composition, plugin enrichment, and
//! delivery through composed transports, including the queued path with a
//! durable store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use spoor_schema::{Context, ContextsConfig, EventTemplate, TrackerEvent};
use spoor_tracker::{PluginError, Tracker, TrackerPlugin};
use spoor_transport::{
    FileQueueStore, QueueConfig, QueueEngine, QueuedTransport, Result as TransportResult,
    Transport, TransportSwitch, WaitOptions,
};

/// Records batches; usability is fixed at construction
struct EndpointStub {
    usable: AtomicBool,
    batches: Mutex<Vec<Vec<TrackerEvent>>>,
}

impl EndpointStub {
    fn usable() -> Arc<Self> {
        Arc::new(Self {
            usable: AtomicBool::new(true),
            batches: Mutex::new(Vec::new()),
        })
    }

    fn unusable() -> Arc<Self> {
        Arc::new(Self {
            usable: AtomicBool::new(false),
            batches: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for EndpointStub {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> TransportResult<()> {
        self.batches.lock().push(events);
        Ok(())
    }
}

/// Appends a Device global context during enrichment
struct DevicePlugin;

impl TrackerPlugin for DevicePlugin {
    fn name(&self) -> &str {
        "device"
    }

    fn enrich(&self, event: &mut TrackerEvent) -> Result<(), PluginError> {
        event.global_contexts.push(Context::new("Device", "device"));
        Ok(())
    }
}

#[tokio::test]
async fn test_composed_enriched_event_reaches_first_usable_transport() {
    let dead = EndpointStub::unusable();
    let live = EndpointStub::usable();
    let switch = Arc::new(TransportSwitch::new(vec![
        dead.clone() as Arc<dyn Transport>,
        live.clone() as Arc<dyn Transport>,
    ]));

    let tracker = Tracker::builder("app")
        .transport(switch)
        .without_default_plugins()
        .plugin(Arc::new(DevicePlugin))
        .contexts(ContextsConfig::new().with_location_stack(vec![Context::new("Section", "root")]))
        .build()
        .unwrap();

    let call = ContextsConfig::new().with_location_stack(vec![Context::new("Button", "ok")]);
    tracker
        .track(EventTemplate::new("PressEvent"), Some(&call))
        .await
        .unwrap();

    assert!(dead.batches.lock().is_empty());

    let batches = live.batches.lock();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);

    let event = &batches[0][0];
    assert_eq!(event.location_stack.render_path(), "Section:root / Button:ok");

    let globals: Vec<(&str, &str)> = event
        .global_contexts
        .iter()
        .map(|ctx| (ctx.context_type.as_str(), ctx.id.as_str()))
        .collect();
    assert_eq!(globals, vec![("Device", "device")]);
}

#[tokio::test]
async fn test_queued_delivery_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    // First life: events are tracked into the persistent queue, but the
    // engine never runs - simulating a page unloaded before delivery
    {
        let store = Arc::new(FileQueueStore::open(dir.path(), "app-main").unwrap());
        let engine = Arc::new(QueueEngine::new(EndpointStub::usable(), store));
        let tracker = Tracker::builder("app")
            .tracker_id("app-main")
            .transport(Arc::new(QueuedTransport::new(engine)))
            .without_default_plugins()
            .build()
            .unwrap();

        tracker.track(EventTemplate::new("E1"), None).await.unwrap();
        tracker.track(EventTemplate::new("E2"), None).await.unwrap();
    }

    // Second life: a fresh engine bound to the same store identity drains
    // the backlog in order
    let endpoint = EndpointStub::usable();
    let store = Arc::new(FileQueueStore::open(dir.path(), "app-main").unwrap());
    let engine = Arc::new(QueueEngine::with_config(
        endpoint.clone(),
        store,
        QueueConfig {
            batch_size: 10,
            batch_interval: Duration::from_millis(20),
            batch_delay: Duration::from_millis(20),
        },
    ));
    engine.run();

    let drained = engine
        .wait_for_idle(WaitOptions {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(500),
        })
        .await;
    assert!(drained);

    let names: Vec<String> = endpoint
        .batches
        .lock()
        .iter()
        .flatten()
        .map(|event| event.event_name.clone())
        .collect();
    assert_eq!(names, vec!["E1", "E2"]);
}

#[tokio::test]
async fn test_validation_finding_reaches_custom_reporter_without_blocking() {
    struct Strict;
    impl TrackerPlugin for Strict {
        fn name(&self) -> &str {
            "strict"
        }
        fn validate(&self, event: &TrackerEvent) -> Result<(), PluginError> {
            if event.location_stack.is_empty() {
                return Err(PluginError::new("event has no location"));
            }
            Ok(())
        }
    }

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let live = EndpointStub::usable();

    let tracker = Tracker::builder("app")
        .transport(live.clone())
        .without_default_plugins()
        .plugin(Arc::new(Strict))
        .error_reporter(Arc::new(move |error| sink.lock().push(error.to_string())))
        .build()
        .unwrap();

    tracker.track(EventTemplate::new("PressEvent"), None).await.unwrap();

    // The finding was surfaced, yet the event was still delivered
    assert_eq!(reported.lock().len(), 1);
    assert_eq!(live.batches.lock().len(), 1);
}

//! Diagnostics emitted through `tracing` during a run.

mod helpers;

use helpers::*;
use pdf_harvest::ProcessingOptions;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone)]
struct Captured {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}

/// Collects every event as it is emitted.
struct EventCollector {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S: Subscriber> Layer<S> for EventCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn collect() -> (Arc<Mutex<Vec<Captured>>>, tracing::subscriber::DefaultGuard) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCollector { events: events.clone() });
    (events, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_chunk_progress_logged_at_info_when_requested() {
    let (events, _guard) = collect();
    let pipeline = stub_builder(Arc::new(StubTextEngine::new(["a", "b", "c", "d"])))
        .build()
        .unwrap();

    let mut options = ProcessingOptions::default();
    options.performance.process_in_chunks = true;
    options.performance.chunk_size = 2;
    options.performance.show_progress = true;
    pipeline.extract(any_pdf(), &options).await.unwrap();

    let progress: Vec<Captured> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.message.starts_with("Processing PDF:"))
        .cloned()
        .collect();

    assert_eq!(progress.len(), 2);
    assert!(progress.iter().all(|e| e.level == Level::INFO));
    assert_eq!(progress[0].message, "Processing PDF: 50.0% complete (2/4 pages)");
    assert_eq!(progress[1].message, "Processing PDF: 100.0% complete (4/4 pages)");
}

#[tokio::test]
async fn test_chunk_progress_logged_at_debug_by_default() {
    let (events, _guard) = collect();
    let pipeline = stub_builder(Arc::new(StubTextEngine::new(["a", "b"]))).build().unwrap();

    let mut options = ProcessingOptions::default();
    options.performance.process_in_chunks = true;
    options.performance.chunk_size = 1;
    pipeline.extract(any_pdf(), &options).await.unwrap();

    let events = events.lock().unwrap();
    let progress: Vec<&Captured> = events
        .iter()
        .filter(|e| e.message.starts_with("Processing PDF:"))
        .collect();
    assert_eq!(progress.len(), 2);
    assert!(progress.iter().all(|e| e.level == Level::DEBUG));
}

#[tokio::test]
async fn test_downgraded_failure_is_warned_with_stage() {
    let (events, _guard) = collect();
    let pipeline = stub_builder(Arc::new(StubTextEngine::blank(1)))
        .with_ocr_backend(Arc::new(FailingOcrBackend::default()))
        .build()
        .unwrap();

    let mut options = ProcessingOptions::default();
    options.features.perform_ocr = true;
    options.performance.continue_on_error = true;
    pipeline.extract(any_pdf(), &options).await.unwrap();

    let events = events.lock().unwrap();
    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN && e.message == "Stage failed, continuing")
        .expect("downgrade should be logged");
    assert!(warning.fields.iter().any(|(k, v)| k == "stage" && v == "OCR"));
}

//! End-to-end pipeline tests: request lifecycle, definition-time wrapping,
//! worker-pool propagation, and on-disk record integrity under concurrency.

use std::path::Path;
use std::sync::OnceLock;

use serde_json::json;

use reqtrace::{context, infrastructure, Args, Phase, Span, TraceConfig, WorkerPool};

/// One temporary trace directory for the whole test binary; tests isolate
/// from each other through unique request ids.
fn trace_dir() -> &'static Path {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::tempdir().expect("failed to create trace dir");
        reqtrace::configure(TraceConfig {
            trace_dir: dir.path().to_path_buf(),
            category: "pipeline-test".to_string(),
            log_level: None,
        });
        dir
    })
    .path()
}

fn file_for(request_id: &str) -> std::path::PathBuf {
    infrastructure::trace_path(trace_dir(), request_id)
}

fn args(pairs: &[(&str, serde_json::Value)]) -> Args {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

struct Inventory {
    items: Vec<String>,
}

reqtrace::traced_impl! {
    impl Inventory {
        pub fn stock(capacity: usize) -> Self {
            Self {
                items: Vec::with_capacity(capacity),
            }
        }

        pub fn add(&mut self, item: String) -> usize {
            self.items.push(item);
            self.items.len()
        }

        pub fn count(&self) -> usize {
            self.items.len()
        }
    }
}

reqtrace::traced_fn! {
    fn summarize(inventory: &Inventory) -> String {
        format!("{} items", inventory.count())
    }
}

#[test]
fn full_request_lifecycle_produces_a_readable_trace() {
    trace_dir();
    let request_id = "pipeline-lifecycle";
    context::set_current(request_id);
    reqtrace::trace_current_request(Some(args(&[("name", json!("checkout"))]))).unwrap();

    let mut inventory = Inventory::stock(4);
    inventory.add("widget".to_string());
    inventory.add("gadget".to_string());
    let summary = summarize(&inventory);
    context::clear_current();

    assert_eq!(summary, "2 items");

    let events = reqtrace::read_trace_file(&file_for(request_id)).unwrap();

    // Metadata first, then a Begin/End pair per instrumented call.
    assert_eq!(events[0].ph, Phase::Metadata);
    assert_eq!(events[0].name.as_deref(), Some("thread_name"));
    assert_eq!(events[0].args.as_ref().unwrap()["name"], json!("checkout"));

    let begins: Vec<_> = events
        .iter()
        .filter(|e| e.ph == Phase::Begin)
        .filter_map(|e| e.name.as_deref())
        .collect();
    // `summarize` wraps `Inventory.count`, so nesting shows up in emission order.
    assert_eq!(
        begins,
        vec![
            "Inventory.stock",
            "Inventory.add",
            "Inventory.add",
            "summarize",
            "Inventory.count"
        ]
    );

    let ends = events.iter().filter(|e| e.ph == Phase::End).count();
    assert_eq!(ends, begins.len());

    let expected_pid = format!("{request_id}:{}", std::process::id());
    assert!(events.iter().all(|e| e.pid == expected_pid));
    assert!(events.iter().all(|e| e.cat.starts_with("pipeline-test")));
}

#[test]
fn per_thread_nesting_is_reconstructible_from_tids() {
    trace_dir();
    let request_id = "pipeline-nesting";
    context::set_current(request_id);
    reqtrace::trace_current_request(None).unwrap();

    let outer = Span::new("outer").enter().unwrap();
    let inner = Span::new("inner").enter().unwrap();
    inner.end().unwrap();
    outer.end().unwrap();
    context::clear_current();

    let events = reqtrace::read_trace_file(&file_for(request_id)).unwrap();
    let spans: Vec<_> = events.iter().filter(|e| e.ph != Phase::Metadata).collect();

    // One thread emitted everything, and the pairs nest: B(outer) B(inner)
    // E(inner) E(outer).
    assert!(spans.windows(2).all(|w| w[0].tid == w[1].tid));
    let sequence: Vec<_> = spans
        .iter()
        .map(|e| (e.ph, e.name.as_deref().unwrap()))
        .collect();
    assert_eq!(
        sequence,
        vec![
            (Phase::Begin, "outer"),
            (Phase::Begin, "inner"),
            (Phase::End, "inner"),
            (Phase::End, "outer"),
        ]
    );
}

#[test]
fn pool_hand_off_attributes_and_then_reverts() {
    trace_dir();
    let request_id = "pipeline-handoff";
    context::set_current(request_id);
    reqtrace::trace_current_request(None).unwrap();

    let pool = WorkerPool::new(1).unwrap();
    pool.execute("Inventory.recount", || {
        // Runs on the borrowed thread; the ambient id travelled with the job.
        reqtrace::emit(Phase::Metadata, Some("borrowed"), None, &["pool"]).unwrap();
    })
    .unwrap();
    context::clear_current();

    // Dispatch again with no active request: nothing may be recorded.
    pool.execute("Inventory.idle", || {
        assert_eq!(context::current(), None);
    })
    .unwrap();
    drop(pool); // joins both jobs

    let events = reqtrace::read_trace_file(&file_for(request_id)).unwrap();
    let expected_pid = format!("{request_id}:{}", std::process::id());
    assert!(events.iter().all(|e| e.pid == expected_pid));

    let names: Vec<_> = events.iter().filter_map(|e| e.name.as_deref()).collect();
    assert!(names.contains(&"worker: Inventory.recount"));
    assert!(names.contains(&"borrowed"));
    assert!(!names.contains(&"worker: Inventory.idle"));

    // The dispatching thread and the borrowed thread are distinct lanes.
    let handoff_begin = events
        .iter()
        .find(|e| e.name.as_deref() == Some("worker: Inventory.recount"))
        .unwrap();
    assert_ne!(handoff_begin.tid, events[0].tid);
}

#[test]
fn concurrent_emitters_never_corrupt_records() {
    trace_dir();
    let request_id = "pipeline-concurrent";
    reqtrace::begin_request_trace(request_id, None).unwrap();

    const EVENTS_PER_THREAD: usize = 200;
    let threads: Vec<_> = (0..2)
        .map(|worker| {
            std::thread::spawn(move || {
                context::set_current(request_id);
                for i in 0..EVENTS_PER_THREAD {
                    let mut span = Span::with_args(
                        format!("burst-{worker}-{i}"),
                        Some(args(&[("i", json!(i))])),
                        None,
                    );
                    span.begin(None).unwrap();
                    span.end(None).unwrap();
                }
                context::clear_current();
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    // Every comma-separated chunk must parse on its own: no interleaved or
    // torn records.
    let contents = std::fs::read_to_string(file_for(request_id)).unwrap();
    let body = contents.strip_prefix("[\n").unwrap();
    let chunks: Vec<_> = body
        .split(",\n")
        .filter(|chunk| !chunk.trim().is_empty())
        .collect();
    assert_eq!(chunks.len(), 1 + 2 * 2 * EVENTS_PER_THREAD);
    for chunk in &chunks {
        let value: serde_json::Value = serde_json::from_str(chunk)
            .unwrap_or_else(|e| panic!("corrupt record {chunk:?}: {e}"));
        assert!(value.is_object());
    }

    // And the fixed-up read agrees.
    let events = reqtrace::read_trace_file(&file_for(request_id)).unwrap();
    assert_eq!(events.len(), chunks.len());
}

#[test]
fn listing_exposes_enabled_requests() {
    trace_dir();
    reqtrace::begin_request_trace("pipeline-list-a", None).unwrap();
    reqtrace::begin_request_trace("pipeline-list-b", None).unwrap();

    let files = infrastructure::list_trace_files(trace_dir()).unwrap();
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert!(names.contains(&"pipeline-list-a.trace"));
    assert!(names.contains(&"pipeline-list-b.trace"));
}

#[test]
fn double_end_across_api_layers_stays_single() {
    trace_dir();
    let request_id = "pipeline-double-end";
    reqtrace::begin_request_trace(request_id, None).unwrap();
    context::set_current(request_id);

    let mut span = Span::new("once-only");
    span.begin(None).unwrap();
    span.end(Some(&args(&[("first", json!(true))]))).unwrap();
    span.end(Some(&args(&[("second", json!(true))]))).unwrap();
    context::clear_current();

    let events = reqtrace::read_trace_file(&file_for(request_id)).unwrap();
    let ends: Vec<_> = events.iter().filter(|e| e.ph == Phase::End).collect();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].args.as_ref().unwrap()["first"], json!(true));
}

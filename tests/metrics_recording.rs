//! Metric emission checked against an in-memory recorder.
//!
//! The recorder is process-global, so this file holds only tests that do not
//! open RPC connections besides the ones they count.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use metrics::{
    Counter, CounterFn, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
    Unit,
};
use tower::ServiceExt;

use rpc_gateway::config::{HttpConfig, UpstreamConfig};
use rpc_gateway::net::ConnectionTracker;
use rpc_gateway::{HttpServer, RpcClient};

#[derive(Default)]
struct Cell(Mutex<f64>);

impl CounterFn for Cell {
    fn increment(&self, value: u64) {
        *self.0.lock().unwrap() += value as f64;
    }

    fn absolute(&self, value: u64) {
        *self.0.lock().unwrap() = value as f64;
    }
}

impl GaugeFn for Cell {
    fn increment(&self, value: f64) {
        *self.0.lock().unwrap() += value;
    }

    fn decrement(&self, value: f64) {
        *self.0.lock().unwrap() -= value;
    }

    fn set(&self, value: f64) {
        *self.0.lock().unwrap() = value;
    }
}

#[derive(Default)]
struct Captured {
    cells: Mutex<HashMap<String, Arc<Cell>>>,
}

impl Captured {
    fn cell(&self, key: &Key) -> Arc<Cell> {
        let mut name = key.name().to_string();
        for label in key.labels() {
            name.push_str(&format!(",{}={}", label.key(), label.value()));
        }
        self.cells.lock().unwrap().entry(name).or_default().clone()
    }

    fn value(&self, name: &str) -> f64 {
        self.cells
            .lock()
            .unwrap()
            .get(name)
            .map(|cell| *cell.0.lock().unwrap())
            .unwrap_or(0.0)
    }
}

struct CaptureRecorder(Arc<Captured>);

impl Recorder for CaptureRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.0.cell(key))
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.0.cell(key))
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

fn captured() -> Arc<Captured> {
    static CAPTURED: OnceLock<Arc<Captured>> = OnceLock::new();
    CAPTURED
        .get_or_init(|| {
            let captured = Arc::new(Captured::default());
            metrics::set_global_recorder(CaptureRecorder(captured.clone()))
                .unwrap_or_else(|_| panic!("recorder already installed"));
            captured
        })
        .clone()
}

#[test]
fn active_connection_gauge_settles_under_concurrency() {
    let captured = captured();
    let tracker = ConnectionTracker::new();
    let peer = "127.0.0.1:7000".parse().unwrap();

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let tracker = tracker.clone();
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    let guard = tracker.track(peer);
                    drop(guard);
                }
            })
        })
        .collect();

    let held = tracker.track(peer);
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(tracker.active_count(), 1);
    assert_eq!(captured.value("rpc_active_connections"), 1.0);

    drop(held);
    assert_eq!(captured.value("rpc_active_connections"), 0.0);
}

#[tokio::test]
async fn requests_outside_the_handler_are_counted() {
    let captured = captured();
    let client = RpcClient::new(&UpstreamConfig {
        address: "127.0.0.1:9".into(),
        ..UpstreamConfig::default()
    });
    let app = HttpServer::new(HttpConfig::default(), client).router();

    let before_405 = captured.value("gateway_requests_total,status=405");
    let before_200 = captured.value("gateway_requests_total,status=200");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/rpc/multiply")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/rpc/multiply")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(captured.value("gateway_requests_total,status=405") >= before_405 + 1.0);
    assert!(captured.value("gateway_requests_total,status=200") >= before_200 + 1.0);
}

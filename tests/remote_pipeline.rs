//! Remote client tests against an in-process HTTP pipeline server.
//!
//! The server answers `execute` and `close` requests the way a hosted libSQL
//! database does, hands out a fresh baton per response and records every
//! request so the tests can check the stream sequence.

use libsql_bench::config::{BenchConfig, Target};
use libsql_bench::orchestrator;
use serde_json::{json, Value as Json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

const TOKEN: &str = "secret-token";
const MOCK_UID: &str = "6f1c2a9e-3b4d-4c8e-9a1f-2d3e4f5a6b7c";
const MOCK_EMAIL: &str = "mock@example.com";

/// One request as seen by the server, plus the baton it answered with.
#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    auth: Option<String>,
    body: Json,
    issued_baton: Option<String>,
}

impl Recorded {
    fn request_types(&self) -> Vec<String> {
        self.body["requests"]
            .as_array()
            .map(|reqs| {
                reqs.iter()
                    .filter_map(|r| r["type"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_close(&self) -> bool {
        self.request_types().iter().any(|t| t == "close")
    }

    fn sent_baton(&self) -> Option<&str> {
        self.body["baton"].as_str()
    }
}

struct PipelineServer {
    addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl PipelineServer {
    /// Start serving on an ephemeral port. With `redirect`, every response to
    /// a stream-opening request carries a `base_url` under `/redirected`.
    fn start(redirect: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let log = Arc::new(Mutex::new(Vec::new()));
        let batons = Arc::new(AtomicUsize::new(0));

        let server_log = Arc::clone(&log);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let log = Arc::clone(&server_log);
                let batons = Arc::clone(&batons);
                thread::spawn(move || serve_connection(stream, addr, redirect, &log, &batons));
            }
        });

        Self { addr, log }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }
}

fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    redirect: bool,
    log: &Mutex<Vec<Recorded>>,
    batons: &AtomicUsize,
) {
    let mut writer = stream.try_clone().expect("clone stream");
    let mut reader = BufReader::new(stream);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let path = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_string();

        let mut content_length = 0usize;
        let mut auth = None;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                let value = value.trim();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                } else if name.eq_ignore_ascii_case("authorization") {
                    auth = Some(value.to_string());
                }
            }
        }

        let mut raw = vec![0u8; content_length];
        if reader.read_exact(&mut raw).is_err() {
            return;
        }
        let body: Json = serde_json::from_slice(&raw).unwrap_or(Json::Null);

        let mut closed = false;
        let results: Vec<Json> = body["requests"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|req| match req["type"].as_str() {
                Some("execute") => json!({
                    "type": "ok",
                    "response": {
                        "type": "execute",
                        "result": execute_result(req["stmt"]["sql"].as_str().unwrap_or_default())
                    }
                }),
                Some("close") => {
                    closed = true;
                    json!({"type": "ok", "response": {"type": "close"}})
                }
                _ => json!({"type": "error", "error": {"message": "unknown request"}}),
            })
            .collect();

        let issued_baton = if closed {
            None
        } else {
            Some(format!("b{}", batons.fetch_add(1, Ordering::SeqCst) + 1))
        };
        let base_url = if redirect && body["baton"].is_null() {
            Some(format!("http://{addr}/redirected"))
        } else {
            None
        };

        log.lock().unwrap().push(Recorded {
            path,
            auth,
            body,
            issued_baton: issued_baton.clone(),
        });

        let payload = json!({
            "baton": issued_baton,
            "base_url": base_url,
            "results": results,
        })
        .to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            payload.len(),
            payload
        );
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
    }
}

fn execute_result(sql: &str) -> Json {
    if sql.starts_with("SELECT * FROM example_users") {
        json!({
            "cols": [{"name": "uid", "decltype": "TEXT"}, {"name": "email", "decltype": "TEXT"}],
            "rows": [[{"type": "text", "value": MOCK_UID}, {"type": "text", "value": MOCK_EMAIL}]],
            "affected_row_count": 0,
            "last_insert_rowid": null
        })
    } else {
        json!({
            "cols": [],
            "rows": [],
            "affected_row_count": 1,
            "last_insert_rowid": null
        })
    }
}

fn remote_config(url: String, insert_rows: usize) -> BenchConfig {
    BenchConfig {
        target: Target::Remote {
            url,
            auth_token: TOKEN.to_string(),
        },
        workers: 1,
        insert_rows,
        select_rows: 1,
        seed: None,
        show_history: false,
    }
}

// ── Stream sequence ─────────────────────────────────────────────────

#[test]
fn batons_chain_within_a_stream_and_close_ends_it() {
    let server = PipelineServer::start(false);
    let summary = orchestrator::run(&remote_config(server.url(), 3)).expect("run");

    let output = &summary.outputs[0];
    assert_eq!(output.insert.num_rows, 3);
    assert_eq!(output.select.num_rows, 1);
    assert_eq!(output.insert.driver, "turso");
    assert_eq!(output.selected[0].uid, MOCK_UID);
    assert_eq!(output.selected[0].email, MOCK_EMAIL);

    let requests = server.requests();
    // Schema: 2 executes + close. Worker: 3 inserts + run + select + run + close.
    assert_eq!(requests.len(), 10);
    assert!(requests.last().unwrap().is_close());

    let mut expected: Option<String> = None;
    let mut closes = 0;
    for (i, rec) in requests.iter().enumerate() {
        assert_eq!(rec.path, "/v2/pipeline", "request {i}");
        assert_eq!(rec.auth.as_deref(), Some("Bearer secret-token"), "request {i}");
        assert_eq!(rec.sent_baton(), expected.as_deref(), "request {i}");

        if rec.is_close() {
            assert_eq!(rec.request_types(), vec!["close"]);
            assert!(rec.issued_baton.is_none());
            closes += 1;
            expected = None;
        } else {
            assert_eq!(rec.request_types(), vec!["execute"]);
            expected = rec.issued_baton.clone();
        }
    }
    assert_eq!(closes, 2);

    // Every stream opens with a null baton.
    assert_eq!(requests[0].sent_baton(), None);
    assert_eq!(requests[3].sent_baton(), None);
}

#[test]
fn base_url_from_server_redirects_later_requests() {
    let server = PipelineServer::start(true);
    orchestrator::run(&remote_config(server.url(), 2)).expect("run");

    let requests = server.requests();
    let mut redirected = 0;
    for (i, rec) in requests.iter().enumerate() {
        if rec.sent_baton().is_none() {
            assert_eq!(rec.path, "/v2/pipeline", "request {i}");
        } else {
            assert_eq!(rec.path, "/redirected/v2/pipeline", "request {i}");
            redirected += 1;
        }
    }
    // Everything after each stream's first request, closes included.
    assert_eq!(redirected, requests.len() - 2);
    assert_eq!(requests.iter().filter(|r| r.is_close()).count(), 2);
}

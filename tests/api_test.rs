//! Tests end-to-end de la API
//! tests/api_test.rs
//!
//! Cada test levanta su propio servidor en `127.0.0.1:0` con un dataset
//! pequeño y habla con él por TCP real.

use serde_json::{json, Value};
use stats_server::config::Config;
use stats_server::dataset::Table;
use stats_server::jobs::{JobManager, JobManagerConfig};
use stats_server::server::Server;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const OVERWEIGHT: &str =
    "Percent of adults aged 18 years and older who have an overweight classification";

const DATASET: &str = "\
YearStart,LocationDesc,Question,Data_Value,StratificationCategory1,Stratification1
2011,State1,Q1,10,Category1,SubCategory1
2011,State1,Q1,245,Category1,SubCategory1
2012,State2,Q1,15,Category1,SubCategory2
2012,State2,Q1,22,Category1,SubCategory2
2013,State1,Q2,12,Category2,SubCategory3
2013,State2,Q2,8,Category2,SubCategory3
2014,State1,Percent of adults aged 18 years and older who have an overweight classification,30,Total,Total
2014,State2,Percent of adults aged 18 years and older who have an overweight classification,20,Total,Total
";

fn start_server() -> SocketAddr {
    let config = Config {
        port: 0,
        threads: Some(2),
        ..Config::default()
    };

    let table = Arc::new(Table::from_reader(DATASET.as_bytes()).unwrap());
    let jobs = JobManager::new(JobManagerConfig::from_config(&config), table).unwrap();
    let server = Server::bind(&config, jobs).unwrap();
    let addr = server.local_addr().unwrap();

    thread::spawn(move || server.run());
    addr
}

/// Envía un request crudo y retorna (status, headers+body)
fn send(addr: SocketAddr, raw: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    (status, response)
}

fn body_of(response: &str) -> Value {
    let pos = response.find("\r\n\r\n").unwrap();
    serde_json::from_str(&response[pos + 4..]).unwrap_or(Value::Null)
}

fn get(addr: SocketAddr, path: &str) -> (u16, Value) {
    let (status, response) = send(addr, &format!("GET {} HTTP/1.0\r\n\r\n", path));
    (status, body_of(&response))
}

fn post(addr: SocketAddr, path: &str, body: &Value) -> (u16, Value) {
    let body = body.to_string();
    let raw = format!(
        "POST {} HTTP/1.0\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    );
    let (status, response) = send(addr, &raw);
    (status, body_of(&response))
}

fn submit(addr: SocketAddr, path: &str, body: Value) -> u64 {
    let (status, response) = post(addr, path, &body);
    assert_eq!(status, 200, "submission failed: {}", response);
    response["job_id"].as_u64().unwrap()
}

/// Hace polling hasta que el job deja de estar `running`
fn wait_result(addr: SocketAddr, job_id: u64) -> (u16, Value) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let (status, body) = get(addr, &format!("/api/get_results/{}", job_id));
        if body != json!({"status": "running"}) || Instant::now() > deadline {
            return (status, body);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_states_mean_end_to_end() {
    let addr = start_server();
    let id = submit(addr, "/api/states_mean", json!({"question": "Q1"}));

    let (status, body) = wait_result(addr, id);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "done");
    assert_eq!(body["data"], json!({"State1": 127.5, "State2": 18.5}));

    let order: Vec<&String> = body["data"].as_object().unwrap().keys().collect();
    assert_eq!(order, vec!["State2", "State1"]);
}

#[test]
fn test_every_aggregation_completes() {
    let addr = start_server();
    let cases = [
        ("/api/state_mean", json!({"question": "Q1", "state": "State1"}), json!({"State1": 127.5})),
        ("/api/global_mean", json!({"question": "Q1"}), json!({"global_mean": 73.0})),
        ("/api/diff_from_mean", json!({"question": "Q1"}), json!({"State1": -54.5, "State2": 54.5})),
        ("/api/state_diff_from_mean", json!({"question": "Q1", "state": "State2"}), json!({"State2": 54.5})),
        ("/api/best5", json!({"question": "Q2"}), json!({"State2": 8.0, "State1": 12.0})),
        ("/api/worst5", json!({"question": OVERWEIGHT}), json!({"State2": 20.0, "State1": 30.0})),
        (
            "/api/mean_by_category",
            json!({"question": "Q1"}),
            json!({
                "(State1, Category1, SubCategory1)": 127.5,
                "(State2, Category1, SubCategory2)": 18.5,
            }),
        ),
        (
            "/api/state_mean_by_category",
            json!({"question": "Q2", "state": "State1"}),
            json!({"State1": {"(Category2, SubCategory3)": 12.0}}),
        ),
    ];

    for (path, payload, expected) in cases {
        let id = submit(addr, path, payload);
        let (status, body) = wait_result(addr, id);

        assert_eq!(status, 200, "{} failed: {}", path, body);
        assert_eq!(body["data"], expected, "{}", path);
    }
}

#[test]
fn test_invalid_input_is_an_error_job() {
    let addr = start_server();
    let payloads = [
        ("/api/states_mean", json!({})),
        ("/api/best5", json!({"question": "Unknown question"})),
        ("/api/state_mean", json!({"question": "Q1"})),
        ("/api/state_mean", json!({"question": "Q1", "state": "Atlantis"})),
    ];

    for (path, payload) in payloads {
        let id = submit(addr, path, payload);
        let (status, body) = wait_result(addr, id);

        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({"status": "error", "data": {"error_message": "Invalid input"}})
        );
    }
}

#[test]
fn test_ids_are_dense_and_invalid_ids_fail() {
    let addr = start_server();

    assert_eq!(submit(addr, "/api/global_mean", json!({"question": "Q1"})), 1);
    assert_eq!(submit(addr, "/api/global_mean", json!({"question": "nope"})), 2);
    assert_eq!(submit(addr, "/api/global_mean", json!({"question": "Q2"})), 3);

    for bad in ["0", "4", "100", "abc"] {
        let (status, body) = get(addr, &format!("/api/get_results/{}", bad));
        assert_eq!(status, 500);
        assert_eq!(body, json!({"status": "error", "reason": "Invalid job_id"}));
    }
}

#[test]
fn test_polling_is_idempotent() {
    let addr = start_server();
    let id = submit(addr, "/api/diff_from_mean", json!({"question": "Q1"}));

    let first = wait_result(addr, id);
    let (_, response_a) = send(addr, &format!("GET /api/get_results/{} HTTP/1.0\r\n\r\n", id));
    let (_, response_b) = send(addr, &format!("GET /api/get_results/{} HTTP/1.0\r\n\r\n", id));

    assert_eq!(body_of(&response_a), first.1);
    assert_eq!(body_of(&response_a), body_of(&response_b));
}

#[test]
fn test_method_not_allowed() {
    let addr = start_server();

    let (status, body) = get(addr, "/api/states_mean");
    assert_eq!(status, 405);
    assert_eq!(body, json!({"error": "Method not allowed"}));

    let (status, _) = post(addr, "/api/jobs", &json!({}));
    assert_eq!(status, 405);

    for method in ["PATCH", "OPTIONS"] {
        let (status, response) = send(addr, &format!("{} /api/best5 HTTP/1.0\r\n\r\n", method));
        assert_eq!(status, 405, "{}", method);
        assert_eq!(body_of(&response), json!({"error": "Method not allowed"}));
    }
}

#[test]
fn test_jobs_listing() {
    let addr = start_server();
    let ok = submit(addr, "/api/global_mean", json!({"question": "Q1"}));
    submit(addr, "/api/global_mean", json!({"question": "missing"}));
    wait_result(addr, ok);

    let (status, body) = get(addr, "/api/jobs");
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({"status": "done", "data": [{"job_id_1": "done"}, {"job_id_2": "error"}]})
    );
}

#[test]
fn test_graceful_shutdown_flow() {
    let addr = start_server();
    let ids: Vec<u64> = (0..5)
        .map(|_| submit(addr, "/api/states_mean", json!({"question": "Q1"})))
        .collect();

    let (status, body) = get(addr, "/api/graceful_shutdown");
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "done"}));

    let (status, _) = post(addr, "/api/best5", &json!({"question": "Q1"}));
    assert_eq!(status, 503);

    // los jobs aceptados antes del shutdown terminan igual
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let (_, body) = get(addr, "/api/num_jobs");
        if body["data"] == 0 || Instant::now() > deadline {
            assert_eq!(body, json!({"status": "done", "data": 0}));
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    for id in ids {
        let (status, body) = get(addr, &format!("/api/get_results/{}", id));
        assert_eq!(status, 200);
        assert_eq!(body["status"], "done");
    }

    let (_, body) = get(addr, "/api/jobs");
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[test]
fn test_index_page_and_headers() {
    let addr = start_server();
    let (status, response) = send(addr, "GET / HTTP/1.0\r\n\r\n");

    assert_eq!(status, 200);
    assert!(response.contains("X-Request-Id: "));
    assert!(response.contains("Server: StatsServer/1.0"));
    assert!(response.contains(r#"Endpoint: "/api/get_results/{job_id}" Methods: "GET""#));
    assert!(response.contains(r#"Endpoint: "/api/states_mean" Methods: "POST""#));
}

#[test]
fn test_unknown_route() {
    let addr = start_server();
    let (status, _) = get(addr, "/api/does_not_exist");
    assert_eq!(status, 404);
}

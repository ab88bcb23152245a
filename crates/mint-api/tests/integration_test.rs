//! Integration tests for the mint API against a stand-in proof service

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use mint_api::{create_router, AppState, ProofServiceClient, RetryPolicy};
use remix_common::circuit::fr_to_decimal;
use remix_common::{
    decode_aigc_data, CircuitInput, Groth16Proof, MintCalldata, ProofInput, ProofRequest,
    ProofResponse, SolidityProof,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

const AUTHOR: &str = "0x1111111111111111111111111111111111111111";

#[derive(Clone, Copy)]
enum Behavior {
    Prove,
    Unverified,
    WrongHash,
    /// 503 for the first N calls, then a proof
    UnavailableFor(usize),
    Fail,
    /// Answers only after the given delay
    Slow(Duration),
    GatewayTimeout,
}

struct FakeProofService {
    behavior: Behavior,
    calls: AtomicUsize,
}

fn sample_proof() -> Groth16Proof {
    Groth16Proof {
        pi_a: vec!["11".into(), "12".into(), "1".into()],
        pi_b: vec![
            vec!["13".into(), "14".into()],
            vec!["15".into(), "16".into()],
            vec!["1".into(), "0".into()],
        ],
        pi_c: vec!["17".into(), "18".into(), "1".into()],
        protocol: "groth16".into(),
        curve: "bn128".into(),
    }
}

async fn fake_proof_handler(
    State(service): State<Arc<FakeProofService>>,
    Json(input): Json<ProofInput>,
) -> axum::response::Response {
    let call = service.calls.fetch_add(1, Ordering::SeqCst);

    if let Behavior::Slow(delay) = service.behavior {
        tokio::time::sleep(delay).await;
    }

    let request = match ProofRequest::from_wire(&input) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response()
        }
    };
    let hash = CircuitInput::build(&request).unwrap().public_hash().unwrap();

    let mut response = ProofResponse {
        public_hash: fr_to_decimal(&hash),
        proof: sample_proof().to_json_string().unwrap(),
        public_inputs: vec![fr_to_decimal(&hash)],
        verified: true,
    };

    match service.behavior {
        Behavior::Prove => {}
        Behavior::Unverified => response.verified = false,
        Behavior::WrongHash => response.public_inputs = vec!["42".into()],
        Behavior::UnavailableFor(n) if call < n => {
            return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
        }
        Behavior::UnavailableFor(_) | Behavior::Slow(_) => {}
        Behavior::GatewayTimeout => {
            return (StatusCode::GATEWAY_TIMEOUT, "upstream timed out").into_response()
        }
        Behavior::Fail => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Proving failed: out of memory" })),
            )
                .into_response()
        }
    }

    Json(response).into_response()
}

async fn spawn_proof_service(behavior: Behavior) -> (SocketAddr, Arc<FakeProofService>) {
    let service = Arc::new(FakeProofService {
        behavior,
        calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/proof", post(fake_proof_handler))
        .with_state(service.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, service)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn mint_app(addr: SocketAddr) -> Router {
    mint_app_with_timeout(addr, Duration::from_secs(5))
}

fn mint_app_with_timeout(addr: SocketAddr, timeout: Duration) -> Router {
    let proof_service =
        ProofServiceClient::new(format!("http://{}", addr), timeout, fast_retry()).unwrap();
    create_router(AppState { proof_service })
}

fn panda_body() -> Value {
    json!({
        "prompt": "pixel panda",
        "image": format!("0x{}01", "aa".repeat(31)),
        "author": AUTHOR,
        "requestId": "r-1",
    })
}

async fn post_generate(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/generate-proof")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn decode_hex(value: &Value) -> Vec<u8> {
    hex::decode(value.as_str().unwrap().trim_start_matches("0x")).unwrap()
}

#[tokio::test]
async fn test_generate_proof_returns_mint_arguments() {
    let (addr, service) = spawn_proof_service(Behavior::Prove).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    assert_eq!(decode_hex(&json["prompt"]), b"pixel panda");

    let aigc = decode_aigc_data(&decode_hex(&json["aigcData"])).unwrap();
    let mut image = vec![0xaa; 31];
    image.push(0x01);
    assert_eq!(aigc.image, image);
    assert_eq!(aigc.author.to_string().to_lowercase(), AUTHOR);

    let proof = SolidityProof::abi_decode(&decode_hex(&json["proof"])).unwrap();
    assert_eq!(proof, SolidityProof::from_groth16(&sample_proof()).unwrap());

    let image_hex = format!("0x{}01", "aa".repeat(31));
    let request = ProofRequest::from_plain("pixel panda", &image_hex, AUTHOR, "r-1").unwrap();
    let hash = CircuitInput::build(&request).unwrap().public_hash().unwrap();
    assert_eq!(json["publicSignals"], json!([fr_to_decimal(&hash)]));

    let call = MintCalldata::from_call_data(&decode_hex(&json["calldata"])).unwrap();
    assert_eq!(call, MintCalldata::new(&request, &sample_proof()).unwrap());

    assert_eq!(json["data"]["requestId"], "r-1");
    assert_eq!(json["data"]["prompt"], "pixel panda");
}

#[tokio::test]
async fn test_missing_fields() {
    let (addr, service) = spawn_proof_service(Behavior::Prove).await;

    let mut body = panda_body();
    body.as_object_mut().unwrap().remove("author");

    let (status, json) = post_generate(mint_app(addr), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required fields");
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_author_is_rejected_before_proving() {
    let (addr, service) = spawn_proof_service(Behavior::Prove).await;

    let mut body = panda_body();
    body["author"] = json!("0x1111");

    let (status, json) = post_generate(mint_app(addr), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("20 bytes"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unverified_proof_is_server_error() {
    let (addr, _) = spawn_proof_service(Behavior::Unverified).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Proof verification failed");
}

#[tokio::test]
async fn test_foreign_public_hash_is_rejected() {
    let (addr, _) = spawn_proof_service(Behavior::WrongHash).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().starts_with("Encoding mismatch"));
}

#[tokio::test]
async fn test_retries_while_unavailable() {
    let (addr, service) = spawn_proof_service(Behavior::UnavailableFor(2)).await;

    let (status, _) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let (addr, service) = spawn_proof_service(Behavior::UnavailableFor(usize::MAX)).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Upstream unavailable"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_proving_failure_is_not_retried() {
    let (addr, service) = spawn_proof_service(Behavior::Fail).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("out of memory"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_proving_is_not_resubmitted() {
    let (addr, service) = spawn_proof_service(Behavior::Slow(Duration::from_secs(3))).await;

    let app = mint_app_with_timeout(addr, Duration::from_millis(200));
    let (status, json) = post_generate(app, panda_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("timed out"), "{}", json);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gateway_timeout_is_not_retried() {
    let (addr, service) = spawn_proof_service(Behavior::GatewayTimeout).await;

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("504"), "{}", json);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_numeric_request_id() {
    let (addr, service) = spawn_proof_service(Behavior::Prove).await;

    let mut body = panda_body();
    body["requestId"] = json!(42);
    let (status, json) = post_generate(mint_app(addr), body).await;
    assert_eq!(status, StatusCode::OK, "{}", json);

    let aigc = decode_aigc_data(&decode_hex(&json["aigcData"])).unwrap();
    assert_eq!(aigc.request_id.to_string(), "42");

    for id in [json!(-5), json!(1.5), json!(1e20)] {
        let mut body = panda_body();
        body["requestId"] = id.clone();
        let (status, json) = post_generate(mint_app(addr), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", id);
        assert!(json["error"].as_str().unwrap().contains("requestId"));
    }

    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_proof_service() {
    // reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (status, json) = post_generate(mint_app(addr), panda_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Upstream unavailable"));
}

#[tokio::test]
async fn test_health_reports_proof_service() {
    let (addr, _) = spawn_proof_service(Behavior::Prove).await;

    let response = mint_app(addr)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["service"], "mint-api");
    // the stand-in has no /health route
    assert_eq!(json["proof_service"], "down");
}

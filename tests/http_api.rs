use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use recruiter_automation::api::{api_router, ApiState};
use recruiter_automation::workflows::leads::{
    ContactStore, InMemoryContactStore, LeadRecord, RecordUpsert,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn build_router(store: InMemoryContactStore) -> axum::Router {
    api_router(ApiState::new(store, 500, "qualified"))
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json")
}

const SAMPLE_CSV: &str = "\
Bedrijfsnaam,Functietitel,Standplaats: Provincie,Bedrijf: Branche,Contactpersoon: E-mail
Machinefabriek Jansen,Corporate Recruiter,Gelderland,Machinebouw,j.jansen@jansen.nl
Flexkracht Uitzendbureau,Recruiter,Utrecht,Uitzendbureau,info@flexkracht.nl
";

#[tokio::test]
async fn pipeline_run_returns_the_phase_summary() {
    let store = InMemoryContactStore::new();
    let router = build_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/pipeline/run",
            &json!({ "csv": SAMPLE_CSV }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    let summary = payload.get("summary").expect("summary present");
    assert_eq!(summary["initial"], 2);
    assert_eq!(summary["survivors"], 1);
    assert_eq!(summary["filter"]["removed_intermediary"], 1);
    assert_eq!(summary["exported"], 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn pipeline_run_rejects_unknown_phase_numbers() {
    let router = build_router(InMemoryContactStore::new());

    let response = router
        .oneshot(post_json(
            "/api/v1/pipeline/run",
            &json!({ "csv": SAMPLE_CSV, "start_phase": 9 }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("start_phase"));
}

#[tokio::test]
async fn pipeline_run_rejects_exports_missing_required_columns() {
    let router = build_router(InMemoryContactStore::new());

    let response = router
        .oneshot(post_json(
            "/api/v1/pipeline/run",
            &json!({ "csv": "Functietitel\nRecruiter\n" }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("Bedrijfsnaam"));
}

#[tokio::test]
async fn nurture_process_advances_seeded_records() {
    let store = InMemoryContactStore::new();
    let mut lead = LeadRecord::new("Machinefabriek Jansen", "Corporate Recruiter");
    lead.contact.email = Some("j.jansen@jansen.nl".to_string());
    let id = store
        .create_or_update(RecordUpsert::from_lead(&lead, "qualified"))
        .expect("seed record");
    let trigger = NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date");
    store
        .set_trigger_date(&id, trigger)
        .expect("set trigger date");

    let router = build_router(store.clone());
    let response = router
        .oneshot(post_json(
            "/api/v1/nurture/process",
            &json!({ "today": "2026-08-05" }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["processed"], 1);
    assert_eq!(payload["sent"], 1);
    assert_eq!(
        store.get(&id).expect("record").sequence_position,
        1
    );
}

#[tokio::test]
async fn nurture_process_on_an_empty_store_reports_zero_work() {
    let router = build_router(InMemoryContactStore::new());

    let response = router
        .oneshot(post_json("/api/v1/nurture/process", &json!({})))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["processed"], 0);
    assert_eq!(payload["sent"], 0);
}

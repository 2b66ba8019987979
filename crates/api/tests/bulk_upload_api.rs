//! HTTP-level integration tests for the bulk upload session API.
//!
//! Covers the full session lifecycle (create, upload, poll, cancel,
//! retry), merchant scoping, history pagination, error export, and
//! template download.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_string, get, get_as, post_csv, post_empty, post_json};
use sqlx::PgPool;

const MERCHANT_A: i64 = 101;
const MERCHANT_B: i64 = 202;

const SESSIONS: &str = "/api/v1/bulk-upload/sessions";

/// Three clean rows under the minimum header set.
const VALID_CSV: &str = "product_handle,variant_sku,variant_stock_quantity\n\
    widget,W-1,10\n\
    widget,W-2,5\n\
    gadget,G-1,3\n";

/// Second row has a negative stock quantity.
const ONE_BAD_ROW_CSV: &str = "product_handle,variant_sku,variant_stock_quantity\n\
    widget,W-1,10\n\
    widget,W-2,-5\n\
    gadget,G-1,3\n";

async fn create_session(pool: &PgPool, merchant_id: i64, expected_rows: i32) -> String {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        SESSIONS,
        merchant_id,
        serde_json::json!({
            "filename": "products.csv",
            "file_size_bytes": 1024,
            "expected_rows": expected_rows,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Session creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_session_returns_201_in_created_status(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        SESSIONS,
        MERCHANT_A,
        serde_json::json!({
            "filename": "spring_catalog.csv",
            "file_size_bytes": 2048,
            "expected_rows": 100,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];

    assert!(data["id"].is_string());
    assert_eq!(data["status"], "created");
    assert_eq!(data["filename"], "spring_catalog.csv");
    assert_eq!(data["expected_rows"], 100);
    assert_eq!(data["processed_rows"], 0);
    assert_eq!(data["progress"]["percentage"], 0.0);
    assert_eq!(data["progress"]["phase"], "created");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_session_rejects_invalid_payload(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        SESSIONS,
        MERCHANT_A,
        serde_json::json!({
            "filename": "",
            "file_size_bytes": 1024,
            "expected_rows": 10,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        SESSIONS,
        MERCHANT_A,
        serde_json::json!({
            "filename": "ok.csv",
            "file_size_bytes": 1024,
            "expected_rows": 0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_merchant_header_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, SESSIONS).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Merchant scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn session_is_invisible_to_other_merchants(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 10).await;

    let app = common::build_test_app(pool.clone());
    let response = get_as(app, &format!("{SESSIONS}/{id}"), MERCHANT_B).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{SESSIONS}/{id}"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// File upload and processing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn valid_upload_completes_session(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 3).await;

    let app = common::build_test_app(pool.clone());
    let response = post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, VALID_CSV).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["status"], "completed");
    assert_eq!(data["actual_rows"], 3);
    assert_eq!(data["processed_rows"], 3);
    assert_eq!(data["successful_rows"], 3);
    assert_eq!(data["failed_rows"], 0);
    assert_eq!(data["progress"]["percentage"], 100.0);

    // The final state is also visible on a follow-up status poll.
    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{SESSIONS}/{id}"), MERCHANT_A).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "completed");
    assert!(json["data"]["completed_at"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_with_bad_row_counts_failure_and_persists_error(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 3).await;

    let app = common::build_test_app(pool.clone());
    let response = post_csv(
        app,
        &format!("{SESSIONS}/{id}/file"),
        MERCHANT_A,
        ONE_BAD_ROW_CSV,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["status"], "completed");
    assert_eq!(data["processed_rows"], 3);
    assert_eq!(data["successful_rows"], 2);
    assert_eq!(data["failed_rows"], 1);
    assert!(data["error_summary"].is_string());
    // A session with failures carries a recent-error list.
    assert!(data["recent_errors"].is_array());

    // The row error is exportable with full diagnostics.
    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{SESSIONS}/{id}/errors"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let errors = json["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["row_number"], 3);
    assert_eq!(errors[0]["error_type"], "INVALID_STOCK_QUANTITY");
    assert_eq!(errors[0]["severity"], "error");
    assert_eq!(errors[0]["field_name"], "variant_stock_quantity");
    assert_eq!(json["data"]["total"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_file_fails_session(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 1).await;

    let app = common::build_test_app(pool);
    let response = post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, "").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["status"], "failed");
    assert_eq!(data["processed_rows"], 0);
    assert!(data["error_summary"].as_str().unwrap().contains("EMPTY_FILE"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_headers_fail_session(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 1).await;

    let app = common::build_test_app(pool);
    let response = post_csv(
        app,
        &format!("{SESSIONS}/{id}/file"),
        MERCHANT_A,
        "product_handle,variant_sku\nwidget,W-1\n",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "failed");
    assert!(json["data"]["error_summary"]
        .as_str()
        .unwrap()
        .contains("MISSING_HEADERS"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_upload_to_same_session_returns_409(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 3).await;

    let app = common::build_test_app(pool.clone());
    let response = post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, VALID_CSV).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, VALID_CSV).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Cancel / retry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_moves_session_to_failed(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 10).await;

    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &format!("{SESSIONS}/{id}/cancel"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "failed");
    assert_eq!(json["data"]["error_summary"], "Cancelled by merchant");

    // Terminal sessions cannot be cancelled again.
    let app = common::build_test_app(pool);
    let response = post_empty(app, &format!("{SESSIONS}/{id}/cancel"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_session_cannot_be_cancelled(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 3).await;

    let app = common::build_test_app(pool.clone());
    post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, VALID_CSV).await;

    let app = common::build_test_app(pool);
    let response = post_empty(app, &format!("{SESSIONS}/{id}/cancel"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn retry_creates_fresh_session_from_failed_one(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 10).await;

    let app = common::build_test_app(pool.clone());
    post_empty(app, &format!("{SESSIONS}/{id}/cancel"), MERCHANT_A).await;

    let app = common::build_test_app(pool);
    let response = post_empty(app, &format!("{SESSIONS}/{id}/retry"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_ne!(data["id"].as_str().unwrap(), id);
    assert_eq!(data["status"], "created");
    assert_eq!(data["filename"], "products.csv");
    assert_eq!(data["expected_rows"], 10);
    assert_eq!(data["processed_rows"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn retry_of_active_session_returns_409(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 10).await;

    let app = common::build_test_app(pool);
    let response = post_empty(app, &format!("{SESSIONS}/{id}/retry"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// History listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn history_paginates_and_scopes_by_merchant(pool: PgPool) {
    for _ in 0..3 {
        create_session(&pool, MERCHANT_A, 5).await;
    }
    create_session(&pool, MERCHANT_B, 5).await;

    let app = common::build_test_app(pool.clone());
    let response = get_as(app, &format!("{SESSIONS}?page=1&page_size=2"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(data["page"], 1);
    assert_eq!(data["page_size"], 2);
    assert_eq!(data["total"], 3);

    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{SESSIONS}?page=2&page_size=2"), MERCHANT_A).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["sessions"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn history_filters_by_status(pool: PgPool) {
    let id = create_session(&pool, MERCHANT_A, 3).await;
    create_session(&pool, MERCHANT_A, 3).await;

    let app = common::build_test_app(pool.clone());
    post_csv(app, &format!("{SESSIONS}/{id}/file"), MERCHANT_A, VALID_CSV).await;

    let app = common::build_test_app(pool.clone());
    let response = get_as(app, &format!("{SESSIONS}?status=completed"), MERCHANT_A).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["sessions"][0]["id"].as_str().unwrap(), id);

    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{SESSIONS}?status=bogus"), MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Error export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn error_export_for_unknown_session_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_as(
        app,
        &format!("{SESSIONS}/{}/errors", uuid::Uuid::now_v7()),
        MERCHANT_A,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Template download
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn template_downloads_as_csv_attachment(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_as(app, "/api/v1/bulk-upload/template", MERCHANT_A).await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("product_upload_template_basic.csv"));

    let body = body_string(response).await;
    let header = body.lines().next().unwrap();
    assert!(header.starts_with("product_handle,variant_sku,variant_stock_quantity"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn comprehensive_template_with_samples_has_data_rows(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_as(
        app,
        "/api/v1/bulk-upload/template?template_type=comprehensive&sample_data=true",
        MERCHANT_A,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3, "header plus two sample variants");
    assert!(lines[0].contains("product_name"));
    assert!(lines[1].contains("wireless-headphones"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_template_type_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_as(
        app,
        "/api/v1/bulk-upload/template?template_type=deluxe",
        MERCHANT_A,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

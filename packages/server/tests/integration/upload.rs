use std::collections::BTreeMap;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use crate::common::{
    GENERATOR_EMPTY, GENERATOR_FAILING, GENERATOR_OK, MockRow, TestApp, no_rows, routes,
    upload_row, user_row,
};

fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn name_rows(names: &[&str]) -> Vec<MockRow> {
    names
        .iter()
        .map(|name| BTreeMap::from([("name", Value::from(*name))]))
        .collect()
}

const PNG_BYTES: &[u8] = b"not really a png, close enough";

#[tokio::test]
async fn successful_upload_publishes_the_generated_model() {
    let user_id = Uuid::now_v7();
    let db = mock()
        .append_query_results([vec![user_row(user_id, Some("alice"), None)]])
        .append_query_results([vec![upload_row(
            Uuid::now_v7(),
            user_id,
            "My Scan",
            Some(serde_json::json!({"vertices": 12})),
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = TestApp::spawn(db, GENERATOR_OK).await;
    let token = app.token_for(user_id, "alice");

    let res = app
        .upload_with_token("my scan.png", PNG_BYTES.to_vec(), Some("My Scan"), &token)
        .await;

    assert_eq!(res.status, 201, "Upload failed: {}", res.text);
    assert_eq!(res.body["ok"], true);
    assert!(res.body["upload"]["share_id"].is_string());

    // The image blob is namespaced by kind and username, filename sanitized.
    let images = app.blob_names("images", "alice");
    assert_eq!(images.len(), 1);
    assert!(images[0].ends_with("_my_scan.png"), "got {images:?}");

    // The generator produced geometry, so the published model is its output,
    // not the fallback asset.
    let models = app.blob_names("models", "alice");
    assert_eq!(models.len(), 1);
    assert!(models[0].ends_with("_output.glb"), "got {models:?}");

    // Spool file and work dir are cleaned up on success.
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn upload_without_geometry_publishes_the_fallback_model() {
    let user_id = Uuid::now_v7();
    let db = mock()
        .append_query_results([vec![user_row(user_id, Some("alice"), None)]])
        .append_query_results([name_rows(&[])])
        .append_query_results([vec![upload_row(Uuid::now_v7(), user_id, "newXray1", None)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = TestApp::spawn(db, GENERATOR_EMPTY).await;
    let token = app.token_for(user_id, "alice");

    let res = app
        .upload_with_token("scan.png", PNG_BYTES.to_vec(), None, &token)
        .await;

    assert_eq!(res.status, 201, "Upload failed: {}", res.text);

    let models = app.blob_names("models", "alice");
    assert_eq!(models.len(), 1);
    assert!(models[0].ends_with("_fallback.glb"), "got {models:?}");
}

#[tokio::test]
async fn failed_generation_aborts_but_leaves_the_image_blob() {
    let user_id = Uuid::now_v7();
    let db = mock()
        .append_query_results([vec![user_row(user_id, Some("alice"), None)]])
        .into_connection();
    let app = TestApp::spawn(db, GENERATOR_FAILING).await;
    let token = app.token_for(user_id, "alice");

    let res = app
        .upload_with_token("scan.png", PNG_BYTES.to_vec(), None, &token)
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "GENERATOR_ERROR");
    assert!(
        res.body["message"]
            .as_str()
            .unwrap()
            .contains("status 3"),
        "message: {}",
        res.text
    );

    // The image blob was uploaded before the generator ran and is not
    // rolled back; no model is published and no record is created.
    assert_eq!(app.blob_names("images", "alice").len(), 1);
    assert_eq!(app.blob_names("models", "alice").len(), 0);

    // Local temp state is still cleaned up on the failure path.
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn upload_without_a_name_uses_the_allocator() {
    let user_id = Uuid::now_v7();
    let db = mock()
        .append_query_results([vec![user_row(user_id, Some("alice"), None)]])
        .append_query_results([name_rows(&["newXray1", "newXray3", "newxray7"])])
        .append_query_results([vec![upload_row(Uuid::now_v7(), user_id, "newXray8", None)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = TestApp::spawn(db, GENERATOR_OK).await;
    let token = app.token_for(user_id, "alice");

    let res = app
        .upload_with_token("scan.png", PNG_BYTES.to_vec(), None, &token)
        .await;

    assert_eq!(res.status, 201, "Upload failed: {}", res.text);
    assert_eq!(res.body["upload"]["name"], "newXray8");
}

#[tokio::test]
async fn whitespace_only_name_falls_back_to_the_allocator() {
    let user_id = Uuid::now_v7();
    let db = mock()
        .append_query_results([vec![user_row(user_id, Some("alice"), None)]])
        .append_query_results([name_rows(&[])])
        .append_query_results([vec![upload_row(Uuid::now_v7(), user_id, "newXray1", None)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = TestApp::spawn(db, GENERATOR_OK).await;
    let token = app.token_for(user_id, "alice");

    let res = app
        .upload_with_token("scan.png", PNG_BYTES.to_vec(), Some("   "), &token)
        .await;

    assert_eq!(res.status, 201, "Upload failed: {}", res.text);
}

#[tokio::test]
async fn upload_without_a_file_is_rejected() {
    let user_id = Uuid::now_v7();
    let app = TestApp::spawn(mock().into_connection(), GENERATOR_OK).await;
    let token = app.token_for(user_id, "alice");

    let form = reqwest::multipart::Form::new().text("name", "just a name");
    let res = app
        .client
        .post(format!("http://{}{}", app.addr, routes::UPLOAD))
        .header("Authorization", format!("Bearer {token}"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    let res = crate::common::TestResponse::from_response(res).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_for_an_unknown_user_is_not_found() {
    let db = mock().append_query_results([no_rows()]).into_connection();
    let app = TestApp::spawn(db, GENERATOR_OK).await;
    let token = app.token_for(Uuid::now_v7(), "ghost");

    let res = app
        .upload_with_token("scan.png", PNG_BYTES.to_vec(), None, &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unauthenticated_upload_is_rejected() {
    let app = TestApp::spawn(mock().into_connection(), GENERATOR_OK).await;

    let part = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name("scan.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);
    let res = app
        .client
        .post(format!("http://{}{}", app.addr, routes::UPLOAD))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    let res = crate::common::TestResponse::from_response(res).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}

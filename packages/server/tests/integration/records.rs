use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::json;
use uuid::Uuid;

use crate::common::{GENERATOR_OK, TestApp, no_rows, routes, upload_row};

fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

mod history {
    use super::*;

    #[tokio::test]
    async fn lists_own_uploads() {
        let user_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![
                upload_row(Uuid::now_v7(), user_id, "newXray2", None),
                upload_row(Uuid::now_v7(), user_id, "newXray1", None),
            ]])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app.get_with_token(routes::HISTORY, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        let items = res.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "newXray2");
        assert_eq!(items[1]["name"], "newXray1");
    }

    #[tokio::test]
    async fn search_filter_is_accepted() {
        let user_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![upload_row(Uuid::now_v7(), user_id, "wrist scan", None)]])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .get_with_token(&format!("{}?search=wri", routes::HISTORY), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_history_is_ok() {
        let user_id = Uuid::now_v7();
        let db = mock().append_query_results([no_rows()]).into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app.get_with_token(routes::HISTORY, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["items"].as_array().unwrap().len(), 0);
    }
}

mod rename {
    use super::*;

    #[tokio::test]
    async fn owner_can_rename() {
        let user_id = Uuid::now_v7();
        let upload_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![upload_row(upload_id, user_id, "newXray1", None)]])
            .append_query_results([vec![upload_row(upload_id, user_id, "left wrist", None)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .patch_with_token(
                &routes::upload_item(&upload_id.to_string()),
                &json!({"name": "left wrist"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        assert_eq!(res.body["item"]["name"], "left wrist");
    }

    #[tokio::test]
    async fn renaming_someone_elses_upload_is_forbidden() {
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        let upload_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![upload_row(upload_id, owner, "newXray1", None)]])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(intruder, "mallory");

        let res = app
            .patch_with_token(
                &routes::upload_item(&upload_id.to_string()),
                &json!({"name": "stolen"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn renaming_a_missing_upload_is_not_found() {
        let user_id = Uuid::now_v7();
        let db = mock().append_query_results([no_rows()]).into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .patch_with_token(
                &routes::upload_item(&Uuid::now_v7().to_string()),
                &json!({"name": "anything"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let user_id = Uuid::now_v7();
        let app = TestApp::spawn(mock().into_connection(), GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .patch_with_token(
                &routes::upload_item(&Uuid::now_v7().to_string()),
                &json!({"name": "   "}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let user_id = Uuid::now_v7();
        let app = TestApp::spawn(mock().into_connection(), GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .patch_with_token(
                &routes::upload_item("not-a-uuid"),
                &json!({"name": "fine"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_delete_removes_blobs_and_row() {
        let user_id = Uuid::now_v7();
        let upload_id = Uuid::now_v7();

        let mut row = upload_row(upload_id, user_id, "newXray1", None);
        row.insert("image_path", "images/alice/10_scan.png".into());
        row.insert("model_path", "models/alice/10_output.glb".into());

        let db = mock()
            .append_query_results([vec![row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        // Seed the blobs the record points at.
        let image = app.storage_root.join("images/alice/10_scan.png");
        let model = app.storage_root.join("models/alice/10_output.glb");
        std::fs::create_dir_all(image.parent().unwrap()).unwrap();
        std::fs::create_dir_all(model.parent().unwrap()).unwrap();
        std::fs::write(&image, b"img").unwrap();
        std::fs::write(&model, b"glb").unwrap();

        let res = app
            .delete_with_token(&routes::upload_item(&upload_id.to_string()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        assert!(!image.exists());
        assert!(!model.exists());
    }

    #[tokio::test]
    async fn delete_succeeds_even_when_blobs_are_already_gone() {
        let user_id = Uuid::now_v7();
        let upload_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![upload_row(upload_id, user_id, "newXray1", None)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(user_id, "alice");

        let res = app
            .delete_with_token(&routes::upload_item(&upload_id.to_string()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn deleting_someone_elses_upload_is_forbidden() {
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        let upload_id = Uuid::now_v7();
        let db = mock()
            .append_query_results([vec![upload_row(upload_id, owner, "newXray1", None)]])
            .into_connection();
        let app = TestApp::spawn(db, GENERATOR_OK).await;
        let token = app.token_for(intruder, "mallory");

        let res = app
            .delete_with_token(&routes::upload_item(&upload_id.to_string()), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }
}

mod common;

use reqwest::StatusCode;
use serde_json::json;

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn register_returns_tokens_and_user() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("admin@test.com", "password123", "Admin").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], "admin@test.com");
    assert!(body["user"]["password_hash"].is_null());

    common::cleanup(app).await;
}

#[tokio::test]
async fn first_user_receives_admin_role() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app.get_auth("/api/v1/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    let roles: Vec<&str> = body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert!(roles.contains(&"Admin"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn later_users_receive_member_role() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (token, _) = app.register_user("sarah@test.com", "Sarah").await;

    let (body, status) = app.get_auth("/api/v1/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    let roles: Vec<&str> = body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["Member"]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.register("admin@test.com", "password123", "Dup").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("admin@test.com", "short", "Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("not-an-email", "password123", "Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_valid_credentials() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.login("admin@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_invalid_credentials() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.login("admin@test.com", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_nonexistent_user() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.login("nobody@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Token Refresh ───────────────────────────────────────────────

#[tokio::test]
async fn refresh_token_rotation() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (login_body, _) = app.login("admin@test.com", "password123").await;
    let refresh = login_body["refresh_token"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    let new_refresh = body["refresh_token"].as_str().unwrap();
    assert_ne!(new_refresh, refresh);

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_token_reuse_detection() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (login_body, _) = app.login("admin@test.com", "password123").await;
    let refresh = login_body["refresh_token"].as_str().unwrap();

    let resp1 = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp1.status(), StatusCode::OK);

    // Replaying the consumed token revokes all sessions
    let resp2 = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn change_password_and_login_with_new() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &token,
            &json!({ "current_password": "password123", "new_password": "newpassword456" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, old) = app.login("admin@test.com", "password123").await;
    assert_eq!(old, StatusCode::UNAUTHORIZED);

    let (_, new) = app.login("admin@test.com", "newpassword456").await;
    assert_eq!(new, StatusCode::OK);

    common::cleanup(app).await;
}

// ── Projects & membership ───────────────────────────────────────

#[tokio::test]
async fn create_project_adds_owner_as_only_member() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let project = app.create_project(&token, "E-Commerce", "ECOM").await;
    let id = project["id"].as_str().unwrap();
    assert_eq!(project["key"], "ECOM");

    let (members, status) = app
        .get_auth(&format!("/api/v1/projects/{id}/members"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["email"], "admin@test.com");

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_key_is_validated() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    for bad in ["ecom", "E", "1ABC", "TOOLONGKEY1", "AB-C"] {
        let (body, status) = app
            .post_auth(
                "/api/v1/projects",
                &token,
                &json!({ "name": "Bad", "key": bad }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "key {bad} accepted: {body}");
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn duplicate_project_key_conflicts() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    app.create_project(&token, "First", "ECOM").await;

    let (body, status) = app
        .post_auth(
            "/api/v1/projects",
            &token,
            &json!({ "name": "Second", "key": "ECOM" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn membership_scenario_ecom() {
    let app = common::spawn_app().await;
    // john bootstraps and owns ECOM
    let (john_body, status) = app.register("john@example.com", "password123", "John").await;
    assert_eq!(status, StatusCode::OK);
    let john = john_body["access_token"].as_str().unwrap().to_string();
    let (_, sarah_id) = app.register_user("sarah@example.com", "Sarah").await;

    let project = app.create_project(&john, "E-Commerce", "ECOM").await;
    let id = project["id"].as_str().unwrap();

    let (members, _) = app
        .get_auth(&format!("/api/v1/projects/{id}/members"), &john)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 1);

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{id}/members"),
            &john,
            &json!({ "user_id": sarah_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (members, _) = app
        .get_auth(&format!("/api/v1/projects/{id}/members"), &john)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 2);

    // Adding sarah again fails with the exact message
    let (body, status) = app
        .post_auth(
            &format!("/api/v1/projects/{id}/members"),
            &john,
            &json!({ "user_id": sarah_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User is already a member of this project");

    common::cleanup(app).await;
}

#[tokio::test]
async fn add_member_unknown_user_is_not_found() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let id = project["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/projects/{id}/members"),
            &token,
            &json!({ "user_id": "00000000-0000-0000-0000-000000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_owner_cannot_be_removed() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let id = project["id"].as_str().unwrap();
    let owner_id = project["owner_id"].as_str().unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/projects/{id}/members/{owner_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_list_shows_only_memberships() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    app.create_project(&admin, "Admin Only", "ADM").await;
    app.create_project(&sarah, "Sarah Only", "SAR").await;

    let (projects, _) = app.get_auth("/api/v1/projects", &sarah).await;
    let keys: Vec<&str> = projects
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["SAR"]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn delete_project_soft_deletes() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Doomed", "DOOM").await;
    let id = project["id"].as_str().unwrap();

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth(&format!("/api/v1/projects/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Row still exists, flagged deleted
    let flagged: bool = sqlx::query_scalar("SELECT is_deleted FROM projects WHERE key = 'DOOM'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(flagged);

    common::cleanup(app).await;
}

#[tokio::test]
async fn non_owner_without_permission_cannot_delete_project() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    // Sarah owns nothing and Member lacks Projects.Delete
    let project = app.create_project(&admin, "Core", "CORE").await;
    let id = project["id"].as_str().unwrap();

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &sarah).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn owner_without_delete_permission_can_delete_own_project() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    let project = app.create_project(&sarah, "Mine", "MINE").await;
    let id = project["id"].as_str().unwrap();

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &sarah).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

// ── Work items ──────────────────────────────────────────────────

#[tokio::test]
async fn create_work_item_with_defaults() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let item = app.create_work_item(&token, project_id, "First task").await;
    assert_eq!(item["status"], "todo");
    assert_eq!(item["priority"], "medium");
    assert_eq!(item["item_type"], "task");
    // Reporter defaults to the caller
    assert_eq!(item["reporter_id"], project["owner_id"]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn create_work_item_unknown_project_persists_nothing() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/projects/00000000-0000-0000-0000-000000000000/workitems",
            &token,
            &json!({ "title": "Orphan", "item_type": "task" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_items")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn work_item_title_is_validated() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/workitems"),
            &token,
            &json!({ "title": "  ", "item_type": "bug" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/workitems"),
            &token,
            &json!({ "title": "x".repeat(201), "item_type": "bug" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn work_item_sprint_must_belong_to_same_project() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let p1 = app.create_project(&token, "One", "ONE").await;
    let p2 = app.create_project(&token, "Two", "TWO").await;
    let p1_id = p1["id"].as_str().unwrap();
    let p2_id = p2["id"].as_str().unwrap();

    let (sprint, status) = app
        .post_auth(
            &format!("/api/v1/projects/{p2_id}/sprints"),
            &token,
            &json!({ "name": "Sprint 1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let sprint_id = sprint["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/projects/{p1_id}/workitems"),
            &token,
            &json!({ "title": "Crossed", "item_type": "task", "sprint_id": sprint_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    common::cleanup(app).await;
}

#[tokio::test]
async fn work_item_update_and_soft_delete() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();
    let item = app.create_work_item(&token, project_id, "Task").await;
    let id = item["id"].as_str().unwrap();

    let (updated, status) = app
        .put_auth(
            &format!("/api/v1/workitems/{id}"),
            &token,
            &json!({
                "title": "Task, renamed",
                "item_type": "story",
                "status": "in_progress",
                "priority": "high",
                "story_points": 5
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["story_points"], 5);

    let (_, status) = app.delete_auth(&format!("/api/v1/workitems/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (items, _) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/workitems"), &token)
        .await;
    assert_eq!(items.as_array().unwrap().len(), 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn work_item_rejects_negative_story_points() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/workitems"),
            &token,
            &json!({ "title": "Bad", "item_type": "task", "story_points": -3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── Sprints ─────────────────────────────────────────────────────

#[tokio::test]
async fn sprint_lifecycle() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (sprint, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/sprints"),
            &token,
            &json!({ "name": "Sprint 1", "goal": "Ship it" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = sprint["id"].as_str().unwrap();
    assert_eq!(sprint["is_active"], false);

    let (started, status) = app
        .post_auth(&format!("/api/v1/sprints/{id}/start"), &token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["is_active"], true);

    let (completed, status) = app
        .post_auth(&format!("/api/v1/sprints/{id}/complete"), &token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["is_active"], false);
    assert_eq!(completed["is_completed"], true);

    // A completed sprint cannot be restarted
    let (_, status) = app
        .post_auth(&format!("/api/v1/sprints/{id}/start"), &token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn sprint_rejects_end_before_start() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/sprints"),
            &token,
            &json!({
                "name": "Backwards",
                "start_date": "2026-09-15T00:00:00Z",
                "end_date": "2026-09-01T00:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn sprint_lists_its_work_items() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (sprint, _) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/sprints"),
            &token,
            &json!({ "name": "Sprint 1" }),
        )
        .await;
    let sprint_id = sprint["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/workitems"),
            &token,
            &json!({ "title": "In sprint", "item_type": "task", "sprint_id": sprint_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.create_work_item(&token, project_id, "Backlog item").await;

    let (items, status) = app
        .get_auth(&format!("/api/v1/sprints/{sprint_id}/workitems"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["title"], "In sprint");

    common::cleanup(app).await;
}

// ── Comments ────────────────────────────────────────────────────

#[tokio::test]
async fn comment_crud() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();
    let item = app.create_work_item(&token, project_id, "Task").await;
    let item_id = item["id"].as_str().unwrap();

    let (comment, status) = app
        .post_auth(
            &format!("/api/v1/workitems/{item_id}/comments"),
            &token,
            &json!({ "content": "Looks good" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = comment["id"].as_str().unwrap();

    let (updated, status) = app
        .put_auth(
            &format!("/api/v1/comments/{comment_id}"),
            &token,
            &json!({ "content": "Looks great" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "Looks great");

    let (_, status) = app
        .delete_auth(&format!("/api/v1/comments/{comment_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (comments, _) = app
        .get_auth(&format!("/api/v1/workitems/{item_id}/comments"), &token)
        .await;
    assert_eq!(comments.as_array().unwrap().len(), 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn comment_on_unknown_work_item_is_not_found() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/workitems/00000000-0000-0000-0000-000000000000/comments",
            &token,
            &json!({ "content": "Hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Documents ───────────────────────────────────────────────────

#[tokio::test]
async fn document_crud() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let project = app.create_project(&token, "Core", "CORE").await;
    let project_id = project["id"].as_str().unwrap();

    let (doc, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/documents"),
            &token,
            &json!({ "title": "Runbook", "content": "Step one...", "category": "operations" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let doc_id = doc["id"].as_str().unwrap();

    let (updated, status) = app
        .put_auth(
            &format!("/api/v1/documents/{doc_id}"),
            &token,
            &json!({ "title": "Runbook v2", "content": "Step one...", "category": "operations" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Runbook v2");

    let (_, status) = app
        .delete_auth(&format!("/api/v1/documents/{doc_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (docs, _) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/documents"), &token)
        .await;
    assert_eq!(docs.as_array().unwrap().len(), 0);

    common::cleanup(app).await;
}

// ── Groups ──────────────────────────────────────────────────────

#[tokio::test]
async fn group_membership_is_unique() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, sarah_id) = app.register_user("sarah@test.com", "Sarah").await;

    let (group, status) = app
        .post_auth(
            "/api/v1/groups",
            &admin,
            &json!({ "name": "Platform", "description": "Platform team" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = group["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/groups/{group_id}/members"),
            &admin,
            &json!({ "user_id": sarah_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/groups/{group_id}/members"),
            &admin,
            &json!({ "user_id": sarah_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User is already a member of this group");

    common::cleanup(app).await;
}

#[tokio::test]
async fn member_cannot_manage_groups() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    let (_, status) = app
        .post_auth("/api/v1/groups", &sarah, &json!({ "name": "Rogue" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

// ── RBAC & admin surface ────────────────────────────────────────

#[tokio::test]
async fn member_cannot_access_admin_panel() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn role_assignment_grants_and_revokes_permission() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (sarah, sarah_id) = app.register_user("sarah@test.com", "Sarah").await;

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Assign the Admin role; the panel opens up
    let admin_role = app.role_id(&admin, "Admin").await;
    let (_, status) = app
        .post_auth(
            &format!("/api/v1/admin/users/{sarah_id}/roles"),
            &admin,
            &json!({ "role_id": admin_role }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::OK);

    // Remove the assignment (soft delete); access is gone again
    let (_, status) = app
        .delete_auth(
            &format!("/api/v1/admin/users/{sarah_id}/roles/{admin_role}"),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn duplicate_role_assignment_conflicts() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, sarah_id) = app.register_user("sarah@test.com", "Sarah").await;

    let admin_role = app.role_id(&admin, "Admin").await;
    let (_, status) = app
        .post_auth(
            &format!("/api/v1/admin/users/{sarah_id}/roles"),
            &admin,
            &json!({ "role_id": admin_role }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/admin/users/{sarah_id}/roles"),
            &admin,
            &json!({ "role_id": admin_role }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already has this role");

    common::cleanup(app).await;
}

#[tokio::test]
async fn duplicate_permission_grant_conflicts() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (role, status) = app
        .post_auth(
            "/api/v1/admin/roles",
            &admin,
            &json!({ "name": "Auditor", "description": "Read-only admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let role_id = role["id"].as_str().unwrap();

    let (perms, _) = app.get_auth("/api/v1/admin/permissions", &admin).await;
    let panel_perm = perms
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Admin.AccessAdminPanel")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/admin/roles/{role_id}/permissions"),
            &admin,
            &json!({ "permission_id": panel_perm }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/admin/roles/{role_id}/permissions"),
            &admin,
            &json!({ "permission_id": panel_perm }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Role already has this permission");

    common::cleanup(app).await;
}

#[tokio::test]
async fn revoking_role_permission_disables_access() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (sarah, sarah_id) = app.register_user("sarah@test.com", "Sarah").await;

    // Custom role holding only the admin-panel permission
    let (role, status) = app
        .post_auth(
            "/api/v1/admin/roles",
            &admin,
            &json!({ "name": "Auditor", "description": "Read-only admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let role_id = role["id"].as_str().unwrap();

    let (perms, _) = app.get_auth("/api/v1/admin/permissions", &admin).await;
    let panel_perm = perms
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Admin.AccessAdminPanel")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/admin/roles/{role_id}/permissions"),
            &admin,
            &json!({ "permission_id": panel_perm }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/admin/users/{sarah_id}/roles"),
            &admin,
            &json!({ "role_id": role_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::OK);

    // Revoke the link; the permission disappears with it
    let (_, status) = app
        .delete_auth(
            &format!("/api/v1/admin/roles/{role_id}/permissions/{panel_perm}"),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/admin/roles", &sarah).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn soft_deleting_role_disables_access() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    // Sarah's only role is Member, which carries Projects.Create
    let (_, status) = app
        .post_auth(
            "/api/v1/projects",
            &sarah,
            &json!({ "name": "Before", "key": "BEF" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let member_role = app.role_id(&admin, "Member").await;
    let (_, status) = app
        .delete_auth(&format!("/api/v1/admin/roles/{member_role}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    // With the role gone, its permissions are gone too
    let (_, status) = app
        .post_auth(
            "/api/v1/projects",
            &sarah,
            &json!({ "name": "After", "key": "AFT" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn my_permissions_lists_distinct_union() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;

    let (body, status) = app.get_auth("/api/v1/users/me/permissions", &sarah).await;
    assert_eq!(status, StatusCode::OK);
    let perms: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(perms.contains(&"Projects.Create"));
    assert!(perms.contains(&"Users.View"));
    assert!(!perms.contains(&"Admin.AccessAdminPanel"));

    // No duplicates
    let mut deduped = perms.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), perms.len());

    common::cleanup(app).await;
}

#[tokio::test]
async fn users_list_requires_view_permission() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (users, status) = app.get_auth("/api/v1/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn update_profile_changes_display_name() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .put_auth("/api/v1/users/me", &token, &json!({ "name": "New Name" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "New Name");

    let (body, _) = app.get_auth("/api/v1/users/me", &token).await;
    assert_eq!(body["name"], "New Name");

    let (_, status) = app
        .put_auth("/api/v1/users/me", &token, &json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_can_soft_delete_user() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, sarah_id) = app.register_user("sarah@test.com", "Sarah").await;

    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{sarah_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Gone from the listing, and her credentials no longer work
    let (users, _) = app.get_auth("/api/v1/users", &admin).await;
    assert!(users
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["id"] != sarah_id.as_str()));
    let (_, status) = app.login("sarah@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Second delete is a 404
    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{sarah_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (me, _) = app.get_auth("/api/v1/users/me", &admin).await;
    let admin_id = me["id"].as_str().unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{admin_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn member_cannot_delete_users() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (sarah, _) = app.register_user("sarah@test.com", "Sarah").await;
    let (_, john_id) = app.register_user("john@test.com", "John").await;

    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{john_id}"), &sarah)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn audit_log_records_mutations() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    app.create_project(&admin, "Core", "CORE").await;

    let (events, status) = app.get_auth("/api/v1/admin/audit", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"user.registered"));
    assert!(actions.contains(&"project.created"));

    common::cleanup(app).await;
}

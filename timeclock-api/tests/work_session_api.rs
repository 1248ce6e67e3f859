#[macro_use]
extern crate time_test;

use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::tokio;
use serde_json::json;

use timeclock_api::orm::testing::test_rocket;

async fn test_client() -> Client {
    Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance")
}

#[tokio::test]
async fn test_start_conflict_end_scenario() {
    let client = test_client().await;
    time_test!("test_start_conflict_end_scenario");

    // AIP001 clocks in at 10:00:00.
    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "a4f77fd0-032c-4b3c-8db5-00ef6b39a372",
            "employee_code": "AIP001",
            "start_time": "2025-08-01T10:00:00"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let session_id = body["id"].as_i64().unwrap();
    assert_eq!(body["employee_code"], "AIP001");
    assert!(body["end_time"].is_null());

    // An immediate second start must not create a record; it names the winner.
    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "a4f77fd0-032c-4b3c-8db5-00ef6b39a372",
            "employee_code": "AIP001",
            "start_time": "2025-08-01T10:00:05"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["existing_session_id"].as_i64().unwrap(), session_id);

    // Clocking out at 10:30:00 yields a 1800 second session.
    let response = client
        .put(format!("/api/1/sessions/{session_id}"))
        .json(&json!({ "end_time": "2025-08-01T10:30:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["end_time"], "2025-08-01T10:30:00");
    assert_eq!(body["duration_seconds"].as_i64().unwrap(), 1800);
}

#[tokio::test]
async fn test_end_is_idempotent_against_rewrites() {
    let client = test_client().await;
    time_test!("test_end_is_idempotent_against_rewrites");

    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "8d4b4a43-b8e0-48f6-bd95-0cde0c3a4ea5",
            "employee_code": "AIP002",
            "start_time": "2025-08-01T09:00:00"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let session_id = body["id"].as_i64().unwrap();

    let response = client
        .put(format!("/api/1/sessions/{session_id}"))
        .json(&json!({ "end_time": "2025-08-01T17:00:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // The second end reports the first end_time and changes nothing.
    let response = client
        .put(format!("/api/1/sessions/{session_id}"))
        .json(&json!({ "end_time": "2025-08-01T18:00:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["previous_end_time"], "2025-08-01T17:00:00");
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let client = test_client().await;
    time_test!("test_end_before_start_is_rejected");

    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "7e63b1ec-882d-4b28-80d4-e7a3aa80cb32",
            "employee_code": "AIP003",
            "start_time": "2025-08-01T10:00:00"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let session_id = body["id"].as_i64().unwrap();

    let response = client
        .put(format!("/api/1/sessions/{session_id}"))
        .json(&json!({ "end_time": "2025-08-01T09:00:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    // The session is still active afterwards.
    let response = client
        .get("/api/1/sessions/active?employee_code=AIP003")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["active"], true);
    assert_eq!(body["session"]["id"].as_i64().unwrap(), session_id);
}

#[tokio::test]
async fn test_end_unknown_session_is_not_found() {
    let client = test_client().await;
    time_test!("test_end_unknown_session_is_not_found");

    let response = client
        .put("/api/1/sessions/424242")
        .json(&json!({ "end_time": "2025-08-01T10:00:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_start_for_unknown_employee_is_not_found() {
    let client = test_client().await;
    time_test!("test_start_for_unknown_employee_is_not_found");

    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "16e1dd00-c2ab-4a66-a358-e3e993a649fe",
            "employee_code": "AIP404",
            "start_time": "2025-08-01T10:00:00"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_active_session_lookup_states() {
    let client = test_client().await;
    time_test!("test_active_session_lookup_states");

    // Idle employee: active=false, no session.
    let response = client
        .get("/api/1/sessions/active?employee_code=AIP004")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["active"], false);
    assert!(body["session"].is_null());

    // Missing both selectors is a client error.
    let response = client.get("/api/1/sessions/active").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    // After a start the session comes back through either selector.
    let response = client
        .post("/api/1/sessions")
        .json(&json!({
            "user_id": "3f0ad0f6-3b31-4d7b-9e74-42e740231592",
            "employee_code": "AIP004",
            "start_time": "2025-08-01T08:00:00"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let response = client
        .get("/api/1/sessions/active?user_id=3f0ad0f6-3b31-4d7b-9e74-42e740231592")
        .dispatch()
        .await;
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["active"], true);
    assert_eq!(body["session"]["employee_code"], "AIP004");
}

#[tokio::test]
async fn test_session_history_is_newest_first() {
    let client = test_client().await;
    time_test!("test_session_history_is_newest_first");

    for (start, end) in [
        ("2025-08-01T08:00:00", "2025-08-01T12:00:00"),
        ("2025-08-01T13:00:00", "2025-08-01T17:00:00"),
    ] {
        let response = client
            .post("/api/1/sessions")
            .json(&json!({
                "user_id": "ea70d710-5818-4c41-b80e-9b6ab750aad3",
                "employee_code": "AIP001",
                "start_time": start
            }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let body: serde_json::Value = response.into_json().await.unwrap();
        let session_id = body["id"].as_i64().unwrap();

        let response = client
            .put(format!("/api/1/sessions/{session_id}"))
            .json(&json!({ "end_time": end }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    let response = client
        .get("/api/1/sessions?employee_code=AIP001")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["start_time"], "2025-08-01T13:00:00");
    assert_eq!(sessions[1]["start_time"], "2025-08-01T08:00:00");
}

use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::tokio;

use timeclock_api::orm::testing::test_rocket;

#[tokio::test]
async fn test_lookup_known_employee() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = client.get("/api/1/employees/AIP001").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["employee_code"], "AIP001");
    assert_eq!(body["full_name"], "Dana Whitfield");
    assert!(body["user_id"].is_string());
}

#[tokio::test]
async fn test_lookup_unknown_employee() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = client.get("/api/1/employees/ZZZ999").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("ZZZ999"));
}

#[tokio::test]
async fn test_list_directory() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = client.get("/api/1/employees").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.unwrap();
    let entries = body.as_array().unwrap();
    assert!(entries.len() >= 4);
    assert!(entries.iter().any(|e| e["employee_code"] == "AIP003"));
}

#[tokio::test]
async fn test_status_endpoint() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = client.get("/api/1/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], "running");
    assert!(body["version"].is_string());
}

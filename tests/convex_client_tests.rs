use admin_data::{Backend, BackendError, ConvexHttpClient, DataAdapter, Registry};
use httpmock::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

fn args(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

fn client(server: &MockServer, key: Option<&str>) -> ConvexHttpClient {
    ConvexHttpClient::new(&server.base_url(), key, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn query_posts_function_path_and_args() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/query")
                .header("Authorization", "Convex prod:secret")
                .json_body(json!({"path": "faqs:get", "args": {"faqId": "abc"}, "format": "json"}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"status": "success", "value": {"_id": "abc", "question": "Q"}, "logLines": []}));
        })
        .await;

    let value = client(&server, Some("prod:secret"))
        .query("faqs:get", args(json!({"faqId": "abc"})))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(value["question"], json!("Q"));
}

#[tokio::test]
async fn mutation_errors_are_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/mutation").body_contains("faqs:update");
            then.status(400).json_body(json!({
                "status": "error",
                "errorMessage": "Update on nonexistent document ID k17abc"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/mutation").body_contains("faqs:create");
            then.status(400).json_body(json!({
                "status": "error",
                "errorMessage": "ArgumentValidationError: Object is missing the required field `answer`.",
                "errorData": {"field": "answer"}
            }));
        })
        .await;

    let c = client(&server, None);
    let err = c.mutation("faqs:update", Map::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));

    let err = c.mutation("faqs:create", Map::new()).await.unwrap_err();
    match err {
        BackendError::Rejected { message, data } => {
            assert!(message.contains("answer"));
            assert_eq!(data, Some(json!({"field": "answer"})));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn server_errors_mean_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/query");
            then.status(503).body("upstream overloaded");
        })
        .await;
    let err = client(&server, None).query("faqs:list", Map::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)));
}

#[tokio::test]
async fn bad_deploy_key_means_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/mutation");
            then.status(401).body("Unauthorized");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/query");
            then.status(403).json_body(json!({"status": "error", "errorMessage": "BadDeployKey"}));
        })
        .await;

    let c = client(&server, Some("prod:stale"));
    let err = c.mutation("faqs:create", Map::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)));
    let err = c.query("faqs:list", Map::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(ref detail) if detail.contains("CONVEX_DEPLOY_KEY")));
}

#[tokio::test]
async fn connection_refused_means_unavailable() {
    let c = ConvexHttpClient::new("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
    let err = c.query("faqs:list", Map::new()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)));
}

#[tokio::test]
async fn adapter_over_http_reads_back_created_record() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/mutation").body_contains("team:create");
            then.status(200)
                .json_body(json!({"status": "success", "value": "k57d9xq3m2n8p4r6t1v5w7y9z0b2c4e6"}));
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/query")
                .json_body(json!({"path": "team:get", "args": {"memberId": "k57d9xq3m2n8p4r6t1v5w7y9z0b2c4e6"}, "format": "json"}));
            then.status(200).json_body(json!({
                "status": "success",
                "value": {
                    "_id": "k57d9xq3m2n8p4r6t1v5w7y9z0b2c4e6",
                    "_creationTime": 1760000000000.0,
                    "name": "Jordan Lee",
                    "role": "Site Supervisor",
                    "order": 2
                }
            }));
        })
        .await;

    let registry = Arc::new(Registry::builtin().unwrap());
    let adapter = DataAdapter::new(registry, Arc::new(client(&server, None)));
    let created = adapter
        .create(
            "teamMembers",
            args(json!({"name": "Jordan Lee", "role": "Site Supervisor", "order": 2})),
        )
        .await
        .unwrap();
    create.assert_async().await;
    get.assert_async().await;
    assert_eq!(created["name"], json!("Jordan Lee"));
}

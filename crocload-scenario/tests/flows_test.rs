use crocload_config::{HttpConfig, ScenarioConfig};
use crocload_http::HttpManager;
use crocload_runner::{CheckRegistry, MetricsRegistry, VuContext};
use crocload_scenario::flows::{
    self, Session, CREATED_USER_CHECK, CREATE_GROUP, CROC_CREATED_CHECK, LISTING_GROUP,
    LOGGED_IN_CHECK, PUBLIC_GROUP,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context() -> VuContext {
    let manager = HttpManager::with_config(crocload_http::HttpConfig {
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .expect("client should build");
    VuContext::new(
        1,
        Arc::new(manager),
        Arc::new(MetricsRegistry::new()),
        Arc::new(CheckRegistry::new()),
    )
}

fn http_for(server: &MockServer) -> HttpConfig {
    HttpConfig {
        base_url: server.uri(),
        ..HttpConfig::default()
    }
}

fn session() -> Session {
    Session {
        token: "tok-123".to_string(),
    }
}

fn outcome(ctx: &VuContext, group: &str, name: &str) -> (u64, u64) {
    let result = ctx
        .checks()
        .get(group, name)
        .unwrap_or_else(|| panic!("check '{}' was not recorded", name));
    (result.passes, result.fails)
}

async fn mount_login(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/auth/token/login/"))
        .and(body_string_contains("username=robin.demo%40example.com"))
        .and(body_string_contains("password=superCroc2019"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_setup_registers_and_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/register/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("first_name=Crocodile"))
        .and(body_string_contains("last_name=Owner"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    mount_login(&server, json!({"access": "tok-123", "refresh": "r"})).await;

    let ctx = context();
    let session = flows::setup(&ctx, &http_for(&server), &ScenarioConfig::default()).await.unwrap();

    assert_eq!(session.token, "tok-123");
    assert_eq!(outcome(&ctx, "", CREATED_USER_CHECK), (1, 0));
    assert_eq!(outcome(&ctx, "", LOGGED_IN_CHECK), (1, 0));
}

#[tokio::test]
async fn test_setup_tolerates_existing_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"username": ["exists"]})))
        .mount(&server)
        .await;
    mount_login(&server, json!({"access": "tok-123"})).await;

    let ctx = context();
    let session = flows::setup(&ctx, &http_for(&server), &ScenarioConfig::default()).await.unwrap();

    assert_eq!(session.token, "tok-123");
    assert_eq!(outcome(&ctx, "", CREATED_USER_CHECK), (0, 1));
    assert_eq!(outcome(&ctx, "", LOGGED_IN_CHECK), (1, 0));
}

#[tokio::test]
async fn test_missing_access_field_yields_empty_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/register/"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    mount_login(&server, json!({"detail": "No active account"})).await;

    let ctx = context();
    let session = flows::setup(&ctx, &http_for(&server), &ScenarioConfig::default()).await.unwrap();

    assert_eq!(session.token, "");
    assert_eq!(outcome(&ctx, "", LOGGED_IN_CHECK), (0, 1));
}

#[tokio::test]
async fn test_setup_transport_error_propagates() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let http = HttpConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        ..HttpConfig::default()
    };

    let result = flows::setup(&context(), &http, &ScenarioConfig::default()).await;
    assert!(result.is_err());
}

async fn mount_public(server: &MockServer, ages: [u32; 4]) {
    for (i, age) in ages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/public/crocodiles/{}/", i + 1)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": i + 1,
                "name": "Bert",
                "sex": "M",
                "date_of_birth": "2010-05-04",
                "age": age,
            })))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_public_endpoints_pass_when_all_older() {
    let server = MockServer::start().await;
    mount_public(&server, [6, 7, 8, 9]).await;

    let ctx = context();
    flows::public_endpoints(&ctx, &http_for(&server), &ScenarioConfig::default()).await;

    let check = flows::older_than_check(5);
    assert_eq!(check, "Crocs are older than 5 years of age");
    assert_eq!(outcome(&ctx, "::Public endpoints", &check), (1, 0));
}

#[tokio::test]
async fn test_public_endpoints_fail_when_one_is_young() {
    let server = MockServer::start().await;
    mount_public(&server, [4, 7, 8, 9]).await;

    let ctx = context();
    flows::public_endpoints(&ctx, &http_for(&server), &ScenarioConfig::default()).await;

    let group = format!("::{}", PUBLIC_GROUP);
    assert_eq!(outcome(&ctx, &group, &flows::older_than_check(5)), (0, 1));
}

#[tokio::test]
async fn test_create_posts_named_croc_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/my/crocodiles/"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_string_contains("name=Jerry+"))
        .and(body_string_contains("sex=M"))
        .and(body_string_contains("date_of_birth=2001-01-01"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context();
    flows::create(&ctx, &http_for(&server), &ScenarioConfig::default(), &session()).await;

    let group = format!("::{}", CREATE_GROUP);
    assert_eq!(outcome(&ctx, &group, CROC_CREATED_CHECK), (1, 0));
}

#[tokio::test]
async fn test_create_fails_check_on_other_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/my/crocodiles/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let ctx = context();
    flows::create(&ctx, &http_for(&server), &ScenarioConfig::default(), &session()).await;

    let group = format!("::{}", CREATE_GROUP);
    assert_eq!(outcome(&ctx, &group, CROC_CREATED_CHECK), (0, 1));
}

async fn run_listing(body: serde_json::Value) -> (u64, u64) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my/crocodiles/"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context();
    flows::listing(&ctx, &http_for(&server), &ScenarioConfig::default(), &session()).await;

    let check = flows::listing_check("Jerry");
    assert_eq!(check, "$[0].name contains Jerry");
    outcome(&ctx, &format!("::{}", LISTING_GROUP), &check)
}

#[tokio::test]
async fn test_listing_passes_when_first_is_jerry() {
    let outcome = run_listing(json!([{"name": "Jerry abcde"}, {"name": "Fred xyz"}])).await;
    assert_eq!(outcome, (1, 0));
}

#[tokio::test]
async fn test_listing_fails_when_first_is_not_jerry() {
    let outcome = run_listing(json!([{"name": "Fred xyz"}, {"name": "Jerry abcde"}])).await;
    assert_eq!(outcome, (0, 1));
}

#[tokio::test]
async fn test_unreachable_api_fails_iteration_checks() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let http = HttpConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        ..HttpConfig::default()
    };
    let scenario = ScenarioConfig::default();

    let ctx = context();
    flows::public_endpoints(&ctx, &http, &scenario).await;
    flows::create(&ctx, &http, &scenario, &session()).await;
    flows::listing(&ctx, &http, &scenario, &session()).await;

    let public = format!("::{}", PUBLIC_GROUP);
    assert_eq!(outcome(&ctx, &public, &flows::older_than_check(5)), (0, 1));
    assert_eq!(outcome(&ctx, &format!("::{}", CREATE_GROUP), CROC_CREATED_CHECK), (0, 1));
    let listing = format!("::{}", LISTING_GROUP);
    assert_eq!(outcome(&ctx, &listing, &flows::listing_check("Jerry")), (0, 1));
}

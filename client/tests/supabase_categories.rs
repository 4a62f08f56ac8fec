//! Integration tests for the PostgREST category repository and connection probe using wiremock.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use storefront::domain::ports::{
    CategoryRepository, CategoryRepositoryError, ConnectionProbe, ConnectionStatus,
};
use storefront::domain::{BusinessId, CategoryId, CategoryUpdate, NewCategory};
use storefront::outbound::supabase::{SupabaseClient, SupabaseSettings};
use support::{ANON_KEY, BUSINESS_ID, MutableClock, category_json, client};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DRINKS_ID: &str = "3a3a3a3a-1111-4222-8333-444444444444";
const SNACKS_ID: &str = "3a3a3a3a-5555-4666-8777-888888888888";

fn business() -> BusinessId {
    BUSINESS_ID.parse().expect("business id")
}

fn drinks_id() -> CategoryId {
    DRINKS_ID.parse().expect("category id")
}

fn repository(server: &MockServer) -> impl CategoryRepository {
    client(server, Arc::new(MutableClock::new())).categories()
}

fn no_rows() -> ResponseTemplate {
    ResponseTemplate::new(406).set_body_json(json!({
        "code": "PGRST116",
        "details": "The result contains 0 rows",
        "hint": null,
        "message": "JSON object requested, multiple (or no) rows returned"
    }))
}

#[tokio::test]
async fn list_is_filtered_ordered_and_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("select", "*"))
        .and(query_param("business_id", format!("eq.{BUSINESS_ID}")))
        .and(query_param("order", "name.asc"))
        .and(header("prefer", "count=exact"))
        .and(header("apikey", ANON_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    category_json(DRINKS_ID, "Bebidas", Some("Frías")),
                    category_json(SNACKS_ID, "Snacks", None),
                ]))
                .insert_header("content-range", "0-1/2"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);

    let listed = repo.list(business()).await.expect("list succeeds");

    assert_eq!(listed.count, Some(2));
    let names: Vec<&str> = listed.items.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["Bebidas", "Snacks"]);
    assert_eq!(
        listed.items.first().and_then(|row| row.description.as_deref()),
        Some("Frías")
    );
}

#[tokio::test]
async fn search_uses_a_case_insensitive_pattern() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("name", "ilike.*beb*"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([category_json(DRINKS_ID, "Bebidas", None)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);

    let found = repo
        .search_by_name(business(), "beb")
        .await
        .expect("search succeeds");

    assert_eq!(found.items.len(), 1);
    assert_eq!(found.count, None);
}

#[tokio::test]
async fn missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("id", format!("eq.{DRINKS_ID}")))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(no_rows())
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);

    let error = repo.get(drinks_id()).await.expect_err("no such row");

    assert!(matches!(error, CategoryRepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn create_returns_the_stored_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{
            "business_id": BUSINESS_ID,
            "name": "Bebidas",
            "description": null
        }])))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(category_json(DRINKS_ID, "Bebidas", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);
    let new = NewCategory::new(business(), "  Bebidas ", None).expect("valid payload");

    let created = repo.create(&new).await.expect("create succeeds");

    assert_eq!(created.id, drinks_id());
    assert_eq!(created.business_id, business());
}

#[tokio::test]
async fn batch_create_sends_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            category_json(DRINKS_ID, "Bebidas", None),
            category_json(SNACKS_ID, "Snacks", None),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);
    let batch = vec![
        NewCategory::new(business(), "Bebidas", None).expect("valid payload"),
        NewCategory::new(business(), "Snacks", None).expect("valid payload"),
    ];

    let created = repo.create_many(&batch).await.expect("batch succeeds");

    assert_eq!(created.len(), 2);
}

#[tokio::test]
async fn constraint_violations_are_rejected_with_the_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"categories_name_key\""
        })))
        .mount(&server)
        .await;
    let repo = repository(&server);
    let new = NewCategory::new(business(), "Bebidas", None).expect("valid payload");

    let error = repo.create(&new).await.expect_err("duplicate");

    assert!(matches!(error, CategoryRepositoryError::Rejected { .. }));
    assert!(error.to_string().starts_with("duplicate key value"));
}

#[tokio::test]
async fn update_patches_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/categories"))
        .and(query_param("id", format!("eq.{DRINKS_ID}")))
        .and(body_json(json!({ "name": "Refrescos" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(category_json(DRINKS_ID, "Refrescos", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);
    let update = CategoryUpdate::new(Some("Refrescos"), None).expect("valid patch");

    let updated = repo.update(drinks_id(), &update).await.expect("update succeeds");

    assert_eq!(updated.name, "Refrescos");
}

#[tokio::test]
async fn delete_targets_one_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/categories"))
        .and(query_param("id", format!("eq.{DRINKS_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);

    repo.delete(drinks_id()).await.expect("delete succeeds");
}

#[tokio::test]
async fn count_reads_the_content_range_total() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/categories"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/7"))
        .expect(1)
        .mount(&server)
        .await;
    let repo = repository(&server);

    assert_eq!(repo.count(business()).await.expect("count succeeds"), 7);
}

#[tokio::test]
async fn missing_total_counts_as_zero() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let repo = repository(&server);

    assert_eq!(repo.count(business()).await.expect("count succeeds"), 0);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;
    let repo = repository(&server);

    let error = repo.list(business()).await.expect_err("unauthorised");

    assert_eq!(error, CategoryRepositoryError::unauthorized("JWT expired"));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let settings = SupabaseSettings::new(server.uri(), ANON_KEY, Duration::from_millis(200));
    let repo = SupabaseClient::new(&settings)
        .expect("client builds")
        .categories();

    let error = repo.list(business()).await.expect_err("times out");

    assert!(matches!(error, CategoryRepositoryError::Timeout { .. }));
}

#[tokio::test]
async fn probe_treats_no_rows_as_connected() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/categories"))
        .respond_with(no_rows())
        .expect(1)
        .mount(&server)
        .await;
    let probe = client(&server, Arc::new(MutableClock::new())).probe();

    assert_eq!(probe.check_connection().await, ConnectionStatus::Connected);
}

#[tokio::test]
async fn probe_reports_server_failures() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let probe = client(&server, Arc::new(MutableClock::new())).probe();

    let status = probe.check_connection().await;

    assert!(matches!(status, ConnectionStatus::Unreachable { .. }));
    assert!(!status.is_connected());
}

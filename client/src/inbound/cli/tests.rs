//! Regression coverage for this module.

use std::sync::Arc;

use clap::Parser;
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::ports::{FixtureAuthGateway, FixtureCategoryRepository, MockConnectionProbe};

const EMAIL: &str = "a@b.com";
const PASSWORD: &str = "secret1";

type FixtureApp = App<FixtureAuthGateway, FixtureCategoryRepository, MockConnectionProbe>;

fn app_with(gateway: FixtureAuthGateway, probe: MockConnectionProbe) -> FixtureApp {
    App::start(
        Arc::new(gateway),
        Arc::new(FixtureCategoryRepository::new()),
        probe,
    )
}

fn app() -> FixtureApp {
    app_with(
        FixtureAuthGateway::new().with_account(EMAIL, PASSWORD),
        MockConnectionProbe::new(),
    )
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("storefront").chain(args.iter().copied()))
        .expect("arguments parse")
}

async fn run(app: &FixtureApp, args: &[&str]) -> (Result<Report, CliError>, String) {
    let mut out = Vec::new();
    let result = app.run(&parse(args), &mut out).await;
    (result, String::from_utf8(out).expect("utf-8 output"))
}

fn business() -> String {
    Uuid::new_v4().to_string()
}

#[test]
fn credentials_must_come_in_pairs() {
    let result = Cli::try_parse_from(["storefront", "--email", EMAIL, "whoami"]);
    assert!(result.is_err());
}

#[test]
fn sign_up_flags_are_distinct_from_login_flags() {
    let cli = parse(&[
        "--email",
        EMAIL,
        "--password",
        PASSWORD,
        "sign-up",
        "--new-email",
        "new@b.com",
        "--new-password",
        "secret2",
        "--confirm",
        "secret2",
    ]);

    assert_eq!(cli.login.email.as_deref(), Some(EMAIL));
    let Command::SignUp { new_email, .. } = cli.command else {
        panic!("expected sign-up");
    };
    assert_eq!(new_email, "new@b.com");
}

#[test]
fn description_and_clear_conflict() {
    let id = Uuid::new_v4().to_string();
    let result = Cli::try_parse_from([
        "storefront",
        "categories",
        "--business",
        &business(),
        "update",
        &id,
        "--description",
        "x",
        "--clear-description",
    ]);
    assert!(result.is_err());
}

#[tokio::test]
async fn whoami_reports_anonymous_without_credentials() {
    let app = app();
    let (result, out) = run(&app, &["whoami"]).await;

    assert_eq!(
        result.expect("whoami runs"),
        Report::Identity {
            email: None,
            user_id: None
        }
    );
    assert_eq!(out, "anonymous\n");
}

#[tokio::test]
async fn credentials_sign_in_before_the_command() {
    let app = app();
    let (result, out) = run(&app, &["--email", EMAIL, "--password", PASSWORD, "whoami"]).await;

    let Report::Identity { email, user_id } = result.expect("whoami runs") else {
        panic!("expected identity report");
    };
    assert_eq!(email.as_deref(), Some(EMAIL));
    assert!(user_id.is_some());
    assert!(out.starts_with(EMAIL));
}

#[tokio::test]
async fn refused_credentials_surface_the_form_message() {
    let app = app();
    let (result, out) = run(&app, &["--email", EMAIL, "--password", "wrong1", "whoami"]).await;

    let error = result.expect_err("sign-in fails");
    assert_eq!(
        error.to_string(),
        "Credenciales inválidas. Verifica tu email y contraseña."
    );
    assert!(out.is_empty());
}

#[rstest]
#[case::protected_while_anonymous(&["navigate", "/categories?page=2"], "redirect /login (return to /categories?page=2)\n")]
#[case::login_page_while_anonymous(&["navigate", "/login"], "allow\n")]
#[case::unknown_page(&["navigate", "/nope"], "redirect /login (return to /nope)\n")]
#[tokio::test]
async fn navigation_while_anonymous(#[case] args: &[&str], #[case] first_line: &str) {
    let app = app();
    let (result, out) = run(&app, args).await;

    result.expect("navigate runs");
    assert!(out.starts_with(first_line), "unexpected output: {out}");
}

#[tokio::test]
async fn navigation_after_sign_in_bounces_auth_pages_home() {
    let app = app();
    let (result, out) = run(
        &app,
        &["--email", EMAIL, "--password", PASSWORD, "navigate", "/login"],
    )
    .await;

    let Report::Navigation {
        decision, title, ..
    } = result.expect("navigate runs")
    else {
        panic!("expected navigation report");
    };
    assert_eq!(decision, GuardDecision::RedirectToHome);
    assert_eq!(title, "Inicio");
    assert_eq!(out, "redirect /home\nInicio: Inicio\n");
}

#[tokio::test]
async fn categories_require_a_signed_in_user() {
    let app = app();
    let business = business();
    let (result, _) = run(&app, &["categories", "--business", &business, "list"]).await;

    assert!(matches!(result, Err(CliError::SignInRequired)));
}

#[tokio::test]
async fn defaults_then_count_and_search() {
    let app = app_with(
        FixtureAuthGateway::new()
            .with_account(EMAIL, PASSWORD)
            .with_stored_session(EMAIL),
        MockConnectionProbe::new(),
    );
    let business = business();

    let (created, _) = run(
        &app,
        &["categories", "--business", &business, "defaults", "--kind", "restaurant"],
    )
    .await;
    let Report::Categories { items } = created.expect("defaults created") else {
        panic!("expected rows");
    };
    assert_eq!(items.len(), 4);

    let (count, out) = run(&app, &["categories", "--business", &business, "count"]).await;
    assert_eq!(count.expect("count runs"), Report::Count { total: 4 });
    assert_eq!(out, "4\n");

    let (found, _) = run(
        &app,
        &["--json", "categories", "--business", &business, "search", "postre"],
    )
    .await;
    let Report::Categories { items } = found.expect("search runs") else {
        panic!("expected rows");
    };
    assert_eq!(
        items.iter().map(|row| row.name.as_str()).collect::<Vec<_>>(),
        vec!["Postres"]
    );
}

#[tokio::test]
async fn blank_category_names_are_rejected_before_any_request() {
    let app = app_with(
        FixtureAuthGateway::new().with_stored_session(EMAIL),
        MockConnectionProbe::new(),
    );
    let business = business();

    let (result, _) = run(&app, &["categories", "--business", &business, "create", "  "]).await;

    let Err(CliError::Category(error)) = result else {
        panic!("expected a category error");
    };
    assert!(error.is_user_correctable());
}

#[tokio::test]
async fn missing_category_is_not_found() {
    let app = app_with(
        FixtureAuthGateway::new().with_stored_session(EMAIL),
        MockConnectionProbe::new(),
    );
    let business = business();
    let id = Uuid::new_v4().to_string();

    let (result, _) = run(&app, &["categories", "--business", &business, "get", &id]).await;

    let Err(CliError::Category(error)) = result else {
        panic!("expected a category error");
    };
    assert_eq!(error.code(), crate::domain::ErrorCode::NotFound);
}

#[rstest]
#[case(ConnectionStatus::Connected, "connected\n")]
#[case(ConnectionStatus::NotConfigured, "not configured\n")]
#[tokio::test]
async fn connection_check_reports_status(
    #[case] status: ConnectionStatus,
    #[case] expected: &str,
) {
    let mut probe = MockConnectionProbe::new();
    probe
        .expect_check_connection()
        .times(1)
        .return_const(status);
    let app = app_with(FixtureAuthGateway::new(), probe);

    let (result, out) = run(&app, &["check-connection"]).await;

    result.expect("check runs");
    assert_eq!(out, expected);
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    let mut probe = MockConnectionProbe::new();
    probe
        .expect_check_connection()
        .times(1)
        .return_const(ConnectionStatus::Unreachable {
            message: "connection refused".to_owned(),
        });
    let app = app_with(FixtureAuthGateway::new(), probe);

    let (result, _) = run(&app, &["check-connection"]).await;

    assert_eq!(
        result.expect_err("unreachable").to_string(),
        "connection check failed: connection refused"
    );
}

#[tokio::test]
async fn json_output_is_tagged() {
    let app = app();
    let (_, out) = run(&app, &["--json", "whoami"]).await;

    let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(value["kind"], "identity");
    assert!(value["email"].is_null());
}

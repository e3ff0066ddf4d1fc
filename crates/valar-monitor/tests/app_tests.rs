/*
[INPUT]:  Mock dashboard API, MonitorConfig, console commands
[OUTPUT]: Verification of command execution against a running App
[POS]:    Integration tests - application layer
[UPDATE]: When commands or startup wiring change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client_for, position_body, positions_body, setup_mock_server, summary_body};
use tokio::time::timeout;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use valar_monitor::{App, Command, CommandOutcome, MonitorConfig};
use valar_refresh::{MemoryStore, RefreshCoordinator, Route};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_api() -> MockServer {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body(1000.0, 10.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(positions_body(vec![
            position_body("acct-1", "rb2505", 12.0, 3312.0),
        ])))
        .mount(&server)
        .await;
    server
}

fn start_app(server: &MockServer, start_page: &str) -> App {
    let config = MonitorConfig {
        accounts: vec!["acct-1".to_string()],
        start_page: start_page.to_string(),
        ..MonitorConfig::default()
    };
    let coordinator = RefreshCoordinator::new(Arc::new(MemoryStore::new()));
    App::start(&config, coordinator, client_for(server), CancellationToken::new())
}

fn output(outcome: CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Continue(output) => output,
        CommandOutcome::Quit => panic!("unexpected quit"),
    }
}

#[tokio::test]
async fn test_start_page_loads_immediately() {
    let server = mock_api().await;
    let app = start_app(&server, "/positions");
    assert_eq!(app.coordinator().current_page(), Some(Route::Positions));

    let mut views = app.positions().subscribe();
    let view = timeout(Duration::from_secs(5), views.wait_for(|view| view.fetched_at.is_some()))
        .await
        .expect("positions should load")
        .expect("page task alive")
        .clone();
    assert_eq!(view.body.rows.len(), 1);

    let rendered = output(app.execute(Command::Show));
    assert!(rendered.contains("rb2505"));

    assert_ok!(app.shutdown_and_wait().await);
}

#[tokio::test]
async fn test_refresh_settings_commands() {
    let server = mock_api().await;
    let app = start_app(&server, "/dashboard");

    let status = output(app.execute(Command::Interval(30_000)));
    assert!(status.contains("interval: 30s"), "{status}");
    assert!(app.coordinator().is_armed());

    let status = output(app.execute(Command::Disable));
    assert!(status.contains("auto refresh: off"), "{status}");
    assert!(!app.coordinator().is_armed());

    output(app.execute(Command::Enable));
    output(app.execute(Command::Interval(0)));
    assert!(!app.coordinator().is_armed());
    assert_eq!(app.coordinator().config().interval_ms, 0);

    let presets = output(app.execute(Command::Presets));
    assert_eq!(presets.lines().count(), 13);

    assert_ok!(app.shutdown_and_wait().await);
}

#[tokio::test]
async fn test_navigation_and_accounts() {
    let server = mock_api().await;
    let app = start_app(&server, "/dashboard");

    assert_eq!(output(app.execute(Command::Page(Route::Settings))), "page /settings");
    assert_eq!(app.coordinator().current_page(), Some(Route::Settings));
    assert_eq!(output(app.execute(Command::Show)), "/settings has no live data");

    let unchanged = output(app.execute(Command::Accounts(vec!["acct-1".to_string()])));
    assert_eq!(unchanged, "accounts unchanged");

    let cleared = output(app.execute(Command::Accounts(Vec::new())));
    assert_eq!(cleared, "accounts cleared");

    assert_eq!(app.execute(Command::Quit), CommandOutcome::Quit);
    assert_ok!(app.shutdown_and_wait().await);
}

#[tokio::test]
async fn test_shutdown_stops_timer_and_pages() {
    let server = mock_api().await;
    let app = start_app(&server, "/dashboard");
    let coordinator = app.coordinator().clone();
    let token = app.shutdown_token();

    assert_ok!(app.shutdown_and_wait().await);
    assert!(token.is_cancelled());
    assert!(!coordinator.is_armed());

    // Config changes after shutdown persist but never re-arm.
    coordinator.set_interval_ms(1_000);
    assert!(!coordinator.is_armed());
    for route in valar_refresh::RefreshRoute::ALL {
        assert!(!coordinator.registry().is_registered(route));
    }
}

//! Behavioural tests for initial server provisioning.

mod support {
    #[path = "../support/runtime.rs"]
    pub mod runtime;
}

use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use secrecy::SecretString;
use serde_json::json;
use wikifeat_admin::couch::test_support::FakeCouch;
use wikifeat_admin::setup::{MasterUser, SetupOptions, SetupOutcome, SetupReport, run_setup};
use wikifeat_admin::AdminError;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::runtime::{SharedRuntime, connect_to, ensure_runtime_and_server};

#[derive(ScenarioState, Default)]
struct SetupState {
    couch: Slot<FakeCouch>,
    runtime: Slot<SharedRuntime>,
    server: Slot<MockServer>,
    master: Slot<MasterUser>,
    report: Slot<SetupReport>,
    error: Slot<AdminError>,
}

#[fixture]
fn setup_state() -> SetupState {
    SetupState::default()
}

fn options(setup_state: &SetupState) -> SetupOptions {
    SetupOptions {
        main_database: "wikifeat_main_db".to_owned(),
        avatar_database: "user_avatars".to_owned(),
        master: setup_state.master.get(),
    }
}

fn record(setup_state: &SetupState, result: Result<SetupReport, AdminError>) {
    match result {
        Ok(report) => setup_state.report.set(report),
        Err(error) => setup_state.error.set(error),
    }
}

// --- Given steps ---

#[given("an empty CouchDB server")]
fn empty_server(setup_state: &SetupState) {
    setup_state.couch.set(FakeCouch::with_databases(&["_users"]));
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a master user {name}")]
fn master_user(setup_state: &SetupState, name: String) {
    let master = MasterUser::new(
        name.trim_matches('"'),
        SecretString::from("changeme"),
        "Alice",
        "Admin",
    )
    .expect("master user should be valid");
    setup_state.master.set(master);
}

#[given("a CouchDB server that rejects the admin credentials")]
fn rejecting_server(setup_state: &SetupState) {
    let runtime = ensure_runtime_and_server(&setup_state.runtime, &setup_state.server)
        .expect("runtime and server should start");
    let rejection = Mock::given(method("PUT")).respond_with(
        ResponseTemplate::new(401)
            .set_body_json(json!({"error": "unauthorized", "reason": "You are not a server admin."})),
    );
    setup_state
        .server
        .with_ref(|server| runtime.mount_all(server, vec![rejection]))
        .expect("mock server not initialised");
}

// --- When steps ---

#[when("setup runs")]
fn setup_runs(setup_state: &SetupState) {
    let setup_options = options(setup_state);
    let result = setup_state
        .couch
        .with_ref(|couch| run_setup(couch, &setup_options))
        .expect("server not initialised");
    record(setup_state, result);
}

#[when("setup runs over HTTP")]
fn setup_runs_over_http(setup_state: &SetupState) {
    let setup_options = options(setup_state);
    let result = setup_state
        .server
        .with_ref(|server| {
            let connection = connect_to(server)?;
            run_setup(&connection, &setup_options)
        })
        .expect("mock server not initialised");
    record(setup_state, result);
}

// --- Then steps ---

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("{subject} is reported as {outcome}")]
fn reported_as(setup_state: &SetupState, subject: String, outcome: String) {
    let subject_name = subject.trim_matches('"');
    let actual = setup_state
        .report
        .with_ref(|report| report.outcome(subject_name).map(SetupOutcome::to_string))
        .expect("setup has not completed");

    assert_eq!(actual.as_deref(), Some(outcome.trim_matches('"')), "{subject_name}");
}

#[then("no operation failed")]
fn no_operation_failed(setup_state: &SetupState) {
    let failures = setup_state
        .report
        .with_ref(SetupReport::failures)
        .expect("setup has not completed");

    assert_eq!(failures, 0);
}

#[then("setup aborts with status {status:u16}")]
fn setup_aborts(setup_state: &SetupState, status: u16) {
    let error = setup_state
        .error
        .with_ref(Clone::clone)
        .expect("expected setup to abort");

    assert!(
        matches!(&error, AdminError::Api { status: actual, .. } if *actual == status),
        "expected Api error with status {status}, got {error:?}"
    );
}

#[scenario(path = "tests/features/initial_setup.feature", index = 0)]
fn setup_provisions_an_empty_server(setup_state: SetupState) {
    let _ = setup_state;
}

#[scenario(path = "tests/features/initial_setup.feature", index = 1)]
fn second_setup_reports_existing_resources(setup_state: SetupState) {
    let _ = setup_state;
}

#[scenario(path = "tests/features/initial_setup.feature", index = 2)]
fn unauthorised_server_aborts_setup(setup_state: SetupState) {
    let _ = setup_state;
}

//! Tests for positional extraction and invocation parsing in the CLI
//! entrypoint.

use std::ffi::OsString;

use rstest::rstest;
use wikifeat_admin::{AdminError, OperationMode};

use super::{Invocation, extract_positionals, parse_invocation, run};

/// Helper to build an `OsString` argument vector from string slices.
fn args(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[rstest]
#[case::bare_positionals(
    &["wikifeat-admin", "setup", "localhost", "5984"],
    &["setup", "localhost", "5984"],
    &["wikifeat-admin"],
)]
#[case::skips_value_of_preceding_flag(
    &["wikifeat-admin", "--admin-user", "admin", "migrate", "db", "5984"],
    &["migrate", "db", "5984"],
    &["wikifeat-admin", "--admin-user", "admin"],
)]
#[case::skips_value_of_short_flag(
    &["wikifeat-admin", "setup", "-p", "secret", "db", "5984"],
    &["setup", "db", "5984"],
    &["wikifeat-admin", "-p", "secret"],
)]
#[case::equals_syntax_does_not_skip_value(
    &["wikifeat-admin", "--main-db=site", "setup", "db", "5984"],
    &["setup", "db", "5984"],
    &["wikifeat-admin", "--main-db=site"],
)]
#[case::boolean_flag_does_not_consume_value(
    &["wikifeat-admin", "--skip-master", "setup", "db", "5984"],
    &["setup", "db", "5984"],
    &["wikifeat-admin", "--skip-master"],
)]
#[case::double_dash_treats_remainder_as_positional(
    &["wikifeat-admin", "--use-ssl", "--", "migrate", "db", "6984"],
    &["migrate", "db", "6984"],
    &["wikifeat-admin", "--use-ssl"],
)]
#[case::flags_after_positionals(
    &["wikifeat-admin", "migrate", "db", "5984", "--from-version", "0.3a", "--skip-shared"],
    &["migrate", "db", "5984"],
    &["wikifeat-admin", "--from-version", "0.3a", "--skip-shared"],
)]
fn extracts_positionals_correctly(
    #[case] input: &[&str],
    #[case] expected_positionals: &[&str],
    #[case] expected_remaining: &[&str],
) {
    let (positionals, remaining) = extract_positionals(args(input));

    assert_eq!(positionals, words(expected_positionals), "unexpected positionals");
    assert_eq!(
        remaining,
        args(expected_remaining),
        "unexpected remaining args"
    );
}

#[test]
fn empty_args_yield_no_positionals() {
    let (positionals, remaining) = extract_positionals(args(&["wikifeat-admin"]));

    assert!(positionals.is_empty(), "no positional with only program name");
    assert_eq!(remaining, args(&["wikifeat-admin"]));
}

#[test]
fn parses_a_complete_invocation() {
    let invocation = parse_invocation(words(&["install", "couch.local", "5984"]))
        .expect("invocation should parse");

    assert_eq!(
        invocation,
        Invocation {
            mode: OperationMode::Install,
            host: "couch.local".to_owned(),
            port: 5984,
        }
    );
}

#[test]
fn missing_command_is_reported() {
    assert_eq!(parse_invocation(Vec::new()), Err(AdminError::MissingCommand));
}

#[rstest]
#[case::unknown_command(&["upgrade", "db", "5984"], "unknown command")]
#[case::missing_host(&["setup"], "host is required")]
#[case::missing_port(&["setup", "db"], "port is required")]
#[case::bad_port(&["setup", "db", "couch"], "invalid CouchDB port")]
#[case::extra_word(&["setup", "db", "5984", "extra"], "unexpected argument 'extra'")]
fn invalid_invocations_are_configuration_errors(#[case] input: &[&str], #[case] expected: &str) {
    let result = parse_invocation(words(input));

    assert!(
        matches!(&result, Err(AdminError::Configuration { message }) if message.contains(expected)),
        "expected configuration error containing {expected:?}, got {result:?}"
    );
}

/// Exercises the CLI → config → credentials pipeline without a server:
/// setup stops before connecting when the admin password is missing.
#[test]
fn run_reports_missing_credentials_before_connecting() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();
    let _guard = env_lock::lock_env([
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
        ("WIKIFEAT_ADMIN_ADMIN_PASSWORD", None),
    ]);

    let result = run(args(&[
        "wikifeat-admin",
        "setup",
        "127.0.0.1",
        "5984",
        "-u",
        "admin",
        "--skip-master",
    ]));

    assert!(
        matches!(
            result,
            Err(AdminError::MissingCredential {
                flag: "--admin-password",
                ..
            })
        ),
        "expected missing admin password, got {result:?}"
    );
}

#[test]
fn migrate_requires_the_current_schema_version() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();
    let _guard = env_lock::lock_env([
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
        ("WIKIFEAT_ADMIN_FROM_VERSION", None),
    ]);

    let result = run(args(&[
        "wikifeat-admin",
        "migrate",
        "127.0.0.1",
        "9",
        "-u",
        "admin",
        "-p",
        "secret",
    ]));

    assert!(
        matches!(
            result,
            Err(AdminError::MissingCredential {
                flag: "--from-version",
                ..
            })
        ),
        "expected missing --from-version, got {result:?}"
    );
}

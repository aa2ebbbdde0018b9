//! Wikifeat administration CLI entrypoint.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;
use wikifeat_admin::config::parse_port;
use wikifeat_admin::{AdminError, OperationMode, ServerAddress, WikifeatAdminConfig};

mod cli;

/// Flags that take a separate value argument.
///
/// The value after one of these is never treated as a positional.
const VALUE_FLAGS: &[&str] = &[
    "--admin-user",
    "-u",
    "--admin-password",
    "-p",
    "--main-db",
    "--avatar-db",
    "--master-username",
    "--master-password",
    "--master-firstname",
    "--master-lastname",
    "--wikifeat-home",
    "--domain-name",
    "--from-version",
    "--to-version",
    "--request-timeout-seconds",
];

/// Command, host and port taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    mode: OperationMode,
    host: String,
    port: u16,
}

fn main() -> ExitCode {
    init_tracing();
    match run(std::env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ignored = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: Vec<OsString>) -> Result<(), AdminError> {
    let (positionals, filtered) = extract_positionals(args);
    let invocation = parse_invocation(positionals)?;
    let config = load_config(filtered)?;
    config.validate()?;

    let address = ServerAddress::new(invocation.host, invocation.port, config.use_ssl);
    tracing::info!("running {}", invocation.mode);
    match invocation.mode {
        OperationMode::Setup => cli::setup::run(&config, &address),
        OperationMode::Configure => cli::configure::run(&config, &address),
        OperationMode::Install => cli::install(&config, &address),
        OperationMode::Migrate => cli::migrate::run(&config, &address),
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`AdminError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config(args: Vec<OsString>) -> Result<WikifeatAdminConfig, AdminError> {
    WikifeatAdminConfig::load_from_iter(args).map_err(|error| AdminError::Configuration {
        message: error.to_string(),
    })
}

/// Interprets the positional words as `<command> <host> <port>`.
fn parse_invocation(positionals: Vec<String>) -> Result<Invocation, AdminError> {
    let mut words = positionals.into_iter();
    let mode = words
        .next()
        .ok_or(AdminError::MissingCommand)?
        .parse::<OperationMode>()?;
    let host = words.next().ok_or_else(|| AdminError::Configuration {
        message: "CouchDB host is required".to_owned(),
    })?;
    let port_word = words.next().ok_or_else(|| AdminError::Configuration {
        message: "CouchDB port is required".to_owned(),
    })?;
    if let Some(extra) = words.next() {
        return Err(AdminError::Configuration {
            message: format!("unexpected argument '{extra}'"),
        });
    }
    Ok(Invocation {
        mode,
        host,
        port: parse_port(&port_word)?,
    })
}

/// Splits positional words from flags.
///
/// The program name stays first in the returned argument list. Values of
/// [`VALUE_FLAGS`] are kept with their flag, `--flag=value` is a single
/// argument, and everything after `--` is positional.
fn extract_positionals(args: Vec<OsString>) -> (Vec<String>, Vec<OsString>) {
    let mut positionals = Vec::new();
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    if let Some(program) = iter.next() {
        remaining.push(program);
    }

    let mut expecting_value = false;
    let mut after_separator = false;
    for arg in iter {
        if after_separator {
            positionals.push(arg.to_string_lossy().into_owned());
            continue;
        }
        if expecting_value {
            expecting_value = false;
            remaining.push(arg);
            continue;
        }
        let text = arg.to_string_lossy();
        if text == "--" {
            after_separator = true;
            continue;
        }
        if text.starts_with('-') && text.len() > 1 {
            expecting_value = VALUE_FLAGS.contains(&&*text);
            remaining.push(arg);
            continue;
        }
        positionals.push(text.into_owned());
    }

    (positionals, remaining)
}

#[cfg(test)]
mod tests;

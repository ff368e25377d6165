#![cfg(unix)]

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::fs;

use clap::Parser;
use proctrack::cli::CliArgs;
use proctrack::run;

fn args(extra: &[&str], config: &std::path::Path) -> CliArgs {
    let config = config.to_string_lossy().into_owned();
    let mut argv = vec!["proctrack", "--config", config.as_str()];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("valid arguments")
}

#[tokio::test]
async fn exit_code_reflects_outcome() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Proctrack.toml");
    fs::write(&config, "")?;

    assert_eq!(with_timeout(run(args(&["--shell", "--", ":"], &config))).await?, 0);
    assert_eq!(with_timeout(run(args(&["--shell", "--", "exit", "3"], &config))).await?, 3);
    assert_eq!(
        with_timeout(run(args(&["--shell", "--success-code", "3", "--", "exit", "3"], &config)))
            .await?,
        0
    );
    assert_eq!(
        with_timeout(run(args(&["--timeout", "50ms", "--", "sleep", "5"], &config))).await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn output_can_be_sent_to_a_file() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Proctrack.toml");
    fs::write(&config, "")?;
    let out = dir.path().join("out.txt");
    let out_arg = out.to_string_lossy().into_owned();

    let code = with_timeout(run(args(
        &["--stdout", out_arg.as_str(), "--env", "GREETING=hi", "--", "sh", "-c", "echo $GREETING"],
        &config,
    )))
    .await?;

    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&out)?, "hi\n");
    Ok(())
}

#[tokio::test]
async fn missing_program_is_reported_as_an_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Proctrack.toml");
    fs::write(&config, "")?;

    let outcome = with_timeout(run(args(&["--", "nonexistent-command-for-proctrack-tests"], &config))).await;
    assert!(outcome.is_err());
    Ok(())
}

#[tokio::test]
async fn timeout_is_honoured_when_the_command_leaves_children_behind() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Proctrack.toml");
    fs::write(&config, "")?;

    let started = std::time::Instant::now();
    let code = with_timeout(run(args(
        &["--timeout", "100ms", "--", "sh", "-c", "sleep 3; true"],
        &config,
    )))
    .await?;

    assert_eq!(code, 1);
    assert!(
        started.elapsed() < std::time::Duration::from_secs(2),
        "took {:?}",
        started.elapsed()
    );
    Ok(())
}

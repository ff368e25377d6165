#![cfg(unix)]

mod common;
use crate::common::builders::{direct_launcher, shell_launcher};
use crate::common::recording::RecordingHandler;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use tokio::sync::Notify;

use proctrack::{ExecutionRecord, ProctrackError, Status};

#[tokio::test]
async fn handlers_fire_for_each_reached_status() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let all = RecordingHandler::new();
    let mut builder = launcher.command(":")?;
    for status in Status::ALL {
        builder = builder.handler(status, all.clone());
    }
    let record = with_timeout(launcher.execute(builder.build())).await?;

    assert_eq!(record.status(), Status::Succeeded);
    assert_eq!(
        all.seen(),
        vec![Status::Ready, Status::Running, Status::Succeeded]
    );
    Ok(())
}

#[tokio::test]
async fn failing_handler_does_not_stop_the_next_one() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let first = RecordingHandler::failing("first handler broke");
    let second = RecordingHandler::new();
    let request = launcher
        .command(":")?
        .handler(Status::Succeeded, first.clone())
        .handler(Status::Succeeded, second.clone())
        .build();

    let err = with_timeout(launcher.execute(request))
        .await
        .expect_err("handler failure should surface");

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    match err {
        ProctrackError::EventHandling(e) => {
            assert_eq!(e.failures(), 1);
            assert!(e.last().to_string().contains("first handler broke"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn latest_handler_failure_is_the_one_reported() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let request = launcher
        .command(":")?
        .on_running(|_| bail!("running broke"))
        .on_succeeded(|_| bail!("succeeded broke"))
        .build();

    match with_timeout(launcher.execute(request)).await {
        Err(ProctrackError::EventHandling(e)) => {
            assert!(e.last().to_string().contains("succeeded broke"))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn failing_ready_handler_prevents_launch() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let running = RecordingHandler::new();
    let done = RecordingHandler::new();
    let request = launcher
        .command(":")?
        .on_ready(|_| bail!("not today"))
        .handler(Status::Running, running.clone())
        .done_handler(done.clone())
        .build();

    let err = with_timeout(launcher.execute(request))
        .await
        .expect_err("ready handler failure should abort");

    assert!(matches!(err, ProctrackError::EventHandling(_)));
    assert_eq!(running.calls(), 0);
    assert_eq!(done.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn done_handlers_run_once_for_every_outcome() -> TestResult {
    init_tracing();
    let shell = shell_launcher();
    let direct = direct_launcher();

    let cases = [
        (&shell, shell.command(":")?, Status::Succeeded),
        (&shell, shell.command("exit")?.option("4"), Status::Failed),
        (&direct, direct.command("sleep")?.option("5").timeout_millis(20), Status::Cancelled),
    ];

    for (launcher, builder, expected) in cases {
        let done = RecordingHandler::new();
        let request = builder.done_handler(done.clone()).build();
        let record = with_timeout(launcher.execute(request)).await?;
        assert_eq!(record.status(), expected);
        assert_eq!(done.seen(), vec![expected]);
    }

    let done = RecordingHandler::new();
    let request = direct
        .command("nonexistent-command-for-proctrack-tests")?
        .done_handler(done.clone())
        .build();
    assert!(with_timeout(direct.execute(request)).await.is_err());
    assert_eq!(done.seen(), vec![Status::Error]);
    Ok(())
}

#[tokio::test]
async fn observers_see_every_transition() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let observer = RecordingHandler::new();
    let request = launcher.command("exit")?.option("2").observer(observer.clone()).build();
    let record = with_timeout(launcher.execute(request)).await?;

    assert_eq!(record.status(), Status::Failed);
    assert_eq!(
        observer.seen(),
        vec![Status::Ready, Status::Running, Status::Failed]
    );
    Ok(())
}

#[tokio::test]
async fn async_request_returns_ready_record_and_completes_later() -> TestResult {
    init_tracing();
    let launcher = shell_launcher();

    let finished = Arc::new(Notify::new());
    let signal = Arc::clone(&finished);
    let exit_codes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&exit_codes);

    let request = launcher
        .command("exit")?
        .option("0")
        .async_mode(true)
        .on_done(move |record: &ExecutionRecord| {
            sink.lock().unwrap().push(record.exit_code());
            signal.notify_one();
            Ok(())
        })
        .build();

    let record = launcher.execute(request).await?;
    assert_eq!(record.status(), Status::Ready);

    with_timeout(finished.notified()).await;
    assert_eq!(record.status(), Status::Succeeded);
    assert_eq!(*exit_codes.lock().unwrap(), vec![Some(0)]);
    Ok(())
}

#[tokio::test]
async fn async_launch_failure_is_visible_on_the_record() -> TestResult {
    init_tracing();
    let launcher = direct_launcher();

    let finished = Arc::new(Notify::new());
    let signal = Arc::clone(&finished);
    let request = launcher
        .command("nonexistent-command-for-proctrack-tests")?
        .async_mode(true)
        .on_done(move |_| {
            signal.notify_one();
            Ok(())
        })
        .build();

    let record = launcher.execute(request).await?;
    with_timeout(finished.notified()).await;

    assert_eq!(record.status(), Status::Error);
    assert!(record.thrown().is_some());
    Ok(())
}

#[tokio::test]
async fn running_handler_can_read_child_output() -> TestResult {
    init_tracing();
    let launcher = direct_launcher();

    let output = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&output);
    let request = launcher
        .command("echo")?
        .option("hello from child")
        .on_running(move |record| {
            let stdout = record.take_stdout();
            *slot.lock().unwrap() = Some(tokio::spawn(async move {
                let mut text = String::new();
                if let Some(mut stdout) = stdout {
                    tokio::io::AsyncReadExt::read_to_string(&mut stdout, &mut text).await?;
                }
                Ok::<_, std::io::Error>(text)
            }));
            Ok(())
        })
        .build();

    let record = with_timeout(launcher.execute(request)).await?;
    assert_eq!(record.status(), Status::Succeeded);

    let reader = output.lock().unwrap().take().expect("running handler ran");
    let text = with_timeout(reader).await??;
    assert_eq!(text.trim(), "hello from child");
    Ok(())
}

#[tokio::test]
async fn dropped_execute_future_still_finishes_the_execution() -> TestResult {
    init_tracing();
    let launcher = direct_launcher();

    let observer = RecordingHandler::new();
    let done = RecordingHandler::new();
    let finished = Arc::new(Notify::new());
    let signal = Arc::clone(&finished);
    let request = launcher
        .command("sleep")?
        .option("1")
        .observer(observer.clone())
        .done_handler(done.clone())
        .on_done(move |_| {
            signal.notify_one();
            Ok(())
        })
        .build();

    let abandoned = tokio::time::timeout(Duration::from_millis(200), launcher.execute(request)).await;
    assert!(abandoned.is_err(), "sleep should outlive the caller's deadline");

    with_timeout(finished.notified()).await;
    assert_eq!(
        observer.seen(),
        vec![Status::Ready, Status::Running, Status::Succeeded]
    );
    assert_eq!(done.seen(), vec![Status::Succeeded]);
    Ok(())
}

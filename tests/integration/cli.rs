// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Smoke tests for the `rotalogd` binary.

use anyhow::Result;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;

use super::tests::{lines_in, message_of};

/// Lines piped to stdin end up in their level directories once stdin closes.
#[tokio::test]
async fn test_stdin_lines_are_logged() -> Result<()> {
    let tmp = tempfile::tempdir()?;

    let mut child = TokioCommand::new(env!("CARGO_BIN_EXE_rotalogd"))
        .arg("--dir")
        .arg(tmp.path())
        .arg("--level")
        .arg("debug")
        .arg("--workers")
        .arg("1")
        .stdin(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin is piped");
    stdin
        .write_all(b"error disk full\nwarn low memory\nplain message\n\ntrace too chatty\n")
        .await?;
    drop(stdin);

    let status = child.wait().await?;
    assert!(status.success());

    let error = lines_in(&tmp.path().join("error"));
    assert_eq!(error.len(), 1);
    assert_eq!(message_of(&error[0]), "disk full");

    let warning = lines_in(&tmp.path().join("warning"));
    assert_eq!(message_of(&warning[0]), "low memory");

    let info = lines_in(&tmp.path().join("info"));
    assert_eq!(info.len(), 1);
    assert_eq!(message_of(&info[0]), "plain message");

    assert!(!tmp.path().join("trace").exists());
    Ok(())
}

#[tokio::test]
async fn test_bad_config_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = tmp.path().join("broken.json5");
    std::fs::write(&config, "{ level: ")?;

    let output = TokioCommand::new(env!("CARGO_BIN_EXE_rotalogd"))
        .arg("--config")
        .arg(&config)
        .stdin(Stdio::null())
        .output()
        .await?;
    assert!(!output.status.success());
    Ok(())
}

//! Running external engines as subprocesses.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{program} was not found in PATH")]
    NotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {seconds} seconds")]
    TimedOut { program: String, seconds: u64 },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Run `program` to completion, feeding `stdin` when given.
///
/// A non-zero exit status is an error carrying the trimmed stderr. The timeout
/// covers feeding stdin as well as collecting output; on timeout the child is
/// killed when its handle is dropped.
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    stdin: Option<&[u8]>,
    timeout_secs: u64,
) -> Result<Output, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => CommandError::NotFound {
                program: program.to_string(),
            },
            _ => CommandError::Io {
                program: program.to_string(),
                source,
            },
        })?;

    // Stdin is fed from its own task while the output is drained, so a child
    // that fills its stdout pipe before reading all input cannot deadlock.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_vec();
            Some(tokio::spawn(async move {
                let written = pipe.write_all(&input).await;
                drop(pipe);
                written
            }))
        }
        _ => None,
    };

    let run = async move {
        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The child may exit without consuming its input; its exit status decides.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(std::io::Error::other(e)),
            }
        }
        Ok(output)
    };

    let output = match timeout(Duration::from_secs(timeout_secs), run).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Io {
                program: program.to_string(),
                source,
            });
        }
        Err(_) => {
            return Err(CommandError::TimedOut {
                program: program.to_string(),
                seconds: timeout_secs,
            });
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// `true` when `program --version` can be executed.
pub async fn is_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok()
}

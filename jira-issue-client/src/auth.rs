use std::{
    io::Read,
    process::{Command, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jira_issue_config::Authentication;
use tracing::debug;

use crate::error::{JiraError, Result};

pub const CREDENTIAL_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Headers for one request: the authorization header of the configured mode, then `accept`.
pub fn build_headers(authentication: &Authentication) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::with_capacity(2);

    match authentication {
        Authentication::Open => {}
        Authentication::Basic { username, password } => headers.push((
            "Authorization".to_string(),
            format!("Basic {}", basic_credentials(username, password)),
        )),
        Authentication::BearerToken { header_name, token } => {
            headers.push((header_name.clone(), format!("Bearer {token}")))
        }
        Authentication::Custom {
            header_name,
            command,
        } => headers.push((
            header_name.clone(),
            run_credential_command(command, CREDENTIAL_COMMAND_TIMEOUT)?,
        )),
    }

    headers.push(("accept".to_string(), "*/*".to_string()));
    Ok(headers)
}

fn basic_credentials(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// Runs `command` without a shell and returns its stdout minus trailing line terminators.
pub fn run_credential_command(command: &str, timeout: Duration) -> Result<String> {
    let parts = shlex::split(command.trim())
        .ok_or_else(|| JiraError::CredentialCommand("unbalanced quotes in command".to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Err(JiraError::CredentialCommand("command is empty".to_string()));
    };

    debug!(program = %program, "running credential command");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|error| {
            JiraError::CredentialCommand(format!("failed to start '{program}': {error}"))
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| JiraError::CredentialCommand("stdout was not captured".to_string()))?;
    let (output_tx, output_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = output_tx.send(stdout.read_to_end(&mut buffer).map(|_| buffer));
    });

    // One deadline covers both the exit and the end of stdout.
    let deadline = Instant::now() + timeout;
    let timed_out = || {
        JiraError::CredentialCommand(format!(
            "'{program}' timed out after {}s",
            timeout.as_secs_f32()
        ))
    };

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(timed_out());
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(error) => {
                return Err(JiraError::CredentialCommand(format!(
                    "failed to wait for '{program}': {error}"
                )))
            }
        }
    };

    if !status.success() {
        return Err(JiraError::CredentialCommand(format!(
            "'{program}' exited with {status}"
        )));
    }

    let output = match output_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(read) => read.map_err(|error| {
            JiraError::CredentialCommand(format!("failed to read output of '{program}': {error}"))
        })?,
        Err(RecvTimeoutError::Timeout) => return Err(timed_out()),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(JiraError::CredentialCommand(
                "stdout reader stopped unexpectedly".to_string(),
            ))
        }
    };
    let output = String::from_utf8(output).map_err(|_| {
        JiraError::CredentialCommand(format!("'{program}' printed non UTF-8 output"))
    })?;

    let value = output.trim_end_matches(['\r', '\n']);
    if value.trim().is_empty() {
        return Err(JiraError::CredentialCommand(format!(
            "'{program}' printed nothing"
        )));
    }
    Ok(value.to_string())
}

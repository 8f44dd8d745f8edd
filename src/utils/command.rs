//! External command execution for collaborator processes.
//!
//! The document renderer is an external program (`[build.renderer]` in
//! `weft.toml`); an item's body is piped to its stdin and the rendered output
//! read back from stdout.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

/// Run `cmd` with `input` piped to stdin, capturing stdout.
///
/// # Errors
/// Returns an error if the command cannot be spawned or exits non-zero.
pub fn run_with_input(cmd: &[String], input: &str, root: Option<&Path>) -> Result<Output> {
    let name = cmd.first().map(String::as_str).context("Empty command")?;

    let mut command = Command::new(name);
    command
        .args(&cmd[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = root {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn `{name}`"))?;

    child
        .stdin
        .take()
        .context("Failed to acquire stdin")?
        .write_all(input.as_bytes())
        .with_context(|| format!("Failed to write input to `{name}`"))?;

    let output = child
        .wait_with_output()
        .with_context(|| format!("`{name}` process failed"))?;

    report(name, &output)?;
    Ok(output)
}

/// Check the exit status; surface stderr warnings through the logger.
fn report(name: &str, output: &Output) -> Result<()> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if !output.status.success() {
        if stderr.is_empty() {
            bail!("Command `{name}` failed with {}", output.status);
        }
        bail!("Command `{name}` failed with {}\n{stderr}", output.status);
    }

    if !stderr.is_empty() {
        log!(name; "{stderr}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_run_with_input_pipes_stdin_to_stdout() {
        let output = run_with_input(&cmd(&["cat"]), "hello world", None).unwrap();
        assert_eq!(output.stdout, b"hello world");
    }

    #[test]
    fn test_run_with_input_nonzero_exit_is_error() {
        assert!(run_with_input(&cmd(&["false"]), "", None).is_err());
    }

    #[test]
    fn test_empty_command_is_error() {
        assert!(run_with_input(&[], "", None).is_err());
    }

    #[test]
    fn test_missing_binary_is_error() {
        let result = run_with_input(&cmd(&["definitely-not-a-real-binary-weft"]), "", None);
        assert!(result.is_err());
    }
}

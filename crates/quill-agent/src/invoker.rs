use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::{CliResponse, InvokeOptions, Invocation};
use crate::{AgentError, Result};

// ─── Invocation ───────────────────────────────────────────────────────────

/// Run one generation against the external AI CLI.
///
/// Spawns the tool, writes `prompt` to its stdin, closes stdin, buffers
/// stdout and stderr fully, waits for exit, then parses stdout as a single
/// JSON response document. There is no retry and no timeout at this layer;
/// a hung subprocess hangs the caller.
pub async fn invoke(prompt: &str, opts: &InvokeOptions) -> Result<Invocation> {
    let cmd = build_command(opts);
    run_command(cmd, prompt, &opts.binary).await
}

/// Check whether the configured binary resolves on PATH.
pub fn binary_available(opts: &InvokeOptions) -> bool {
    which::which(&opts.binary).is_ok()
}

async fn run_command(mut cmd: Command, prompt: &str, binary: &str) -> Result<Invocation> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| AgentError::Spawn {
        binary: binary.to_string(),
        source,
    })?;

    // Send the prompt and close stdin so the tool runs single-shot.
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(prompt.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let output = child.wait_with_output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let code = output.status.code().unwrap_or(-1);
        tracing::warn!(code, "AI CLI exited abnormally");
        return Err(AgentError::Exit { code, stderr });
    }

    let response: CliResponse =
        serde_json::from_str(stdout.trim()).map_err(|source| AgentError::Parse {
            raw: stdout.clone(),
            source,
        })?;

    if response.is_error {
        return Err(AgentError::Upstream(response.result));
    }

    Ok(Invocation {
        result: response.result,
        usage: response.usage,
    })
}

// ─── Command builder ──────────────────────────────────────────────────────

fn build_command(opts: &InvokeOptions) -> Command {
    let mut cmd = Command::new(&opts.binary);

    // Single-shot JSON protocol: the tool prints one response document and exits.
    cmd.arg("--print").arg("--output-format").arg("json");

    if let Some(model) = &opts.model {
        cmd.arg("--model").arg(model);
    }

    if let Some(sp) = &opts.system_prompt {
        cmd.arg("--system-prompt").arg(sp);
    }

    cmd.args(&opts.extra_args);

    for (k, v) in &opts.env {
        cmd.env(k, v);
    }

    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }

    // NOTE: prompt is NOT a positional arg — it's sent via stdin

    cmd
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an `sh -c` command so tests can fake arbitrary CLI behaviour.
    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn exit_zero_with_valid_json_resolves_result() {
        let cmd = sh(r#"cat >/dev/null; echo '{"is_error":false,"result":"abc"}'"#);
        let inv = run_command(cmd, "ignored prompt", "sh").await.unwrap();
        assert_eq!(inv.result, "abc");
        assert!(inv.usage.is_none());
    }

    #[tokio::test]
    async fn usage_counters_are_surfaced() {
        let cmd = sh(
            r#"cat >/dev/null; echo '{"is_error":false,"result":"x","usage":{"input_tokens":7,"output_tokens":3}}'"#,
        );
        let inv = run_command(cmd, "p", "sh").await.unwrap();
        let usage = inv.usage.expect("usage present");
        assert_eq!(usage.input_tokens, 7);
        assert_eq!(usage.output_tokens, 3);
    }

    #[tokio::test]
    async fn prompt_is_delivered_on_stdin() {
        // Echo the prompt back through the JSON result field.
        let cmd = sh(r#"p=$(cat); printf '{"is_error":false,"result":"%s"}' "$p""#);
        let inv = run_command(cmd, "hello-stdin", "sh").await.unwrap();
        assert_eq!(inv.result, "hello-stdin");
    }

    #[tokio::test]
    async fn nonzero_exit_rejects_with_stderr() {
        let cmd = sh("cat >/dev/null; echo boom >&2; exit 1");
        let err = run_command(cmd, "p", "sh").await.unwrap_err();
        match err {
            AgentError::Exit { code, stderr } => {
                assert_eq!(code, 1);
                assert!(stderr.contains("boom"), "stderr was: {stderr}");
            }
            other => panic!("expected Exit, got: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_stdout_rejects_with_raw_output() {
        let cmd = sh("cat >/dev/null; echo not-json-at-all");
        let err = run_command(cmd, "p", "sh").await.unwrap_err();
        match err {
            AgentError::Parse { raw, .. } => {
                assert!(raw.contains("not-json-at-all"), "raw was: {raw}");
            }
            other => panic!("expected Parse, got: {other}"),
        }
    }

    #[tokio::test]
    async fn upstream_error_carries_self_reported_message() {
        let cmd = sh(r#"cat >/dev/null; echo '{"is_error":true,"result":"quota exceeded"}'"#);
        let err = run_command(cmd, "p", "sh").await.unwrap_err();
        match err {
            AgentError::Upstream(msg) => assert_eq!(msg, "quota exceeded"),
            other => panic!("expected Upstream, got: {other}"),
        }
    }

    #[tokio::test]
    async fn spawn_failure_names_binary_and_hints_at_path() {
        let opts = InvokeOptions {
            binary: "__quill_no_such_binary__".into(),
            ..Default::default()
        };
        let err = invoke("p", &opts).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("__quill_no_such_binary__"));
        assert!(msg.contains("PATH"));
    }

    #[test]
    fn build_command_includes_model_and_system_prompt() {
        let opts = InvokeOptions {
            model: Some("sonnet".into()),
            system_prompt: Some("You are a novelist.".into()),
            ..Default::default()
        };
        let cmd = build_command(&opts);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"--model".to_string()));
        assert!(args.contains(&"sonnet".to_string()));
        assert!(args.contains(&"--system-prompt".to_string()));
    }

    #[test]
    fn binary_available_false_for_missing_tool() {
        let opts = InvokeOptions {
            binary: "__quill_no_such_binary__".into(),
            ..Default::default()
        };
        assert!(!binary_available(&opts));
    }
}

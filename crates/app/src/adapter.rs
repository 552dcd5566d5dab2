//! Posting adapters driven by an external command
//!
//! The command gets one JSON document on stdin:
//!
//! ```json
//! {
//!   "platform": "reddit",
//!   "item": "launch.md",
//!   "body": "...",
//!   "contentHash": "185f...",
//!   "meta": { "title": "...", ... },
//!   "credentials": { ... },
//!   "profileDir": "/tmp/.../profile"
//! }
//! ```
//!
//! and answers on stdout with `{"success": true, "url": "..."}` (the last
//! non-empty line is parsed). A validation command, if configured, gets the
//! same input and answers `{"valid": false, "errors": [...]}`.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use common::adapter::{PostOptions, PostOutcome, PostingAdapter, Validation};
use common::content::{Frontmatter, VerifiedContent};
use common::workspace::AdapterConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdapterInput<'a> {
    platform: &'a str,
    item: &'a str,
    body: &'a str,
    content_hash: String,
    meta: &'a Frontmatter,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_dir: Option<&'a Path>,
}

#[derive(Debug, Clone)]
pub struct CommandAdapter {
    platform: String,
    config: AdapterConfig,
}

impl CommandAdapter {
    pub fn new(platform: impl Into<String>, config: AdapterConfig) -> Self {
        Self {
            platform: platform.into(),
            config,
        }
    }

    fn input<'a>(
        content: &'a VerifiedContent,
        options: Option<&'a PostOptions>,
    ) -> AdapterInput<'a> {
        AdapterInput {
            platform: content.platform(),
            item: &content.report().item,
            body: content.body(),
            content_hash: content.hash().to_string(),
            meta: content.meta(),
            credentials: options.and_then(|o| o.credentials.as_ref()),
            profile_dir: options.and_then(|o| o.profile_dir.as_deref()),
        }
    }
}

/// Run `command`, feed it `input` as JSON, parse its last stdout line as `T`
fn run<T: DeserializeOwned>(command: &[String], input: &impl Serialize) -> anyhow::Result<T> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("adapter command is empty"))?;

    // may carry decrypted credentials
    let payload = Zeroizing::new(serde_json::to_vec(input)?);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start adapter '{}'", program))?;

    // stdin is fed from its own thread while stdout is drained here, so an
    // adapter that prints before reading cannot stall on a full pipe
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("adapter '{}' has no stdin", program))?;
    let writer = std::thread::spawn(move || stdin.write_all(&payload));

    let output = child.wait_with_output()?;
    match writer.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::debug!(%program, "adapter exited without reading all of its input");
        }
        Ok(Err(e)) => {
            return Err(e).with_context(|| format!("failed to write to adapter '{}'", program))
        }
        Err(_) => bail!("writing input to adapter '{}' panicked", program),
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let last = stdout.lines().rev().find(|l| !l.trim().is_empty());

    match last.map(serde_json::from_str::<T>) {
        Some(Ok(parsed)) => Ok(parsed),
        Some(Err(e)) if output.status.success() => {
            Err(anyhow!("adapter '{}' printed an unreadable result: {}", program, e))
        }
        _ if !output.status.success() => bail!("adapter '{}' exited with {}", program, output.status),
        _ => bail!("adapter '{}' printed no result", program),
    }
}

impl PostingAdapter for CommandAdapter {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn validate(&self, content: &VerifiedContent) -> Validation {
        let Some(command) = &self.config.validate_command else {
            return Validation::ok();
        };
        match run::<Validation>(command, &Self::input(content, None)) {
            Ok(validation) => validation,
            Err(e) => Validation {
                valid: false,
                errors: vec![format!("{:#}", e)],
                warnings: Vec::new(),
            },
        }
    }

    fn post(&self, content: &VerifiedContent, options: &PostOptions) -> anyhow::Result<PostOutcome> {
        tracing::debug!(platform = %self.platform, command = ?self.config.command, "running adapter");
        run(&self.config.command, &Self::input(content, Some(options)))
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn test_run_parses_last_line() {
        let result: PostOutcome = run(
            &sh(r#"cat > /dev/null; echo "progress..."; echo '{"success":true,"url":"https://x/1"}'"#),
            &serde_json::json!({}),
        )
        .unwrap();
        assert!(result.success);
        assert_eq!(result.url.as_deref(), Some("https://x/1"));
    }

    #[test]
    fn test_run_sees_input() {
        let result: PostOutcome = run(
            &sh(r#"grep -q '"body":"Hello"' && echo '{"success":true}' || echo '{"success":false}'"#),
            &serde_json::json!({ "body": "Hello" }),
        )
        .unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_run_chatty_adapter_with_large_input() {
        // prints more than a pipe buffer before it reads anything
        let script = r#"head -c 200000 /dev/zero | tr '\0' 'x'; echo; wc -c > /dev/null; echo '{"success":true}'"#;
        let body = "y".repeat(200_000);
        let result: PostOutcome = run(&sh(script), &serde_json::json!({ "body": body })).unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_run_failures() {
        let err = run::<PostOutcome>(&sh("cat > /dev/null; exit 3"), &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("exited"));

        let err = run::<PostOutcome>(&sh("cat > /dev/null; echo nope"), &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("unreadable"));

        assert!(run::<PostOutcome>(&[], &serde_json::json!({})).is_err());
        assert!(run::<PostOutcome>(&["/nonexistent/adapter".to_string()], &serde_json::json!({})).is_err());
    }
}

//! CloudFormation backend driven through the `aws` CLI
//!
//! Requests are issued as `aws cloudformation ...` invocations with JSON
//! output; status polls are `describe-stacks` calls mapped onto the
//! engine's terminal/in-progress classification. Template and parameter
//! paths are handed to the CLI as `file://` bodies, so the files never
//! need to be parsed here.

use anyhow::{Context, Result, bail};
use conductor::{Action, Backend, Op, Poll};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// Backend implementation that shells out to an installed `aws` CLI.
pub struct AwsCli {
    region: Option<String>,
    profile: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeStacks {
    #[serde(rename = "Stacks")]
    stacks: Vec<StackSummary>,
}

#[derive(Debug, Deserialize)]
struct StackSummary {
    #[serde(rename = "StackId")]
    stack_id: String,
    #[serde(rename = "StackStatus")]
    stack_status: String,
}

#[derive(Debug, Deserialize)]
struct SubmitOutput {
    #[serde(rename = "StackId")]
    stack_id: String,
}

#[derive(Debug, Deserialize)]
struct KeyPairOutput {
    #[serde(rename = "KeyMaterial")]
    key_material: String,
}

struct CliOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

impl AwsCli {
    pub fn new(region: Option<String>, profile: Option<String>) -> Self {
        Self { region, profile }
    }

    fn command(&self, service: &str, operation: &str) -> Command {
        let mut cmd = Command::new("aws");
        cmd.arg(service)
            .arg(operation)
            .args(["--output", "json"]);
        if let Some(region) = &self.region {
            cmd.args(["--region", region]);
        }
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile]);
        }
        cmd
    }

    /// Current state of a stack, or `None` when CloudFormation does not
    /// know it (never created, or delete finished).
    fn describe(&self, stack_name: &str) -> Result<Option<StackSummary>> {
        let mut cmd = self.command("cloudformation", "describe-stacks");
        cmd.args(["--stack-name", stack_name]);

        let out = run(cmd)?;
        if !out.success {
            if is_missing_stack(&out.stderr) {
                return Ok(None);
            }
            bail!(
                "describe-stacks failed for {stack_name}: {}",
                out.stderr.trim()
            );
        }

        let parsed: DescribeStacks = serde_json::from_str(&out.stdout)
            .context("Unexpected describe-stacks output")?;
        Ok(parsed.stacks.into_iter().next())
    }

    fn submit_deploy(&self, op: &Op) -> Result<String> {
        let existing = self.describe(&op.stack_name)?;
        let operation = if existing.is_some() {
            "update-stack"
        } else {
            "create-stack"
        };

        let mut cmd = self.command("cloudformation", operation);
        cmd.args(["--stack-name", &op.stack_name]);
        cmd.arg("--template-body").arg(file_url(&op.template));
        if let Some(params) = &op.parameters {
            cmd.arg("--parameters").arg(file_url(params));
        }
        if !op.capabilities.is_empty() {
            cmd.arg("--capabilities");
            cmd.args(&op.capabilities);
        }

        let out = run(cmd)?;
        if !out.success {
            // A no-op update leaves the stack in its COMPLETE state; the
            // first poll confirms success.
            if is_no_updates(&out.stderr) {
                debug!("{}: no updates to perform", op.stack_name);
                return Ok(existing
                    .map_or_else(|| op.stack_name.clone(), |summary| summary.stack_id));
            }
            bail!(
                "{operation} rejected for {}: {}",
                op.stack_name,
                out.stderr.trim()
            );
        }

        let parsed: SubmitOutput = serde_json::from_str(&out.stdout)
            .with_context(|| format!("Unexpected {operation} output"))?;
        Ok(parsed.stack_id)
    }

    fn submit_delete(&self, op: &Op) -> Result<String> {
        let mut cmd = self.command("cloudformation", "delete-stack");
        cmd.args(["--stack-name", &op.stack_name]);

        let out = run(cmd)?;
        if !out.success {
            bail!(
                "delete-stack rejected for {}: {}",
                op.stack_name,
                out.stderr.trim()
            );
        }
        // delete-stack prints nothing; the stack name is the handle.
        Ok(op.stack_name.clone())
    }

    /// Create an EC2 key pair unless it already exists. Returns the new
    /// private key material for a freshly created pair.
    pub fn ensure_key_pair(&self, name: &str) -> Result<Option<String>> {
        let mut cmd = self.command("ec2", "create-key-pair");
        cmd.args(["--key-name", name]);

        let out = run(cmd)?;
        if !out.success {
            if is_duplicate_key_pair(&out.stderr) {
                return Ok(None);
            }
            bail!("create-key-pair failed for {name}: {}", out.stderr.trim());
        }

        let parsed: KeyPairOutput = serde_json::from_str(&out.stdout)
            .context("Unexpected create-key-pair output")?;
        Ok(Some(parsed.key_material))
    }
}

impl Backend for AwsCli {
    fn submit(&self, op: &Op) -> Result<String> {
        match op.action {
            Action::Deploy => self.submit_deploy(op),
            Action::Delete => self.submit_delete(op),
        }
    }

    fn status(&self, op: &Op, _handle: &str) -> Result<Poll> {
        let summary = self.describe(&op.stack_name)?;
        let status = summary.as_ref().map(|s| s.stack_status.as_str());
        Ok(classify_status(op.action, status))
    }
}

fn run(mut cmd: Command) -> Result<CliOutput> {
    debug!("running {cmd:?}");
    let output = cmd
        .output()
        .context("Failed to execute the aws CLI (is it installed and on PATH?)")?;
    Ok(CliOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
    })
}

/// Map a CloudFormation stack status onto the engine's poll result.
fn classify_status(action: Action, status: Option<&str>) -> Poll {
    match action {
        Action::Deploy => match status {
            None => Poll::Failed("stack no longer exists".to_string()),
            Some("CREATE_COMPLETE" | "UPDATE_COMPLETE") => Poll::Succeeded,
            Some(s) if s.ends_with("_IN_PROGRESS") => Poll::InProgress,
            Some(s) => Poll::Failed(format!("stack entered {s}")),
        },
        Action::Delete => match status {
            None | Some("DELETE_COMPLETE") => Poll::Succeeded,
            Some("DELETE_FAILED") => Poll::Failed("stack entered DELETE_FAILED".to_string()),
            Some(_) => Poll::InProgress,
        },
    }
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn is_missing_stack(stderr: &str) -> bool {
    stderr.contains("does not exist")
}

fn is_no_updates(stderr: &str) -> bool {
    stderr.contains("No updates are to be performed")
}

fn is_duplicate_key_pair(stderr: &str) -> bool {
    stderr.contains("InvalidKeyPair.Duplicate")
}

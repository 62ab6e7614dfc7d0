use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

use super::OcrEngine;
use crate::config::OcrConfig;

/// Runs the `tesseract` binary, streaming the image through stdin/stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(cfg: &OcrConfig) -> Self {
        Self {
            command: cfg.command.clone(),
            language: cfg.language.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    fn args(&self) -> [&str; 4] {
        ["stdin", "stdout", "-l", self.language.as_str()]
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, png: Bytes) -> anyhow::Result<String> {
        debug!(command = %self.command, language = %self.language, "starting tesseract");
        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", self.command))?;

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("tesseract timed out after {:?}", self.timeout))?
            .context("wait for tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "tesseract failed");
            bail!("tesseract exited with {}", output.status);
        }
        writer
            .await
            .context("tesseract stdin writer panicked")?
            .context("write image to tesseract")?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

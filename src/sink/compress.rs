use std::{
    path::Path,
    process::{Command, Stdio},
};

use crate::config::CompressorConfig;

/// An external PNG optimizer such as `optipng` or `oxipng`.
#[derive(Clone, Debug)]
pub struct Compressor {
    command: String,
    args: Vec<String>,
}

impl Compressor {
    /// Wrap `cfg`.
    pub fn new(cfg: &CompressorConfig) -> Self {
        Self {
            command: cfg.command.clone(),
            args: cfg.args.clone(),
        }
    }

    /// Run `command args.. path` and wait for it.
    ///
    /// Returns whether the optimizer succeeded. Failures are logged and otherwise ignored:
    /// the uncompressed file is still a valid card.
    #[tracing::instrument(skip(self), fields(command = %self.command))]
    pub fn run(&self, path: &Path) -> bool {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                tracing::debug!("compressed");
                true
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                tracing::warn!(status = %out.status, stderr = %stderr.trim(), "compressor failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn compressor");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sink/compress.rs"]
mod tests;

use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    config::SftpConfig,
    foundation::error::{LastListenedError, LastListenedResult},
};

/// Whether an `sftp` client is installed.
pub fn is_sftp_on_path() -> bool {
    // `sftp` has no version flag; `-h` prints usage and exits non-zero, so spawning is the test.
    Command::new("sftp")
        .arg("-h")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Upload through the system `sftp` client.
///
/// The client always runs in batch mode, so any failed command fails the upload. With a
/// password it runs under `sshpass -e`; otherwise it relies on keys (`identity_file` or the
/// SSH agent).
#[derive(Clone, Debug)]
pub struct SftpTransfer {
    host: String,
    port: u16,
    username: String,
    password: Option<String>,
    identity_file: Option<PathBuf>,
    remote_path: String,
}

impl SftpTransfer {
    /// Build a transfer from `cfg`. `cfg.send` is not consulted here; see [`deliver`].
    pub fn new(cfg: &SftpConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            identity_file: cfg.identity_file.clone(),
            remote_path: cfg.remote_path.clone(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = match &self.password {
            Some(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.arg("-e").arg("sftp").env("SSHPASS", password);
                // ssh keeps the first value it sees; this must precede `-b`, which
                // otherwise turns password prompts off.
                cmd.args(["-o", "BatchMode=no"]);
                cmd
            }
            None => Command::new("sftp"),
        };

        // Batch mode makes a failed `put` abort with a non-zero exit status.
        cmd.args(["-b", "-"]);
        cmd.arg("-P").arg(self.port.to_string());
        if let Some(identity) = &self.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(format!("{}@{}", self.username, self.host));
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// `put` commands fed to the client on stdin.
    pub fn batch(&self, local: &Path) -> String {
        format!(
            "put {} {}\nbye\n",
            quote(&local.to_string_lossy()),
            quote(&self.remote_path)
        )
    }

    /// Upload `local` to `remote_path`, then delete `local`.
    ///
    /// On failure the local file is left untouched.
    #[tracing::instrument(skip(self), fields(host = %self.host, port = self.port))]
    pub fn send(&self, local: &Path) -> LastListenedResult<()> {
        if !local.is_file() {
            return Err(LastListenedError::transfer(format!(
                "'{}' does not exist",
                local.display()
            )));
        }

        let program = if self.password.is_some() { "sshpass" } else { "sftp" };
        let mut child = self.command().spawn().map_err(|e| {
            LastListenedError::transfer(format!(
                "failed to spawn {program} (is it installed and on PATH?): {e}"
            ))
        })?;

        let batch = self.batch(local);
        let Some(mut stdin) = child.stdin.take() else {
            return Err(LastListenedError::transfer(
                "failed to open sftp stdin (unexpected)",
            ));
        };
        stdin
            .write_all(batch.as_bytes())
            .map_err(|e| LastListenedError::transfer(format!("failed to write to sftp: {e}")))?;
        drop(stdin);

        let output = child.wait_with_output().map_err(|e| {
            LastListenedError::transfer(format!("failed to wait for sftp to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LastListenedError::transfer(format!(
                "sftp exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(remote = %self.remote_path, "uploaded card");
        std::fs::remove_file(local).map_err(|e| {
            LastListenedError::transfer(format!(
                "uploaded but could not remove '{}': {e}",
                local.display()
            ))
        })?;
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.contains([' ', '"', '\'', '\t']) {
        return s.to_owned();
    }
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Upload `path` when `cfg.send` is set. Returns whether an upload happened.
pub fn deliver(path: &Path, cfg: &SftpConfig) -> LastListenedResult<bool> {
    if !cfg.send {
        tracing::debug!(path = %path.display(), "sftp disabled, keeping local file");
        return Ok(false);
    }
    SftpTransfer::new(cfg).send(path)?;
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/sink/transfer.rs"]
mod tests;

//! The dynamic-metadata configure step.

use crate::error::{ExtractError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Working directory for the distribution inside a container.
const CONTAINER_WORKDIR: &str = "/work";

/// Run `perl <script>` in the extracted distribution directory, either on
/// the host or inside a container with the directory mounted read-write.
/// Stdout and stderr are discarded; only the exit code matters.
pub(crate) fn run(dist_dir: &Path, script: &str, container_image: Option<&str>) -> Result<()> {
    let mut command = match container_image {
        Some(image) => {
            let mut cmd = Command::new("docker");
            cmd.args(["run", "--rm", "-v"])
                .arg(format!("{}:{CONTAINER_WORKDIR}", dist_dir.display()))
                .args(["-w", CONTAINER_WORKDIR, image, "perl", script]);
            cmd
        }
        None => {
            let mut cmd = Command::new("perl");
            cmd.arg(script).current_dir(dist_dir);
            cmd
        }
    };

    debug!(
        script,
        container = container_image.unwrap_or("none"),
        dir = %dist_dir.display(),
        "running configure"
    );

    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| ExtractError::ConfigureFailed(format!("spawning {script}: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(ExtractError::ConfigureFailed(format!(
            "{script} exited with {status}"
        )))
    }
}

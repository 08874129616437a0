use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// Model file the generator is expected to write into the work directory.
const MODEL_OUTPUT: &str = "output.glb";
/// Metadata file the generator is expected to write into the work directory.
const META_OUTPUT: &str = "output.json";

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator exited with status {code}")]
    ExitStatus { code: i32 },

    #[error("generator terminated by signal")]
    Signalled,

    #[error("generator timed out after {0} seconds")]
    TimedOut(u64),

    #[error("failed to run generator: {0}")]
    Io(#[from] std::io::Error),
}

/// What the generator left behind after a zero exit.
///
/// Either output may legitimately be missing; callers apply their own
/// fallback for the model and treat absent metadata as null.
#[derive(Debug)]
pub struct GeneratorOutput {
    pub model_path: Option<PathBuf>,
    pub meta: Option<serde_json::Value>,
}

/// Invoker for the external image-to-3D generation program.
///
/// Contract: `<program> [args..] --input <image> --out_glb <path>
/// --out_json <path> --headless`, exit 0 on success.
pub struct Generator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Generator {
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }

    /// Run the generator against `input_image`, writing outputs into
    /// `work_dir`. Waits for exit, bounded by the configured timeout; the
    /// process is killed when the bound is exceeded.
    pub async fn run(
        &self,
        input_image: &Path,
        work_dir: &Path,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let out_glb = work_dir.join(MODEL_OUTPUT);
        let out_json = work_dir.join(META_OUTPUT);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(input_image)
            .arg("--out_glb")
            .arg(&out_glb)
            .arg("--out_json")
            .arg(&out_json)
            .arg("--headless")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = stdout.map(|out| tokio::spawn(forward_lines(out, false)));
        let stderr_task = stderr.map(|err| tokio::spawn(forward_lines(err, true)));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(GeneratorError::TimedOut(self.timeout.as_secs()));
            }
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        match status.code() {
            Some(0) => {}
            Some(code) => return Err(GeneratorError::ExitStatus { code }),
            None => return Err(GeneratorError::Signalled),
        }

        let model_path = tokio::fs::try_exists(&out_glb)
            .await
            .unwrap_or(false)
            .then_some(out_glb);

        let meta = match tokio::fs::read_to_string(&out_json).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(error = %e, "Generator metadata is not valid JSON, ignoring");
                    None
                }
            },
            Err(_) => None,
        };

        Ok(GeneratorOutput { model_path, meta })
    }
}

/// Forward a subprocess output stream through tracing, line-buffered.
async fn forward_lines<R: AsyncRead + Unpin>(stream: R, from_stderr: bool) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if from_stderr {
            warn!(target: "generator", "{line}");
        } else {
            info!(target: "generator", "{line}");
        }
    }
}

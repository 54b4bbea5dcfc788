//! External inference process driven over a line-delimited JSON pipe.
//!
//! The engine command is spawned once per worker and kept alive for the
//! worker's lifetime; model initialization happens inside the child at
//! startup, not per task. Each task is one request line on the child's stdin
//! and one reply line on its stdout. Images are handed over through a scratch
//! directory, so only paths cross the pipe.
//!
//! Request:  `{"source": "...", "target": "...", "result": "..."}`
//! Reply:    `{"source_face": bool, "target_face": bool}`
//!
//! When both faces are found, the child must have written the swapped image
//! to the requested result path before replying.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EngineError, InferenceEngine, SwapOutcome};

#[derive(Debug)]
pub struct CommandEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

#[derive(Serialize)]
struct SwapRequest<'a> {
    source: &'a Path,
    target: &'a Path,
    result: &'a Path,
}

#[derive(Deserialize)]
struct SwapReply {
    source_face: bool,
    target_face: bool,
}

impl CommandEngine {
    /// Launch the inference process on the given device.
    pub fn spawn(command: &Path, device: &str) -> Result<Self, EngineError> {
        debug!(command = %command.display(), device, "Launching inference engine");

        let mut child = Command::new(command)
            .arg("--device")
            .arg(device)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(EngineError::Launch)?;

        let stdin = child.stdin.take().ok_or(EngineError::Disconnected)?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or(EngineError::Disconnected)?;

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }
}

impl InferenceEngine for CommandEngine {
    fn swap_faces(&mut self, source: &[u8], target: &[u8]) -> Result<SwapOutcome, EngineError> {
        let scratch = tempfile::tempdir()?;
        let source_path = scratch.path().join("source.img");
        let target_path = scratch.path().join("target.img");
        let result_path = scratch.path().join("result.jpg");

        std::fs::write(&source_path, source)?;
        std::fs::write(&target_path, target)?;

        let mut line = serde_json::to_string(&SwapRequest {
            source: &source_path,
            target: &target_path,
            result: &result_path,
        })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut reply_line = String::new();
        // Blocks for the duration of the inference; no timeout by design.
        if self.stdout.read_line(&mut reply_line)? == 0 {
            return Err(EngineError::Disconnected);
        }
        let reply: SwapReply = serde_json::from_str(reply_line.trim())?;

        let image = if reply.source_face && reply.target_face {
            match std::fs::read(&result_path) {
                Ok(bytes) => Some(bytes),
                Err(_) => return Err(EngineError::MissingResult),
            }
        } else {
            None
        };

        Ok(SwapOutcome {
            source_face: reply.source_face,
            target_face: reply.target_face,
            image,
        })
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

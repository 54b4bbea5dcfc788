//! Inference engine seam.
//!
//! The model itself is an external collaborator: the crate only knows that a
//! swap takes two images and reports, per side, whether a face was found,
//! plus the swapped image when both were. Workers own their engine privately
//! (the engine is stateful and expensive to construct), so the pool is handed
//! a factory rather than an instance.

pub mod command;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use command::CommandEngine;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch inference engine: {0}")]
    Launch(std::io::Error),

    #[error("inference engine closed its pipe")]
    Disconnected,

    #[error("inference engine protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("inference engine reported a swap but produced no result image")]
    MissingResult,

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one inference run. `image` is present iff both faces were found.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub source_face: bool,
    pub target_face: bool,
    pub image: Option<Vec<u8>>,
}

/// One privately-owned inference engine instance.
///
/// `&mut self` because engines are stateful; `Send` (not `Sync`) because each
/// instance lives on exactly one worker thread.
pub trait InferenceEngine: Send {
    fn swap_faces(&mut self, source: &[u8], target: &[u8]) -> Result<SwapOutcome, EngineError>;
}

/// Constructor for per-worker engines, parameterized by the device selector.
pub type EngineFactory =
    Arc<dyn Fn(&str) -> Result<Box<dyn InferenceEngine>, EngineError> + Send + Sync>;

/// Factory backed by the configured external inference command.
pub fn command_factory(command: PathBuf) -> EngineFactory {
    Arc::new(move |device: &str| {
        let engine = CommandEngine::spawn(&command, device)?;
        Ok(Box::new(engine) as Box<dyn InferenceEngine>)
    })
}

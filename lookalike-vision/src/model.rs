use std::path::Path;

use anyhow::{ensure, Context, Result};
use ort::{
    ep::{self, ExecutionProvider},
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
};

pub fn session_builder() -> Result<SessionBuilder> {
    let mut builder =
        Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "openvino")]
    {
        let ep = ep::OpenVINO::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("openvino feature is enabled, onnx runtime not compiled with openvino")
        }
    }

    #[cfg(feature = "cuda")]
    {
        let ep = ep::CUDA::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("cuda feature is enabled, onnx runtime not compiled with cuda")
        }
    }

    Ok(builder)
}

fn load(path: &Path, what: &str) -> Result<Session> {
    ensure!(path.is_file(), "{what} model not found at {}", path.display());
    log::debug!("loading {what} model from {}", path.display());
    session_builder()?
        .commit_from_file(path)
        .with_context(|| format!("load {what} model {}", path.display()))
}

/// SFace recognizer, 112x112 BGR input, 128-d output.
pub fn recognizer_session(path: &Path) -> Result<Session> {
    load(path, "recognition")
}

/// YuNet detector, 640x640 BGR input.
pub fn detector_session(path: &Path) -> Result<Session> {
    load(path, "detector")
}

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum ModuleOutputError {
    #[error("failed to output JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("failed to write output: {0}")]
    Write(#[source] tokio::io::Error),

    #[error("failed to flush output: {0}")]
    Flush(#[source] tokio::io::Error),
}

/// The result object a module reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutput<R> {
    pub changed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<R>,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl<R> ModuleOutput<R> {
    pub fn changed(results: R) -> Self {
        Self {
            changed: true,
            failed: false,
            msg: None,
            results: Some(results),
        }
    }

    pub fn unchanged(results: R) -> Self {
        Self {
            changed: false,
            failed: false,
            msg: None,
            results: Some(results),
        }
    }

    pub fn failed(msg: impl Into<String>, results: Option<R>) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: Some(msg.into()),
            results,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

impl<R: Serialize> ModuleOutput<R> {
    /// Write the output as a single line of JSON.
    pub async fn write<W>(&self, out: &mut W) -> Result<(), ModuleOutputError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut bytes = serde_json::to_vec(self).map_err(ModuleOutputError::Json)?;
        bytes.push(b'\n');
        out.write_all(&bytes)
            .await
            .map_err(ModuleOutputError::Write)?;
        out.flush().await.map_err(ModuleOutputError::Flush)?;
        Ok(())
    }
}

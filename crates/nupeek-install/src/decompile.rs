use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use nupeek_fs::{AtomicWriteOptions, atomic_write};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("failed to start decompiler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decompiler failed for {type_name} ({status}): {stderr}")]
    Failed {
        type_name: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("decompiler produced no output for {type_name}")]
    EmptyOutput { type_name: String },

    #[error("decompiler failed: {0}")]
    Other(String),

    #[error(transparent)]
    Write(#[from] nupeek_fs::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Turns one type of an assembly into source text at `output`.
pub trait Decompiler: Send + Sync {
    fn decompile(
        &self,
        assembly: &Path,
        type_name: &str,
        output: &Path,
    ) -> impl Future<Output = Result<(), DecompileError>> + Send;
}

/// Runs an external decompiler and saves its standard output.
///
/// The child is killed when the returned future is dropped.
#[derive(Clone, Debug)]
pub struct CommandDecompiler {
    program: String,
    args: Vec<String>,
}

impl CommandDecompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before `-t <type> <assembly>`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Decompiler for CommandDecompiler {
    #[tracing::instrument(skip(self, assembly, output), fields(program = %self.program, assembly = %assembly.display()))]
    async fn decompile(&self, assembly: &Path, type_name: &str, output: &Path) -> Result<(), DecompileError> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg("-t")
            .arg(type_name)
            .arg(assembly)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DecompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(DecompileError::Failed {
                type_name: type_name.to_string(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        if out.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(DecompileError::EmptyOutput {
                type_name: type_name.to_string(),
            });
        }

        let path: PathBuf = output.to_path_buf();
        let bytes = out.stdout;
        tokio::task::spawn_blocking(move || {
            atomic_write(&path, &bytes, AtomicWriteOptions::new().create_parent(true))
        })
        .await??;

        tracing::debug!(output = %output.display(), "decompiled source written");
        Ok(())
    }
}

//! External code generation.
//!
//! The synthesizer stages `tfplugin<N>/tfplugin<N>.proto` into a fresh
//! directory, then asks a [`Generator`] to populate that directory with the
//! generated module. [`CommandGenerator`] runs a configured list of external
//! commands; tests substitute their own implementations.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use pmirror_types::Version;
use tracing::{debug, warn};

use crate::config::{CommandStep, GeneratorConfig, StepDir};
use crate::error::GenerateError;
use crate::naming;

/// Everything a generator needs to build one version.
#[derive(Clone, Copy, Debug)]
pub struct GenerationJob<'a> {
    pub version: Version,
    /// Build directory root; becomes the root of the release tree.
    pub root: &'a Path,
    /// `<root>/tfplugin<N>`, already containing the protocol file.
    pub package_dir: &'a Path,
    pub module_path: &'a str,
    pub proto_file: &'a str,
}

impl GenerationJob<'_> {
    /// Substitute job placeholders in `template`.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{module_path}", self.module_path)
            .replace("{proto_file}", self.proto_file)
            .replace("{package_dir}", &naming::package_dir_name(&self.version))
            .replace("{major}", &self.version.major.to_string())
            .replace("{minor}", &self.version.minor.to_string())
    }
}

pub trait Generator: Send + Sync {
    /// Populate `job.root`. Must not touch anything outside it.
    fn generate(&self, job: &GenerationJob<'_>) -> Result<(), GenerateError>;
}

/// Runs external commands in sequence, each bounded by `timeout`.
///
/// A step that outlives the timeout is killed and reported as
/// [`GenerateError::TimedOut`].
#[derive(Clone, Debug)]
pub struct CommandGenerator {
    steps: Vec<CommandStep>,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(steps: Vec<CommandStep>, timeout: Duration) -> Self {
        Self { steps, timeout }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.steps.clone(), config.timeout())
    }

    pub fn steps(&self) -> &[CommandStep] {
        &self.steps
    }

    async fn run_step(&self, step: &CommandStep, job: &GenerationJob<'_>) -> Result<(), GenerateError> {
        let label = job.expand(&step.display());
        let dir = match step.dir {
            StepDir::Root => job.root,
            StepDir::Package => job.package_dir,
        };
        debug!(step = %label, dir = %dir.display(), "running generator step");

        let mut cmd = tokio::process::Command::new(&step.program);
        cmd.args(step.args.iter().map(|a| job.expand(a)))
            .envs(step.env.iter().map(|(k, v)| (k, job.expand(v))))
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| GenerateError::Spawn {
                step: label.clone(),
                source,
            })?,
            Err(_) => {
                warn!(step = %label, timeout = ?self.timeout, "generator step timed out");
                return Err(GenerateError::TimedOut {
                    step: label,
                    timeout: self.timeout,
                });
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(GenerateError::Failed {
                step: label,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, job: &GenerationJob<'_>) -> Result<(), GenerateError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async {
            for step in &self.steps {
                self.run_step(step, job).await?;
            }
            Ok::<(), GenerateError>(())
        })
    }
}

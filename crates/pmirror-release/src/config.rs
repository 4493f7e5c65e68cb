use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pmirror.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Directory of the upstream tree holding `tfplugin<N>.proto` files.
    pub proto_dir: String,
    /// Module path prefix; releases are published as `<prefix>/v<major>`.
    pub module_prefix: String,
    /// Revision to read when the upstream has no stable release tag.
    pub upstream_branch: String,
    pub author: AuthorConfig,
    /// Parent directory for per-version build directories. `None` uses the
    /// system temp directory.
    pub staging_root: Option<PathBuf>,
    pub generator: GeneratorConfig,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            proto_dir: "docs/plugin-protocol".into(),
            module_prefix: "github.com/apparentlymart/terraform-plugin-proto-go".into(),
            upstream_branch: "HEAD".into(),
            author: AuthorConfig::default(),
            staging_root: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl MirrorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `pmirror.toml` in `cwd` if present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// Identity recorded on generated commits and tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: "The Terraform Team".into(),
            email: "noreply@hashicorp.com".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Upper bound for each external step.
    pub timeout_secs: u64,
    pub steps: Vec<CommandStep>,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            steps: vec![
                CommandStep::new("go", ["mod", "init", "{module_path}"], StepDir::Root),
                CommandStep::new(
                    "protoc",
                    ["-I", "./", "{proto_file}", "--go_out=plugins=grpc:./"],
                    StepDir::Package,
                ),
                CommandStep::new("go", ["mod", "tidy"], StepDir::Root)
                    .with_env("GOPROXY", "https://proxy.golang.org/"),
            ],
        }
    }
}

/// Working directory of a generator step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDir {
    /// Root of the build directory.
    Root,
    /// The `tfplugin<N>` package directory.
    Package,
}

/// One external command. `args` and `env` values may contain the
/// placeholders `{module_path}`, `{proto_file}`, `{package_dir}`, `{major}`
/// and `{minor}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStep {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_step_dir")]
    pub dir: StepDir,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_step_dir() -> StepDir {
    StepDir::Root
}

impl CommandStep {
    pub fn new<I, S>(program: impl Into<String>, args: I, dir: StepDir) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            dir,
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// `program arg1 arg2`, for logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

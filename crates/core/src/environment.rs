//! Build mode and the environment established by the `env` task

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::configs::ProjectConfig;
use crate::pipeline::{DEV, PROD};
use crate::types::{KilnError, KilnResult};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    /// Value exported as `NODE_ENV`
    pub fn node_env(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    /// Mode implied by a set of targets when none is requested explicitly.
    ///
    /// `prod` always builds in production; a run naming both `dev` and `prod`
    /// has no single implied mode.
    pub fn for_targets<S: AsRef<str>>(targets: &[S]) -> KilnResult<Self> {
        let named = |name: &str| targets.iter().any(|target| target.as_ref() == name);
        match (named(DEV), named(PROD)) {
            (true, true) => Err(KilnError::Config(format!(
                "'{}' and '{}' build in different modes; request a mode explicitly",
                DEV, PROD
            ))),
            (false, true) => Ok(BuildMode::Production),
            _ => Ok(BuildMode::Development),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_env())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(BuildMode::Development),
            "prod" | "production" => Ok(BuildMode::Production),
            other => Err(format!("Unknown build mode '{}'", other)),
        }
    }
}

/// Environment shared with every task after `env` has run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub mode: BuildMode,
    /// Variables injected into the bundle, always including `NODE_ENV`
    pub vars: BTreeMap<String, String>,
}

impl BuildEnvironment {
    pub fn establish(mode: BuildMode, config: &ProjectConfig) -> Self {
        let mut vars = config.env.clone();
        vars.insert("NODE_ENV".to_string(), mode.node_env().to_string());
        Self { mode, vars }
    }
}

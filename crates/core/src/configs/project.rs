//! `kiln.yml` project configuration
//!
//! Every key is optional; defaults describe a single-page TypeScript app with
//! sources under `src/`, static assets under `assets/` and output in `dist/`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::environment::BuildMode;
use crate::types::{KilnError, KilnResult};

pub const CONFIG_FILE_NAME: &str = "kiln.yml";

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProjectConfig {
    /// Source root handed to the bundler
    pub home_dir: PathBuf,
    /// Bundle entry point, relative to `homeDir`
    pub entry: String,
    pub bundle_name: String,
    /// Directory removed by the `clean` task
    pub output_dir: PathBuf,
    /// Output file pattern; `$name` is replaced by the bundle name
    pub output: String,
    pub alias: BTreeMap<String, String>,
    /// Source transformers run before bundling, in order
    pub transformers: Vec<String>,
    pub experimental_features: bool,
    pub assets: AssetsConfig,
    pub html: HtmlConfig,
    /// License banner prepended to every emitted bundle
    pub banner: Option<String>,
    /// Extra variables injected alongside `NODE_ENV`
    pub env: BTreeMap<String, String>,
    pub optimizer: OptimizerConfig,
    pub dev_server: DevServerConfig,
    pub bundler: BundlerCommands,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            home_dir: PathBuf::from("src"),
            entry: "index.tsx".to_string(),
            bundle_name: "app".to_string(),
            output_dir: PathBuf::from("dist"),
            output: "dist/$name.js".to_string(),
            alias: BTreeMap::from([("locale".to_string(), "moment/locale".to_string())]),
            transformers: vec!["classcat".to_string(), "inferno".to_string()],
            experimental_features: true,
            assets: AssetsConfig::default(),
            html: HtmlConfig::default(),
            banner: None,
            env: BTreeMap::new(),
            optimizer: OptimizerConfig::default(),
            dev_server: DevServerConfig::default(),
            bundler: BundlerCommands::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AssetsConfig {
    /// Glob patterns, relative to the project root
    pub patterns: Vec<String>,
    pub dev_dest: PathBuf,
    pub prod_dest: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["assets/**/*".to_string()],
            dev_dest: PathBuf::from("dist/static"),
            prod_dest: PathBuf::from("dist"),
        }
    }
}

impl AssetsConfig {
    pub fn destination(&self, mode: BuildMode) -> &Path {
        match mode {
            BuildMode::Development => &self.dev_dest,
            BuildMode::Production => &self.prod_dest,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct HtmlConfig {
    pub title: String,
    pub template: PathBuf,
    pub dev_path: String,
    pub prod_path: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            title: "kiln app".to_string(),
            template: PathBuf::from("src/index.html"),
            dev_path: "/".to_string(),
            prod_path: "/static".to_string(),
        }
    }
}

impl HtmlConfig {
    pub fn public_path(&self, mode: BuildMode) -> &str {
        match mode {
            BuildMode::Development => &self.dev_path,
            BuildMode::Production => &self.prod_path,
        }
    }
}

/// Options for the production-only optimizer plugin
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OptimizerConfig {
    pub bake_api_into_bundle: String,
    pub treeshake: bool,
    pub uglify: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            bake_api_into_bundle: "app".to_string(),
            treeshake: true,
            uglify: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DevServerConfig {
    /// File served for unknown routes
    pub fallback: String,
    pub hmr: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            fallback: "index.html".to_string(),
            hmr: true,
        }
    }
}

/// External commands that perform the actual bundling
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BundlerCommands {
    pub build: Vec<String>,
    pub serve: Vec<String>,
}

impl Default for BundlerCommands {
    fn default() -> Self {
        Self {
            build: vec!["npx".to_string(), "fuse".to_string(), "build".to_string()],
            serve: vec!["npx".to_string(), "fuse".to_string(), "serve".to_string()],
        }
    }
}

impl ProjectConfig {
    /// Reject configurations no task could work with
    pub fn validate(&self) -> KilnResult<()> {
        if self.bundle_name.trim().is_empty() {
            return Err(KilnError::Config("bundleName must not be empty".to_string()));
        }
        if self.entry.trim().is_empty() {
            return Err(KilnError::Config("entry must not be empty".to_string()));
        }
        check_project_subdir("outputDir", &self.output_dir)?;
        check_project_subdir("assets.devDest", &self.assets.dev_dest)?;
        check_project_subdir("assets.prodDest", &self.assets.prod_dest)?;
        if self.transformers.iter().any(|t| t.trim().is_empty()) {
            return Err(KilnError::Config(
                "transformers must not contain empty names".to_string(),
            ));
        }
        if self.bundler.build.is_empty() {
            return Err(KilnError::Config("bundler.build must name a command".to_string()));
        }
        if self.bundler.serve.is_empty() {
            return Err(KilnError::Config("bundler.serve must name a command".to_string()));
        }
        Ok(())
    }
}

/// Accept only a relative path that names a directory strictly below the
/// project root. `clean` deletes the output directory, so `..`, absolute
/// paths and the root itself are refused.
pub(crate) fn check_project_subdir(field: &str, path: &Path) -> KilnResult<()> {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(KilnError::Config(format!(
                    "{} must be a relative path inside the project, got '{}'",
                    field,
                    path.display()
                )));
            }
        }
    }
    if depth == 0 {
        return Err(KilnError::Config(format!(
            "{} must name a directory below the project root",
            field
        )));
    }
    Ok(())
}

pub fn parse_project_config(yaml_str: &str) -> KilnResult<ProjectConfig> {
    if yaml_str.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = serde_yaml::from_str(yaml_str)?;
    config.validate()?;
    Ok(config)
}

/// Load the project configuration.
///
/// An explicit path must exist. Without one, `kiln.yml` in `project_root` is
/// used when present and the defaults otherwise.
pub fn load_project_config(
    project_root: &Path,
    explicit: Option<&Path>,
) -> KilnResult<ProjectConfig> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = project_root.join(CONFIG_FILE_NAME);
            if !path.exists() {
                warn!(
                    "No {} found in {}, using defaults",
                    CONFIG_FILE_NAME,
                    project_root.display()
                );
                return Ok(ProjectConfig::default());
            }
            path
        }
    };

    debug!(path = %config_path.display(), "loading project config");
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        KilnError::Config(format!(
            "Failed to read project config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    parse_project_config(&content).map_err(|e| {
        KilnError::Config(format!(
            "Failed to parse project config {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// JSON schema for `kiln.yml`
pub fn project_config_schema() -> KilnResult<String> {
    let schema = schemars::schema_for!(ProjectConfig);
    serde_json::to_string_pretty(&schema)
        .map_err(|e| KilnError::Config(format!("Failed to render schema: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_project_config("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.alias.get("locale").map(String::as_str), Some("moment/locale"));
        assert_eq!(config.transformers, vec!["classcat", "inferno"]);
        assert!(config.experimental_features);
    }

    #[test]
    fn test_transformers_can_be_replaced() {
        let config =
            parse_project_config("transformers: [preact]\nexperimentalFeatures: false\n").unwrap();
        assert_eq!(config.transformers, vec!["preact"]);
        assert!(!config.experimental_features);
        assert!(parse_project_config("transformers: [\"\"]\n").is_err());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let yaml = r#"
homeDir: client
banner: "// @license AGPL-3.0"
html:
  title: Lemmy
assets:
  prodDest: public
env:
  API_URL: https://example.org
"#;
        let config = parse_project_config(yaml).unwrap();
        assert_eq!(config.home_dir, PathBuf::from("client"));
        assert_eq!(config.banner.as_deref(), Some("// @license AGPL-3.0"));
        assert_eq!(config.html.title, "Lemmy");
        assert_eq!(config.html.template, PathBuf::from("src/index.html"));
        assert_eq!(config.assets.prod_dest, PathBuf::from("public"));
        assert_eq!(config.assets.dev_dest, PathBuf::from("dist/static"));
        assert_eq!(config.env["API_URL"], "https://example.org");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(parse_project_config("outDir: build\n").is_err());
    }

    #[test]
    fn test_empty_bundler_command_is_rejected() {
        let err = parse_project_config("bundler:\n  build: []\n").unwrap_err();
        assert!(err.to_string().contains("bundler.build"));
    }

    #[test]
    fn test_output_dir_must_stay_inside_project() {
        for output_dir in ["..", "../proj", "dist/../..", "/", "/tmp/out", ".", "./", "\"\""] {
            let yaml = format!("outputDir: {}\n", output_dir);
            let err = parse_project_config(&yaml).unwrap_err();
            assert!(
                err.to_string().contains("outputDir"),
                "outputDir {output_dir} should be rejected, got: {err}"
            );
        }
    }

    #[test]
    fn test_nested_output_dir_is_accepted() {
        let config = parse_project_config("outputDir: ./build/web\n").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("./build/web"));
    }

    #[test]
    fn test_asset_destinations_must_stay_inside_project() {
        let err = parse_project_config("assets:\n  prodDest: ../public\n").unwrap_err();
        assert!(err.to_string().contains("assets.prodDest"));
        let err = parse_project_config("assets:\n  devDest: /var/www\n").unwrap_err();
        assert!(err.to_string().contains("assets.devDest"));
    }

    #[test]
    fn test_mode_dependent_values() {
        let config = ProjectConfig::default();
        assert_eq!(
            config.assets.destination(BuildMode::Development),
            Path::new("dist/static")
        );
        assert_eq!(config.assets.destination(BuildMode::Production), Path::new("dist"));
        assert_eq!(config.html.public_path(BuildMode::Development), "/");
        assert_eq!(config.html.public_path(BuildMode::Production), "/static");
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_project_config(temp_dir.path(), None).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("other.yml");
        let err = load_project_config(temp_dir.path(), Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read project config"));
    }

    #[test]
    fn test_load_from_project_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "bundleName: main\n").unwrap();
        let config = load_project_config(temp_dir.path(), None).unwrap();
        assert_eq!(config.bundle_name, "main");
    }

    #[test]
    fn test_schema_mentions_fields() {
        let schema = project_config_schema().unwrap();
        assert!(schema.contains("homeDir"));
        assert!(schema.contains("devServer"));
    }
}

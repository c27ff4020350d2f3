//! Bundle configuration handed to the bundler
//!
//! The plugin list is assembled by [`PluginSetBuilder`] once per run from the
//! project configuration and the established build environment. Plugins that
//! do not apply in the current mode are simply left out of the list.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::configs::ProjectConfig;
use crate::environment::{BuildEnvironment, BuildMode};

/// Capabilities requested from the bundler, in application order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plugin", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Plugin {
    /// Inline environment variables into the bundle
    Env { vars: BTreeMap<String, String> },
    Css,
    /// Generate `index.html` from a template
    WebIndex {
        title: String,
        template: PathBuf,
        path: String,
    },
    /// Tree-shaking and minification, production only
    Optimizer {
        bake_api_into_bundle: String,
        treeshake: bool,
        uglify: bool,
    },
    Banner { text: String },
}

#[derive(Debug, Default)]
pub struct PluginSetBuilder {
    plugins: Vec<Plugin>,
}

impl PluginSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn push_if(self, condition: bool, plugin: impl FnOnce() -> Plugin) -> Self {
        if condition {
            self.push(plugin())
        } else {
            self
        }
    }

    pub fn push_opt(self, plugin: Option<Plugin>) -> Self {
        match plugin {
            Some(plugin) => self.push(plugin),
            None => self,
        }
    }

    pub fn build(self) -> Vec<Plugin> {
        self.plugins
    }

    /// Standard plugin set for a project in the given environment
    pub fn for_project(config: &ProjectConfig, environment: &BuildEnvironment) -> Self {
        let mode = environment.mode;
        Self::new()
            .push(Plugin::Env {
                vars: environment.vars.clone(),
            })
            .push(Plugin::Css)
            .push(Plugin::WebIndex {
                title: config.html.title.clone(),
                template: config.html.template.clone(),
                path: config.html.public_path(mode).to_string(),
            })
            .push_if(mode.is_production(), || Plugin::Optimizer {
                bake_api_into_bundle: config.optimizer.bake_api_into_bundle.clone(),
                treeshake: config.optimizer.treeshake,
                uglify: config.optimizer.uglify,
            })
            .push_opt(config.banner.clone().map(|text| Plugin::Banner { text }))
    }
}

/// Source transformers grouped by the stage they run in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transformers {
    pub before: Vec<String>,
}

/// Dev server options, present only in development bundles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevOptions {
    pub fallback: String,
    pub hmr: bool,
}

/// Everything the bundler needs to build or serve one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    pub name: String,
    pub mode: BuildMode,
    pub home_dir: PathBuf,
    pub entry: String,
    pub output_dir: PathBuf,
    pub output: String,
    /// Content hashes in file names
    pub hash: bool,
    pub cache: bool,
    pub source_maps: bool,
    pub experimental_features: bool,
    pub alias: BTreeMap<String, String>,
    pub transformers: Transformers,
    pub plugins: Vec<Plugin>,
    pub dev: Option<DevOptions>,
}

impl BundleConfig {
    pub fn new(config: &ProjectConfig, environment: &BuildEnvironment) -> Self {
        let production = environment.mode.is_production();
        Self {
            name: config.bundle_name.clone(),
            mode: environment.mode,
            home_dir: config.home_dir.clone(),
            entry: config.entry.clone(),
            output_dir: config.output_dir.clone(),
            output: config.output.clone(),
            hash: production,
            cache: !production,
            source_maps: !production,
            experimental_features: config.experimental_features,
            alias: config.alias.clone(),
            transformers: Transformers {
                before: config.transformers.clone(),
            },
            plugins: PluginSetBuilder::for_project(config, environment).build(),
            dev: (!production).then(|| DevOptions {
                fallback: config.dev_server.fallback.clone(),
                hmr: config.dev_server.hmr,
            }),
        }
    }

    /// Output path with `$name` substituted
    pub fn output_path(&self) -> String {
        self.output.replace("$name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin_names(plugins: &[Plugin]) -> Vec<&'static str> {
        plugins
            .iter()
            .map(|p| match p {
                Plugin::Env { .. } => "env",
                Plugin::Css => "css",
                Plugin::WebIndex { .. } => "web-index",
                Plugin::Optimizer { .. } => "optimizer",
                Plugin::Banner { .. } => "banner",
            })
            .collect()
    }

    #[test]
    fn test_development_bundle() {
        let config = ProjectConfig::default();
        let environment = BuildEnvironment::establish(BuildMode::Development, &config);
        let bundle = BundleConfig::new(&config, &environment);

        assert!(!bundle.hash);
        assert!(bundle.cache);
        assert!(bundle.source_maps);
        assert_eq!(plugin_names(&bundle.plugins), vec!["env", "css", "web-index"]);
        assert_eq!(
            bundle.dev,
            Some(DevOptions {
                fallback: "index.html".to_string(),
                hmr: true,
            })
        );
        assert_eq!(bundle.output_path(), "dist/app.js");
    }

    #[test]
    fn test_production_bundle_adds_optimizer() {
        let config = ProjectConfig {
            banner: Some("// @license AGPL-3.0".to_string()),
            ..ProjectConfig::default()
        };
        let environment = BuildEnvironment::establish(BuildMode::Production, &config);
        let bundle = BundleConfig::new(&config, &environment);

        assert!(bundle.hash);
        assert!(!bundle.cache);
        assert!(!bundle.source_maps);
        assert!(bundle.dev.is_none());
        assert_eq!(
            plugin_names(&bundle.plugins),
            vec!["env", "css", "web-index", "optimizer", "banner"]
        );
        assert_eq!(
            bundle.plugins[2],
            Plugin::WebIndex {
                title: "kiln app".to_string(),
                template: PathBuf::from("src/index.html"),
                path: "/static".to_string(),
            }
        );
    }

    #[test]
    fn test_env_plugin_carries_node_env() {
        let config = ProjectConfig::default();
        let environment = BuildEnvironment::establish(BuildMode::Production, &config);
        let plugins = PluginSetBuilder::for_project(&config, &environment).build();

        match &plugins[0] {
            Plugin::Env { vars } => assert_eq!(vars["NODE_ENV"], "production"),
            other => panic!("unexpected first plugin: {other:?}"),
        }
    }

    #[test]
    fn test_bundle_serializes_with_plugin_tags() {
        let config = ProjectConfig::default();
        let environment = BuildEnvironment::establish(BuildMode::Production, &config);
        let json = serde_json::to_value(BundleConfig::new(&config, &environment)).unwrap();

        assert_eq!(json["mode"], "production");
        assert_eq!(json["sourceMaps"], false);
        assert_eq!(json["plugins"][1]["plugin"], "css");
        assert_eq!(json["plugins"][3]["plugin"], "optimizer");
        assert_eq!(json["plugins"][3]["bakeApiIntoBundle"], "app");
        assert_eq!(json["experimentalFeatures"], true);
        assert_eq!(
            json["transformers"]["before"],
            serde_json::json!(["classcat", "inferno"])
        );
    }
}

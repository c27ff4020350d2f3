//! The front-end build pipeline
//!
//! Registers the standard tasks on a [`TaskRegistry`] of [`BuildContext`]:
//!
//! | task          | prerequisites                           | kind      |
//! |---------------|-----------------------------------------|-----------|
//! | `clean`       |                                         | one-shot  |
//! | `env`         |                                         | one-shot  |
//! | `config`      | `env`                                   | one-shot  |
//! | `copy-assets` | `clean`, `env`                          | one-shot  |
//! | `dev`         | `clean`, `config`, `copy-assets`        | service   |
//! | `prod`        | `clean`, `env`, `config`, `copy-assets` | one-shot  |
//!
//! Data flows between tasks only through the context: `env` establishes the
//! [`BuildEnvironment`], `config` turns it into a [`BundleConfig`]. Each reader
//! declares the writer as a prerequisite.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::assets::AssetCopier;
use crate::bundle::BundleConfig;
use crate::bundler::Bundler;
use crate::configs::project::check_project_subdir;
use crate::configs::ProjectConfig;
use crate::environment::{BuildEnvironment, BuildMode};
use crate::graph::TaskGraph;
use crate::registry::{Task, TaskAction, TaskBody, TaskRegistry};
use crate::service::DevService;
use crate::types::TaskError;

pub const CLEAN: &str = "clean";
pub const ENV: &str = "env";
pub const CONFIG: &str = "config";
pub const COPY_ASSETS: &str = "copy-assets";
pub const DEV: &str = "dev";
pub const PROD: &str = "prod";

/// Per-run state threaded through every pipeline task
pub struct BuildContext {
    pub project_root: PathBuf,
    pub config: ProjectConfig,
    /// Mode `env` will establish
    pub requested_mode: BuildMode,
    /// Set by `env`
    pub environment: Option<BuildEnvironment>,
    /// Set by `config`
    pub bundle: Option<BundleConfig>,
    pub bundler: Arc<dyn Bundler>,
}

impl BuildContext {
    pub fn new(
        project_root: impl Into<PathBuf>,
        config: ProjectConfig,
        requested_mode: BuildMode,
        bundler: Arc<dyn Bundler>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            requested_mode,
            environment: None,
            bundle: None,
            bundler,
        }
    }

    pub fn environment(&self) -> anyhow::Result<&BuildEnvironment> {
        self.environment.as_ref().ok_or_else(|| {
            anyhow!("Build environment not established; declare '{ENV}' as a prerequisite")
        })
    }

    pub fn bundle(&self) -> anyhow::Result<&BundleConfig> {
        self.bundle.as_ref().ok_or_else(|| {
            anyhow!("Bundle not configured; declare '{CONFIG}' as a prerequisite")
        })
    }

    /// Output directory, refused unless it lies below the project root
    pub fn output_dir(&self) -> anyhow::Result<PathBuf> {
        check_project_subdir("outputDir", &self.config.output_dir)?;
        Ok(self.project_root.join(&self.config.output_dir))
    }

    /// Asset destination for the established mode
    pub fn asset_destination(&self) -> anyhow::Result<PathBuf> {
        let destination = self.config.assets.destination(self.environment()?.mode);
        check_project_subdir("asset destination", destination)?;
        Ok(self.project_root.join(destination))
    }

    /// Asset copier that never picks up files from build output
    pub fn asset_copier(&self) -> anyhow::Result<AssetCopier> {
        let assets = &self.config.assets;
        Ok(
            AssetCopier::new(&self.project_root, &assets.patterns)?.with_excluded([
                &self.config.output_dir,
                &assets.dev_dest,
                &assets.prod_dest,
            ]),
        )
    }
}

/// Remove the output directory
pub struct Clean;

#[async_trait]
impl TaskBody<BuildContext> for Clean {
    async fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let output_dir = ctx.output_dir()?;
        match tokio::fs::remove_dir_all(&output_dir).await {
            Ok(()) => info!(dir = %output_dir.display(), "removed output directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %output_dir.display(), "output directory already absent")
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove {}", output_dir.display()))
            }
        }
        Ok(())
    }
}

/// Establish the build environment from the requested mode
pub struct EstablishEnvironment;

#[async_trait]
impl TaskBody<BuildContext> for EstablishEnvironment {
    async fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let environment = BuildEnvironment::establish(ctx.requested_mode, &ctx.config);
        info!(mode = %environment.mode, "established build environment");
        ctx.environment = Some(environment);
        Ok(())
    }
}

/// Build the bundle configuration for the established environment
pub struct ConfigureBundle;

#[async_trait]
impl TaskBody<BuildContext> for ConfigureBundle {
    async fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let bundle = BundleConfig::new(&ctx.config, ctx.environment()?);
        debug!(
            bundle = %bundle.name,
            plugins = bundle.plugins.len(),
            output = %bundle.output_path(),
            "configured bundle"
        );
        ctx.bundle = Some(bundle);
        Ok(())
    }
}

/// Copy static assets into the mode's destination
pub struct CopyAssets;

#[async_trait]
impl TaskBody<BuildContext> for CopyAssets {
    async fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let dest = ctx.asset_destination()?;
        let copier = ctx.asset_copier()?;
        let copied = tokio::task::spawn_blocking(move || copier.copy_all(&dest))
            .await
            .context("Asset copy was interrupted")??;
        info!(count = copied, "copied assets");
        Ok(())
    }
}

/// One-shot production build
pub struct ProductionBuild;

#[async_trait]
impl TaskBody<BuildContext> for ProductionBuild {
    async fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        let bundler = Arc::clone(&ctx.bundler);
        bundler.build(ctx.bundle()?).await
    }
}

/// Register the standard pipeline tasks
pub fn register_pipeline(registry: &mut TaskRegistry<BuildContext>) -> Result<(), TaskError> {
    fn one_shot(
        name: &str,
        prerequisites: &[&str],
        body: Box<dyn TaskBody<BuildContext>>,
    ) -> Task<BuildContext> {
        Task::new(name, prerequisites, TaskAction::OneShot(body))
    }

    registry.insert(
        one_shot(CLEAN, &[], Box::new(Clean)).with_description("Remove the output directory"),
    )?;
    registry.insert(
        one_shot(ENV, &[], Box::new(EstablishEnvironment))
            .with_description("Establish the build mode and injected variables"),
    )?;
    registry.insert(
        one_shot(CONFIG, &[ENV], Box::new(ConfigureBundle))
            .with_description("Configure the bundle and its plugins"),
    )?;
    registry.insert(
        one_shot(COPY_ASSETS, &[CLEAN, ENV], Box::new(CopyAssets))
            .with_description("Copy static assets into the output directory"),
    )?;
    registry.insert(
        Task::new(
            DEV,
            &[CLEAN, CONFIG, COPY_ASSETS],
            TaskAction::Service(Box::new(DevService)),
        )
        .with_description("Serve with hot module reload until stopped"),
    )?;
    registry.insert(
        one_shot(PROD, &[CLEAN, ENV, CONFIG, COPY_ASSETS], Box::new(ProductionBuild))
            .with_description("Build an optimized production bundle"),
    )?;
    Ok(())
}

/// The standard pipeline as a validated graph
pub fn pipeline_graph() -> Result<TaskGraph<BuildContext>, TaskError> {
    let mut registry = TaskRegistry::new();
    register_pipeline(&mut registry)?;
    let graph = TaskGraph::build(registry)?;
    graph.validate()?;
    Ok(graph)
}

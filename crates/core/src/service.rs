//! Development service
//!
//! The `dev` task runs the bundler's dev server in the foreground and keeps
//! static assets in sync while it runs. Both stop when the runner's
//! cancellation token fires; the watcher and the server process are released
//! before the task returns.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assets::AssetCopier;
use crate::pipeline::BuildContext;
use crate::registry::ServiceBody;
use crate::types::KilnResult;

/// Serve the configured bundle until stopped
pub struct DevService;

#[async_trait]
impl ServiceBody<BuildContext> for DevService {
    async fn serve(
        &self,
        ctx: &mut BuildContext,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let bundle = ctx.bundle()?.clone();
        let dest = ctx.asset_destination()?;
        let watcher = AssetWatcher::start(ctx.asset_copier()?, dest, cancel.child_token())?;

        let bundler = Arc::clone(&ctx.bundler);
        let served = bundler.serve(&bundle, cancel).await;

        watcher.stop().await;
        served
    }
}

/// Re-copies assets whenever a matching file is created or modified
pub struct AssetWatcher {
    watcher: Option<RecommendedWatcher>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AssetWatcher {
    pub fn start(
        copier: AssetCopier,
        dest: PathBuf,
        cancel: CancellationToken,
    ) -> KilnResult<Self> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            let _ = event_tx.send(path);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "asset watcher error"),
            },
            Config::default(),
        )?;

        for base in copier.base_dirs() {
            let dir = copier.root().join(&base);
            if dir.is_dir() {
                watcher.watch(&dir, RecursiveMode::Recursive)?;
                debug!(dir = %dir.display(), "watching assets");
            } else {
                debug!(dir = %dir.display(), "asset directory missing, not watching");
            }
        }

        let copier = Arc::new(copier);
        let dest = Arc::new(dest);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    changed = event_rx.recv() => {
                        let Some(path) = changed else { break };
                        if !copier.matches(&path) {
                            continue;
                        }
                        sync_asset(Arc::clone(&copier), Arc::clone(&dest), path).await;
                    }
                }
            }
        });

        Ok(Self {
            watcher: Some(watcher),
            cancel,
            handle,
        })
    }

    /// Stop watching and wait for the copy loop to finish
    pub async fn stop(mut self) {
        self.cancel.cancel();
        drop(self.watcher.take());
        if let Err(e) = (&mut self.handle).await {
            warn!(error = %e, "asset watcher task ended abnormally");
        }
    }
}

/// Copy one changed asset off the async runtime
async fn sync_asset(copier: Arc<AssetCopier>, dest: Arc<PathBuf>, path: PathBuf) {
    let source = path.clone();
    let copied = tokio::task::spawn_blocking(move || {
        if source.is_file() {
            copier.copy_file(&source, &dest).map(Some)
        } else {
            Ok(None)
        }
    })
    .await;

    match copied {
        Ok(Ok(Some(target))) => info!(asset = %target.display(), "asset updated"),
        Ok(Ok(None)) => {}
        Ok(Err(e)) => warn!(asset = %path.display(), error = %e, "failed to copy asset"),
        Err(e) => warn!(asset = %path.display(), error = %e, "asset copy task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_watcher_copies_new_assets() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join("assets")).unwrap();
        let dest = root.join("dist");

        let copier = AssetCopier::new(&root, &["assets/**/*".to_string()]).unwrap();
        let watcher = AssetWatcher::start(copier, dest.clone(), CancellationToken::new()).unwrap();

        // Give the backend a moment to register the watch
        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();

        let copied = dest.join("logo.svg");
        let mut appeared = false;
        for _ in 0..50 {
            if fs::read_to_string(&copied).is_ok_and(|c| c == "<svg/>") {
                appeared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        watcher.stop().await;
        assert!(appeared, "changed asset should be copied to the destination");
    }

    #[tokio::test]
    async fn test_stop_without_asset_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let copier =
            AssetCopier::new(temp_dir.path(), &["assets/**/*".to_string()]).unwrap();
        let cancel = CancellationToken::new();
        let watcher =
            AssetWatcher::start(copier, temp_dir.path().join("dist"), cancel.clone()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), watcher.stop())
            .await
            .expect("watcher should stop promptly");
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_watcher_ignores_its_own_copies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join("assets")).unwrap();
        let dest = root.join("dist");

        let copier = AssetCopier::new(&root, &["**/*.svg".to_string()])
            .unwrap()
            .with_excluded(["dist"]);
        let watcher = AssetWatcher::start(copier, dest.clone(), CancellationToken::new()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();

        let copied = dest.join("assets/logo.svg");
        for _ in 0..50 {
            if copied.is_file() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Leave time for events caused by the copy itself
        tokio::time::sleep(Duration::from_millis(500)).await;
        watcher.stop().await;

        assert!(copied.is_file(), "changed asset should be copied");
        assert!(!dest.join("dist").exists(), "copies must not be copied again");
    }
}

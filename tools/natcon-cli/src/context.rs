//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use natcon_cache::{FileStore, KvStore, UnavailableStore};
use natcon_commerce::prelude::*;

use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["natcon.toml", ".natcon.toml", "natcon.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Store configuration.
    pub config: StoreConfig,
    /// Output handler.
    pub output: Output,
    /// Where the cart file lives.
    pub data_dir: PathBuf,
    /// Cart is kept in memory only.
    pub no_persist: bool,
}

impl Context {
    /// Load config and apply environment overrides.
    pub fn load(
        config_path: Option<&Path>,
        data_dir: Option<PathBuf>,
        no_persist: bool,
        output: Output,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = match config_path {
            Some(path) => StoreConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => match find_config(&cwd) {
                Some(path) => {
                    output.debug(&format!("Using config {}", path.display()));
                    StoreConfig::load(&path)
                        .with_context(|| format!("Failed to load config: {}", path.display()))?
                }
                None => StoreConfig::default(),
            },
        };
        let config = config
            .with_env_overrides()
            .context("Invalid NATCON_* environment override")?;

        let data_dir = match data_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd.join(".natcon"),
        };

        Ok(Self {
            config,
            output,
            data_dir,
            no_persist,
        })
    }

    /// Hydrate the cart for this invocation.
    pub async fn open_cart(&self) -> CartSession {
        let store: Arc<dyn KvStore> = if self.no_persist {
            Arc::new(UnavailableStore::new("disabled with --no-persist"))
        } else {
            Arc::new(FileStore::new(self.data_dir.clone()))
        };
        let persistence = CartPersistence::new(store).with_key(self.config.storage_key.clone());

        let (cart, worker) = CartStore::hydrate(
            persistence,
            self.config.currency,
            self.config.cart_limits(),
        )
        .await;
        tracing::debug!(
            data_dir = %self.data_dir.display(),
            persistent = cart.is_persistent(),
            "cart hydrated"
        );

        if !self.no_persist && !cart.is_persistent() {
            self.output
                .warn("Cart storage is unavailable; changes will not be saved");
        }
        CartSession { cart, worker }
    }
}

/// Find the first config file walking up from `start`.
fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

/// A hydrated cart plus the worker that saves it.
pub struct CartSession {
    pub cart: CartStore,
    worker: PersistenceWorker,
}

impl CartSession {
    /// End the session and wait for the last save.
    ///
    /// Every other handle to the cart must already be dropped.
    pub async fn close(self) {
        let CartSession { cart, worker } = self;
        drop(cart);
        worker.run().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".natcon.toml"), "currency = \"EUR\"").unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(".natcon.toml"));
    }

    #[test]
    fn test_find_config_prefers_first_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("natcon.json"), "{}").unwrap();
        std::fs::write(dir.path().join("natcon.toml"), "").unwrap();

        assert_eq!(
            find_config(dir.path()).unwrap(),
            dir.path().join("natcon.toml")
        );
    }

    #[tokio::test]
    async fn test_session_saves_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: StoreConfig::default(),
            output: Output::new(false, true),
            data_dir: dir.path().to_path_buf(),
            no_persist: false,
        };

        let session = ctx.open_cart().await;
        session.cart.add_item("mug", "", 2, 1200, "Mug").unwrap();
        session.close().await;

        let session = ctx.open_cart().await;
        assert_eq!(session.cart.snapshot().item_count, 2);
    }

    #[tokio::test]
    async fn test_no_persist_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: StoreConfig::default(),
            output: Output::new(false, true),
            data_dir: dir.path().to_path_buf(),
            no_persist: true,
        };

        let session = ctx.open_cart().await;
        assert!(!session.cart.is_persistent());
        session.cart.add_item("mug", "", 1, 1200, "Mug").unwrap();
        session.close().await;

        let session = ctx.open_cart().await;
        assert!(session.cart.snapshot().is_empty());
    }
}

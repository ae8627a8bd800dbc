//! Environment/runtime helpers
//!
//! Sanity checks run before any catalog is touched.

use std::path::Path;
use tracing::warn;

/// Ensure the locales root exists; warn when the working directory looks wrong.
///
/// `locales_root` is the directory part of the catalog path pattern that
/// precedes the `$LOCALE` placeholder.
pub async fn ensure_env(locales_root: &Path) -> anyhow::Result<()> {
    match tokio::fs::metadata(locales_root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(anyhow::anyhow!("{} is not a directory", locales_root.display())),
        Err(_) => {
            warn!(path = %locales_root.display(), "locales directory not found; is the working directory the project root?");
            Ok(())
        }
    }
}

//! Loading the initial pool from a JSON file at startup.

use anyhow::Context;
use codepool::{CodePool, KvStore, QueueStore};
use std::path::Path;

/// Parses a JSON array of codes, rejecting any code listed twice.
pub fn parse_codes(raw: &[u8]) -> anyhow::Result<CodePool> {
    let codes: Vec<String> =
        serde_json::from_slice(raw).context("codes file must be a JSON array of strings")?;
    Ok(CodePool::new(codes)?)
}

/// Reads `path` and replaces the pool stored in `queue` with its codes.
pub async fn load_codes<S: KvStore>(queue: &QueueStore<S>, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read codes file {}", path.display()))?;
    let pool = parse_codes(&raw).with_context(|| format!("invalid codes file {}", path.display()))?;
    let count = pool.len();

    let version = queue.replace(&pool).await?;
    tracing::info!(
        count,
        key = queue.key(),
        %version,
        "Loaded codes from {}",
        path.display()
    );
    Ok(count)
}

//! JSON export of a snapshot for static hosting

use crate::cache::Snapshot;
use crate::error::Result;
use crate::models::PlayerSummary;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// What an export wrote
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub players_path: PathBuf,
    pub projections_dir: PathBuf,
    pub projection_count: usize,
    /// Files from earlier exports whose player is gone
    pub removed_count: usize,
}

/// Whether an id names a single plain file inside the projections directory
fn is_plain_file_name(id: &str) -> bool {
    let mut components = Path::new(id).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Write `players.json` (sorted by name) and one `projections/<id>.json` per player.
///
/// `projections/*.json` files left from an earlier export whose id is no
/// longer in the snapshot are removed; other files are left alone.
pub async fn write_snapshot(snapshot: &Snapshot, out_dir: &Path) -> Result<ExportSummary> {
    let projections_dir = out_dir.join("projections");
    tokio::fs::create_dir_all(&projections_dir).await?;

    let mut players: Vec<&PlayerSummary> = snapshot.players().iter().collect();
    players.sort_by(|a, b| a.name.cmp(&b.name));

    let players_path = out_dir.join("players.json");
    tokio::fs::write(&players_path, serde_json::to_vec_pretty(&players)?).await?;

    let mut written = HashSet::new();
    for projection in snapshot.projections() {
        if !is_plain_file_name(&projection.id) {
            warn!("Skipping projection with unsafe id {:?}", projection.id);
            continue;
        }
        let file_name = format!("{}.json", projection.id);
        let path = projections_dir.join(&file_name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(projection)?).await?;
        written.insert(file_name);
    }

    let mut removed_count = 0;
    let mut entries = tokio::fs::read_dir(&projections_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let stale = path.extension().is_some_and(|ext| ext == "json")
            && !written.contains(&*entry.file_name().to_string_lossy())
            && entry.file_type().await?.is_file();
        if stale {
            tokio::fs::remove_file(&path).await?;
            debug!("Removed stale projection {}", path.display());
            removed_count += 1;
        }
    }

    info!(
        "Wrote {} players to {} and projections to {}",
        players.len(),
        players_path.display(),
        projections_dir.display()
    );

    Ok(ExportSummary {
        players_path,
        projections_dir,
        projection_count: written.len(),
        removed_count,
    })
}

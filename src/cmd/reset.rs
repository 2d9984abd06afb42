use heurigen::error::HgResult;
use heurigen::evolution::CheckpointStore;
use tracing::info;

pub fn run(store: &CheckpointStore) -> HgResult<()> {
    if store.delete()? {
        info!("🗑️  Deleted {}", store.path().display());
    } else {
        info!("No checkpoint at {}", store.path().display());
    }
    Ok(())
}

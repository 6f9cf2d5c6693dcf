use crate::ServerState;

pub fn analysis_cache_cleanup(state: &ServerState) -> usize {
    let purged = state.analysis_cache.purge_expired();
    if purged > 0 {
        tracing::info!(
            "Purged {} expired analyses, {} remain",
            purged,
            state.analysis_cache.len()
        );
    }
    purged
}

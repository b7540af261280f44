use std::sync::Arc;
use std::time::Duration;

use rig_core::responses::Snapshot;
use rig_sync::{Connectivity, StoreSource, SyncSettings, SyncState, Synchronizer, Trigger};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::WatchArgs;
use crate::context::AppContext;
use crate::output::output;

/// One printed update of the reconciled view.
#[derive(Debug, Serialize)]
struct WatchFrame<'a> {
    fetches: u64,
    connectivity: Connectivity,
    last_error: Option<String>,
    snapshot: Option<&'a Snapshot>,
}

impl<'a> From<&'a SyncState> for WatchFrame<'a> {
    fn from(state: &'a SyncState) -> Self {
        Self {
            fetches: state.fetches,
            connectivity: state.connectivity,
            last_error: state.last_error.as_ref().map(ToString::to_string),
            snapshot: state.snapshot.as_deref(),
        }
    }
}

/// Handle `rig watch`.
///
/// Writes from other processes never reach this process's change feed, so
/// besides forwarding local notifications the loop forces a reconciliation
/// every `--poll-secs`.
pub async fn handle(args: &WatchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let source = Arc::new(StoreSource::new(
        Arc::clone(&ctx.service),
        ctx.actor()?.clone(),
    ));
    let settings = SyncSettings::from_config(&ctx.config.sync);
    let handle = Synchronizer::new(source, settings).spawn(Some(ctx.service.subscribe()));
    let mut state = handle.state();

    let mut poll = tokio::time::interval(Duration::from_secs(args.poll_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut printed = SyncState::default();
    let result = loop {
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            _ = poll.tick() => {
                if let Err(error) = handle.trigger(Trigger::FocusRegained).await {
                    break Err(error.into());
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = state.borrow_and_update().clone();
                if current == printed {
                    continue;
                }
                if let Err(error) = output(&WatchFrame::from(&current), flags.format) {
                    break Err(error);
                }
                let done = args.max_fetches.is_some_and(|max| current.fetches >= max);
                printed = current;
                if done {
                    break Ok(());
                }
            }
        }
    };

    handle.shutdown().await;
    result
}

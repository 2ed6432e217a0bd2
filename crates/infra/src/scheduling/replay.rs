//! Queue draining shared by both replay schedulers
//!
//! A drain pops and dispatches the events that were pending when the pass
//! began. A failed dispatch is logged and the drain continues with the
//! next event; if the upstream is still down, the failed mutation
//! re-enters the retry queue through the call executor's fallback and is
//! picked up by a later pass, so nothing is silently lost.

use std::sync::Arc;

use syncline_core::{EventQueue, UpstreamApi};
use syncline_domain::{Event, EventAction, UpstreamError, UpstreamResult};
use tracing::{debug, info, warn};

/// Drain one pass of `queue`, dispatching every event pending at the
/// start of the pass to `api`.
///
/// The pass is bounded by the queue length observed on entry: a failed
/// dispatch re-enters this same queue through the executor's retry
/// fallback, and those re-enqueued events must wait for a later pass or a
/// sustained outage would keep the pass spinning forever.
///
/// Returns the number of events dispatched successfully.
pub async fn drain_queue(
    queue: &Arc<EventQueue>,
    api: &Arc<dyn UpstreamApi>,
    scheduler: &'static str,
) -> usize {
    let mut dispatched = 0;
    let pending = queue.len();
    for _ in 0..pending {
        let Some(event) = queue.pop() else { break };
        debug!(scheduler, %event, "Dispatching replay event");
        match dispatch(api, &event).await {
            Ok(()) => dispatched += 1,
            Err(error) => {
                warn!(scheduler, %event, %error, "Replay dispatch failed, continuing with next event");
            }
        }
    }
    if dispatched > 0 {
        info!(scheduler, dispatched, "Queue drain completed");
    }
    dispatched
}

/// Dispatch one event to the port method matching its action.
///
/// Update and delete events without an id cannot be replayed; they are
/// reported as client rejections so the caller logs and drops them instead
/// of requeueing.
async fn dispatch(api: &Arc<dyn UpstreamApi>, event: &Event) -> UpstreamResult<()> {
    match event.action() {
        EventAction::Create => {
            api.create_product(&event.payload()).await?;
        }
        EventAction::Update => {
            let id = require_id(event)?;
            api.update_product(&event.patch(), id).await?;
        }
        EventAction::Delete => {
            let id = require_id(event)?;
            api.delete_product(id).await?;
        }
    }
    Ok(())
}

fn require_id(event: &Event) -> UpstreamResult<&str> {
    event.id().ok_or_else(|| {
        UpstreamError::ClientRejected(format!("{} event carries no product id", event.action()))
    })
}

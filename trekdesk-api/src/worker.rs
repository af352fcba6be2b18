use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::{interval, Duration};
use tracing::info;

use crate::state::FlowStore;

/// Drop manual bookings that were abandoned or finished more than `ttl` ago.
/// Returns how many were removed.
pub async fn sweep_flows(flows: &FlowStore, ttl: ChronoDuration) -> usize {
    let cutoff = Utc::now() - ttl;
    let mut flows = flows.write().await;
    let before = flows.len();

    let mut stale = Vec::new();
    for (id, flow) in flows.iter() {
        // A flow locked by an in-flight request is in use
        if let Ok(flow) = flow.try_lock() {
            if flow.updated_at < cutoff {
                stale.push(*id);
            }
        }
    }
    for id in stale {
        flows.remove(&id);
    }

    before - flows.len()
}

pub async fn start_flow_sweeper(flows: FlowStore, ttl_minutes: u64, every: Duration) {
    let ttl = ChronoDuration::minutes(ttl_minutes as i64);
    let mut ticker = interval(every);
    info!("Manual booking sweeper started (ttl {} minutes)", ttl_minutes);

    loop {
        ticker.tick().await;
        let removed = sweep_flows(&flows, ttl).await;
        if removed > 0 {
            info!("Removed {} stale manual bookings", removed);
        }
    }
}

use std::sync::Weak;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Shared;

/// Mount-time fetch followed by one fetch per `period` until cancelled or
/// until every handle to the conversation has been dropped.
pub(crate) async fn run(shared: Weak<Shared>, cancel: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(shared) = shared.upgrade() else {
            break;
        };
        tracing::debug!("Polling conversation");
        Shared::refresh(&shared).await;
    }

    tracing::debug!("Conversation poller stopped");
}

//! services/api/src/feed.rs
//!
//! Background task that keeps the single change-feed subscription alive and pumps
//! it into the shared dispatcher.

use campus_support_core::domain::CASES_TABLE;
use campus_support_core::ports::{ChangeEvent, ChangeFeed, ChangeKind};
use campus_support_core::sync::ChangeDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(2);

/// Spawns the pump for `CASES_TABLE`. It resubscribes whenever the feed ends or
/// fails, and stops once `shutdown` is cancelled.
pub fn spawn_change_feed(
    feed: Arc<dyn ChangeFeed>,
    dispatcher: ChangeDispatcher,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_change_feed_with_retry(feed, dispatcher, shutdown, RESUBSCRIBE_DELAY)
}

/// Same as `spawn_change_feed` with an explicit pause between subscribe attempts.
pub fn spawn_change_feed_with_retry(
    feed: Arc<dyn ChangeFeed>,
    dispatcher: ChangeDispatcher,
    shutdown: CancellationToken,
    retry_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match feed.subscribe(CASES_TABLE).await {
                Ok(stream) => {
                    info!("Change feed subscribed for '{}'", CASES_TABLE);
                    // Views mounted while we were not subscribed may have missed changes.
                    dispatcher.publish(&ChangeEvent::new(CASES_TABLE, ChangeKind::Update, None));
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = dispatcher.run(stream) => {
                            warn!("Change feed for '{}' ended; resubscribing", CASES_TABLE);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to subscribe to change feed: {:?}", e);
                }
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(retry_delay) => {}
            }
        }
        info!("Change feed pump stopped");
    })
}

use meshcall_client::CallMode;
use meshcall_core::RoomKey;
use std::future::Future;

use super::loopback_hub::Participant;

/// Upper bound for any single expectation (ms). Mock transports connect instantly.
pub const CALL_TIMEOUT_MS: u64 = 2000;

/// How long to wait before concluding that nothing else is coming (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

/// Poll `check` until it holds or the timeout elapses.
pub async fn wait_until<F, Fut>(timeout_ms: u64, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if check().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

/// Joins each participant in order, letting every join settle before the next one so
/// the join order is unambiguous.
pub async fn join_in_sequence(room: &RoomKey, participants: &[&Participant]) {
    for (i, p) in participants.iter().enumerate() {
        p.handle
            .join(room.clone(), CallMode::Video)
            .await
            .expect("join failed");
        for earlier in &participants[..=i] {
            earlier.wait_for_connected(i).await;
        }
    }
}

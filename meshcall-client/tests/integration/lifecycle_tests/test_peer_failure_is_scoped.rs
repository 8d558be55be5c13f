use meshcall_client::{CallEvent, CallMode, NegotiationError};
use meshcall_core::RoomKey;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, ParticipantOptions, QUIET_PERIOD_MS, join_in_sequence};

#[tokio::test]
async fn test_peer_failure_is_scoped() {
    init_tracing();

    let hub = LoopbackHub::new();
    let room = RoomKey::for_group(5);
    let a = hub.participant("a");
    let b = hub.participant("b");
    join_in_sequence(&room, &[&a, &b]).await;

    // C can signal but never gets media through.
    let mut c = hub.participant_with(
        "c",
        ParticipantOptions {
            fail_connectivity: true,
            ..Default::default()
        },
    );
    c.handle.join(room.clone(), CallMode::Video).await.unwrap();

    let mut failed = Vec::new();
    for _ in 0..2 {
        match c
            .expect_event(|e| matches!(e, CallEvent::PeerFailed { .. }))
            .await
        {
            CallEvent::PeerFailed {
                connection_id,
                error,
            } => {
                assert_eq!(error, NegotiationError::ConnectivityLost(connection_id));
                failed.push(connection_id);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    failed.sort_by_key(|id| id.to_string());
    let mut expected = vec![a.id, b.id];
    expected.sort_by_key(|id| id.to_string());
    assert_eq!(failed, expected);

    c.wait_for_peer_count(0).await;
    tokio::time::sleep(std::time::Duration::from_millis(QUIET_PERIOD_MS)).await;
    assert!(
        !matches!(c.events.try_recv(), Ok(CallEvent::PeerFailed { .. })),
        "each failure is reported once"
    );

    // Local media and the A–B session are untouched.
    assert!(c.handle.media_state().await.unwrap().mode == CallMode::Video);
    assert!(c.handle.local_tracks().await.unwrap().audio.is_some());
    assert!(a.peer(&b).await.is_some());
    assert!(b.peer(&a).await.is_some());
}

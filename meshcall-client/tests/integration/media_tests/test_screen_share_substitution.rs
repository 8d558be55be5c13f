use meshcall_client::SessionState;
use meshcall_core::RoomKey;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, TransportCall, join_in_sequence};

#[tokio::test]
async fn test_screen_share_substitution() {
    init_tracing();

    let hub = LoopbackHub::new();
    let room = RoomKey::for_group(42);
    let a = hub.participant("a");
    let b = hub.participant("b");
    let c = hub.participant("c");
    join_in_sequence(&room, &[&a, &b, &c]).await;

    let negotiations = a.transports.negotiations();
    let camera = a.handle.local_tracks().await.unwrap().camera.unwrap();

    a.handle.start_screen_share().await.unwrap();
    let screen = a.handle.local_tracks().await.unwrap().screen.unwrap();
    assert!(a.handle.media_state().await.unwrap().sharing_screen);

    for remote in [&b, &c] {
        assert_eq!(
            a.transports.last_replacement(&remote.id),
            Some(screen.id().to_owned())
        );
        assert!(!a.transports.calls_with(&remote.id).contains(&TransportCall::Close));
    }
    for peer in a.peers().await {
        assert_eq!(peer.state, SessionState::Connected);
    }

    a.handle.stop_screen_share().await.unwrap();
    assert!(screen.is_ended());
    assert!(!a.handle.media_state().await.unwrap().sharing_screen);

    for remote in [&b, &c] {
        assert_eq!(
            a.transports.last_replacement(&remote.id),
            Some(camera.id().to_owned())
        );
    }
    for peer in a.peers().await {
        assert_eq!(peer.state, SessionState::Connected);
    }
    assert_eq!(a.transports.negotiations(), negotiations);
}

use meshcall_client::CallMode;
use meshcall_core::RoomKey;

use crate::integration::init_tracing;
use crate::utils::{LoopbackHub, TransportCall};

#[tokio::test]
async fn test_late_joiner_gets_current_media() {
    init_tracing();

    let hub = LoopbackHub::new();
    let room = RoomKey::for_group(6);
    let a = hub.participant("a");
    a.handle.join(room.clone(), CallMode::Video).await.unwrap();

    a.handle.set_muted(true).await.unwrap();
    a.handle.start_screen_share().await.unwrap();
    let tracks = a.handle.local_tracks().await.unwrap();
    let audio = tracks.audio.unwrap();
    let screen = tracks.screen.unwrap();

    let b = hub.participant("b");
    b.handle.join(room.clone(), CallMode::Video).await.unwrap();
    a.wait_for_connected(1).await;

    // B's session starts out with the muted microphone and the screen, not the camera.
    assert_eq!(
        a.transports.calls_with(&b.id).first(),
        Some(&TransportCall::Attach {
            audio: Some(audio.id().to_owned()),
            video: Some(screen.id().to_owned()),
        })
    );
    assert!(!audio.is_enabled());

    // Later changes reach the new session as well.
    a.handle.stop_screen_share().await.unwrap();
    let camera = a.handle.local_tracks().await.unwrap().camera.unwrap();
    assert_eq!(
        a.transports.last_replacement(&b.id),
        Some(camera.id().to_owned())
    );
}

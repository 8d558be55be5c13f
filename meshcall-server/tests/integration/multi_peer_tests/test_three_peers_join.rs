use meshcall_core::{RoomKey, ServerMessage};

use crate::integration::{create_test_registry, init_tracing, participant};

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();

    let (rooms, signaling, _rx) = create_test_registry();
    let room = RoomKey::for_group(42);

    let a = participant("a");
    let b = participant("b");
    let c = participant("c");

    assert!(rooms.join(&room, a.clone()).is_empty());
    assert_eq!(rooms.join(&room, b.clone()), vec![a.clone()]);

    let mut c_bootstrap = rooms.join(&room, c.clone());
    c_bootstrap.sort_by_key(|p| p.user_id.clone());
    assert_eq!(c_bootstrap, vec![a.clone(), b.clone()]);

    // A hears about B then C; B hears about C; C hears nothing.
    assert_eq!(
        signaling.delivered_to(&a.connection_id),
        vec![
            ServerMessage::PeerJoined {
                room: room.clone(),
                peer: b.clone()
            },
            ServerMessage::PeerJoined {
                room: room.clone(),
                peer: c.clone()
            },
        ]
    );
    assert_eq!(
        signaling.delivered_to(&b.connection_id),
        vec![ServerMessage::PeerJoined {
            room: room.clone(),
            peer: c.clone()
        }]
    );
    assert!(signaling.delivered_to(&c.connection_id).is_empty());

    assert_eq!(rooms.participants(&room).len(), 3);
    assert_eq!(rooms.room_count(), 1);
}

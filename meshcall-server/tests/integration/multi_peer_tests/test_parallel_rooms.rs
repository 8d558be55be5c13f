use meshcall_core::RoomKey;
use std::collections::HashSet;

use crate::integration::{create_test_registry, init_tracing, participant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_rooms_converge() {
    init_tracing();

    let (rooms, _signaling, _rx) = create_test_registry();

    let mut tasks = Vec::new();
    for group in 0..8 {
        let rooms = rooms.clone();
        tasks.push(tokio::spawn(async move {
            let room = RoomKey::for_group(group);
            let mut members = Vec::new();
            for i in 0..10 {
                let p = participant(&format!("{group}-{i}"));
                rooms.join(&room, p.clone());
                members.push(p);
                tokio::task::yield_now().await;
            }
            // Half of them leave again.
            for p in members.iter().step_by(2) {
                rooms.leave(&room, &p.connection_id);
                tokio::task::yield_now().await;
            }
            members
                .into_iter()
                .skip(1)
                .step_by(2)
                .map(|p| p.connection_id)
                .collect::<HashSet<_>>()
        }));
    }

    for (group, task) in tasks.into_iter().enumerate() {
        let expected = task.await.unwrap();
        let actual: HashSet<_> = rooms
            .participants(&RoomKey::for_group(group))
            .into_iter()
            .map(|p| p.connection_id)
            .collect();
        assert_eq!(actual, expected);
    }
    assert_eq!(rooms.room_count(), 8);
}

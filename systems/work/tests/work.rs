use std::time::Duration;

use gridwalk_core::EntityId;
use gridwalk_system_work::{EntityTag, WorkAction, WorkStations, DEFAULT_COOLDOWN};

const ANIMATIONS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(3)];

#[test]
fn npc_works_for_animation_length_then_resumes() {
    let mut stations = WorkStations::default();
    let station = stations.add(1, DEFAULT_COOLDOWN);
    let worker = EntityId::new(5);

    let actions = stations
        .enter(station, worker, EntityTag::Npc, &ANIMATIONS)
        .expect("entry succeeds");
    assert_eq!(
        actions,
        vec![
            WorkAction::StopMovement { entity: worker },
            WorkAction::PlayEmote {
                entity: worker,
                emote_index: 1
            },
        ]
    );

    assert!(stations.tick(Duration::from_secs(2)).is_empty());
    assert_eq!(
        stations.tick(Duration::from_secs(1)),
        vec![WorkAction::ResumeMovement { entity: worker }]
    );
    assert!(!stations.station(station).expect("station").is_serving(worker));
}

#[test]
fn station_rejects_entries_during_cooldown() {
    let mut stations = WorkStations::default();
    let station = stations.add(0, DEFAULT_COOLDOWN);
    let npc = EntityId::new(1);
    let player = EntityId::new(2);

    let _ = stations
        .enter(station, npc, EntityTag::Npc, &ANIMATIONS)
        .expect("entry succeeds");
    let _ = stations.tick(Duration::from_secs(1));
    assert!(!stations.station(station).expect("station").is_enabled());

    let actions = stations
        .enter(station, player, EntityTag::Player, &ANIMATIONS)
        .expect("entry succeeds");
    assert!(actions.is_empty());

    let _ = stations.tick(Duration::from_secs(9));
    assert!(!stations.station(station).expect("station").is_enabled());
    let _ = stations.tick(Duration::from_secs(1));
    assert!(stations.station(station).expect("station").is_enabled());

    let actions = stations
        .enter(station, player, EntityTag::Player, &ANIMATIONS)
        .expect("entry succeeds");
    assert_eq!(actions.len(), 2);
}

#[test]
fn concurrent_workers_resume_independently() {
    let mut stations = WorkStations::default();
    let station = stations.add(0, Duration::from_secs(4));
    let early = EntityId::new(1);
    let late = EntityId::new(2);
    let lengths_late = [Duration::from_secs(2)];

    let _ = stations
        .enter(station, early, EntityTag::Npc, &ANIMATIONS)
        .expect("entry succeeds");
    let _ = stations
        .enter(station, late, EntityTag::Npc, &lengths_late)
        .expect("entry succeeds");

    assert_eq!(
        stations.tick(Duration::from_secs(1)),
        vec![WorkAction::ResumeMovement { entity: early }]
    );
    assert_eq!(
        stations.tick(Duration::from_secs(1)),
        vec![WorkAction::ResumeMovement { entity: late }]
    );

    let _ = stations.tick(Duration::from_secs(3));
    assert!(!stations.station(station).expect("station").is_enabled());
    let _ = stations.tick(Duration::from_secs(1));
    assert!(stations.station(station).expect("station").is_enabled());
}

#[test]
fn repeated_entry_while_working_is_ignored() {
    let mut stations = WorkStations::default();
    let station = stations.add(0, DEFAULT_COOLDOWN);
    let worker = EntityId::new(3);

    let _ = stations
        .enter(station, worker, EntityTag::Player, &ANIMATIONS)
        .expect("entry succeeds");
    let actions = stations
        .enter(station, worker, EntityTag::Player, &ANIMATIONS)
        .expect("entry succeeds");

    assert!(actions.is_empty());
    assert!(stations.station(station).expect("station").is_serving(worker));
}

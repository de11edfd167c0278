//! Contract: each (center, date) is announced at most once per session
//!
//! Constraints verified, across consecutive cycles through the full loop:
//! - The first sighting of a center's dates is reported
//! - An identical follow-up cycle is silent
//! - A center with one new date is re-reported with its current dates
//! - A date that disappears and later returns is not announced again

mod common;

use common::*;
use sbat_core::types::Slot;
use sbat_core::{Watcher, WatcherEvent};
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn dates_are_reported_exactly_once_per_session() {
    let authenticator = ScriptedAuthenticator::new(vec![Ok("tok-1")]);
    let source = ScriptedSlotSource::new(vec![
        // Cycle 1: Brakel publishes one date.
        FetchScript::Slots(vec![Slot::new(1, "2024-08-30T10:15:00")]),
        FetchScript::Slots(vec![]),
        // Cycle 2: identical.
        FetchScript::Slots(vec![Slot::new(1, "2024-08-30T10:15:00")]),
        FetchScript::Slots(vec![]),
        // Cycle 3: a second date appears alongside the first.
        FetchScript::Slots(vec![
            Slot::new(1, "2024-08-30T10:15:00"),
            Slot::new(2, "2024-08-31T09:20:00"),
        ]),
        FetchScript::Slots(vec![]),
        // Cycle 4: everything is booked away.
        FetchScript::Slots(vec![]),
        FetchScript::Slots(vec![]),
        // Cycle 5: the first date resurfaces, presumably a cancellation.
        FetchScript::Slots(vec![Slot::new(1, "2024-08-30T10:15:00")]),
        FetchScript::Slots(vec![]),
    ]);

    let (watcher, mut events) = Watcher::new(
        Box::new(authenticator),
        Box::new(source),
        two_center_config(),
    )
    .expect("watcher construction succeeds");

    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { watcher.run(credentials(), stop_rx).await });

    assert_eq!(next_event(&mut events).await, WatcherEvent::Started { centers: 2 });

    // Cycle 1: first sighting fires.
    let event = next_event(&mut events).await;
    let WatcherEvent::NewSlots { centers } = event else {
        panic!("expected NewSlots on first sighting, got {event:?}");
    };
    assert_eq!(centers["Brakel"], vec!["2024-08-30".to_string()]);
    assert_eq!(
        next_event(&mut events).await,
        WatcherEvent::CycleCompleted {
            centers_ok: 2,
            centers_failed: 0,
            seen_total: 1,
        }
    );

    // Cycle 2: identical data is silent.
    assert_eq!(
        next_event(&mut events).await,
        WatcherEvent::CycleCompleted {
            centers_ok: 2,
            centers_failed: 0,
            seen_total: 1,
        }
    );

    // Cycle 3: the center has a genuinely new date, so its current dates
    // are announced together.
    let event = next_event(&mut events).await;
    let WatcherEvent::NewSlots { centers } = event else {
        panic!("expected NewSlots on a new date, got {event:?}");
    };
    assert_eq!(
        centers["Brakel"],
        vec!["2024-08-30".to_string(), "2024-08-31".to_string()]
    );
    assert_eq!(
        next_event(&mut events).await,
        WatcherEvent::CycleCompleted {
            centers_ok: 2,
            centers_failed: 0,
            seen_total: 2,
        }
    );

    // Cycles 4 and 5: the disappearance and the reappearance are both
    // silent, and nothing new is counted as seen.
    for _ in 0..2 {
        assert_eq!(
            next_event(&mut events).await,
            WatcherEvent::CycleCompleted {
                centers_ok: 2,
                centers_failed: 0,
                seen_total: 2,
            }
        );
    }

    stop_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    // Drain to Stopped; any late NewSlots would be a duplicate announcement.
    loop {
        match next_event(&mut events).await {
            WatcherEvent::Stopped => break,
            WatcherEvent::CycleCompleted { .. } => continue,
            other => panic!("unexpected event after the scripted cycles: {other:?}"),
        }
    }
}

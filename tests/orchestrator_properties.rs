//! Integration tests for the shared playback state
//!
//! These tests feed arbitrary event sequences into an orchestrator and check:
//! - The aggregate playing flag always equals "any player is playing"
//! - The buffering snapshot tracks the latest state of every slot
//! - Every non-zero decoder error reaches the error stream
//! - Released players never influence the state again

mod common;

use anyhow::Result;
use common::fixed_target;
use multiview::decoder::{DecoderEvent, SimulatedDecoderFactory, SimulationScript};
use multiview::layout::Template;
use multiview::player::EventPump;
use multiview::surface::{DrawTarget, PaintableSurface, ReadinessSynchronizer};
use multiview::utils::PlaybackConfig;
use multiview::{PlayerOrchestrator, PlayerState};
use proptest::prelude::*;
use std::sync::Arc;

fn quiet_orchestrator(template: Template) -> Result<(PlayerOrchestrator, EventPump, Arc<SimulatedDecoderFactory>)> {
    let factory = Arc::new(SimulatedDecoderFactory::new(SimulationScript {
        emit_on_play: false,
        ..Default::default()
    }));
    let config = PlaybackConfig {
        autoplay: false,
        ..Default::default()
    };
    let (mut orchestrator, pump) = PlayerOrchestrator::for_template(template, factory.clone(), config);

    let sync = ReadinessSynchronizer::new(template.slot_count());
    let target: Arc<dyn DrawTarget> = fixed_target();
    for slot_index in 0..template.slot_count() {
        sync.surface_available(slot_index, PaintableSurface::new(slot_index as u64 + 1), &target)?;
    }

    orchestrator.initialize(&sync.ready_surfaces())?;
    Ok((orchestrator, pump, factory))
}

fn decoder_event() -> impl Strategy<Value = DecoderEvent> {
    prop_oneof![
        2 => Just(DecoderEvent::State(PlayerState::Buffering)),
        2 => Just(DecoderEvent::State(PlayerState::Ready)),
        4 => Just(DecoderEvent::State(PlayerState::Playing)),
        2 => Just(DecoderEvent::State(PlayerState::Paused)),
        1 => Just(DecoderEvent::State(PlayerState::Error)),
        2 => (-3i32..40).prop_map(|code| DecoderEvent::Error {
            code,
            message: format!("decoder error {}", code),
        }),
        1 => Just(DecoderEvent::Rebuffer),
        1 => Just(DecoderEvent::NetworkLost),
    ]
}

fn template() -> impl Strategy<Value = Template> {
    prop::sample::select(Template::ALL.to_vec())
}

/// Slot picks are reduced modulo the template's slot count
fn slot_events(max_len: usize) -> impl Strategy<Value = Vec<(usize, DecoderEvent)>> {
    prop::collection::vec((0usize..3, decoder_event()), 1..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aggregate_flag_tracks_any_playing(template in template(), events in slot_events(500)) {
        let (mut orchestrator, mut pump, factory) = quiet_orchestrator(template).unwrap();
        let mut playing = orchestrator.streams().playing.subscribe();
        let mut last_flag = playing.drain().last().copied().unwrap_or(false);

        for (pick, event) in events {
            let slot_index = pick % template.slot_count();
            factory.listener(slot_index).expect("listener attached").emit(event);
            orchestrator.drain_events(&mut pump);

            let any_playing = orchestrator
                .handles()
                .iter()
                .any(|handle| handle.state == PlayerState::Playing);
            prop_assert_eq!(orchestrator.is_playing(), any_playing);

            // Only state changes recompute the flag
            if let Some(flag) = playing.drain().last() {
                last_flag = *flag;
            }
            prop_assert_eq!(last_flag, any_playing);
        }
    }

    #[test]
    fn buffering_snapshot_tracks_latest_state(template in template(), events in slot_events(300)) {
        let (mut orchestrator, mut pump, factory) = quiet_orchestrator(template).unwrap();

        // Every slot starts out buffering
        let mut expected = vec![true; template.slot_count()];

        for (pick, event) in events {
            let slot_index = pick % template.slot_count();
            match &event {
                DecoderEvent::State(PlayerState::Buffering) => expected[slot_index] = true,
                DecoderEvent::State(PlayerState::Playing) => expected[slot_index] = false,
                _ => {}
            }

            factory.listener(slot_index).expect("listener attached").emit(event);
            orchestrator.drain_events(&mut pump);

            let snapshot = orchestrator.buffering();
            prop_assert_eq!(snapshot.len(), template.slot_count());
            for entry in snapshot {
                prop_assert_eq!(entry.is_buffering, expected[entry.slot_index]);
            }
        }
    }

    #[test]
    fn every_failure_reaches_the_error_stream(template in template(), events in slot_events(200)) {
        let (mut orchestrator, mut pump, factory) = quiet_orchestrator(template).unwrap();
        let mut errors = orchestrator.streams().errors.subscribe();
        let mut expected = Vec::new();

        for (pick, event) in events {
            let slot_index = pick % template.slot_count();
            if let DecoderEvent::Error { code, .. } = &event {
                if *code != 0 {
                    expected.push((slot_index, *code));
                }
            }
            factory.listener(slot_index).expect("listener attached").emit(event);
        }
        orchestrator.drain_events(&mut pump);

        let reported: Vec<(usize, i32)> = errors
            .drain()
            .iter()
            .map(|failure| (failure.slot_index, failure.code))
            .collect();
        prop_assert_eq!(reported, expected);
    }

    #[test]
    fn released_players_are_ignored(events in prop::collection::vec((0usize..2, decoder_event()), 1..100)) {
        let (mut orchestrator, mut pump, factory) = quiet_orchestrator(Template::B).unwrap();
        let listeners: Vec<_> = (0..2)
            .map(|slot_index| factory.listener(slot_index).expect("listener attached"))
            .collect();

        listeners[0].emit(DecoderEvent::State(PlayerState::Playing));
        orchestrator.drain_events(&mut pump);
        prop_assert!(orchestrator.is_playing());

        orchestrator.release();
        prop_assert!(!orchestrator.is_playing());

        let mut errors = orchestrator.streams().errors.subscribe();
        let count = events.len();
        for (slot_index, event) in events {
            listeners[slot_index].emit(event);
        }

        prop_assert_eq!(orchestrator.drain_events(&mut pump), count);
        prop_assert!(!orchestrator.is_playing());
        prop_assert_eq!(orchestrator.handle_count(), 0);
        prop_assert!(errors.try_next().is_none());
    }
}

#[tokio::test]
async fn test_failures_are_reported_per_slot() -> Result<()> {
    let factory = Arc::new(SimulatedDecoderFactory::new(SimulationScript {
        fail_create_slots: vec![1],
        fail_load_slots: vec![2],
        ..Default::default()
    }));
    let (mut orchestrator, mut pump) =
        PlayerOrchestrator::for_template(Template::A, factory, PlaybackConfig::default());
    let mut errors = orchestrator.streams().errors.subscribe();

    orchestrator.initialize(&[])?;
    orchestrator.drain_events(&mut pump);

    let failed: Vec<(usize, i32)> = errors
        .drain()
        .iter()
        .map(|failure| (failure.slot_index, failure.code))
        .collect();
    assert_eq!(failed, vec![(1, -1), (2, -1)]);

    assert_eq!(orchestrator.handle_count(), 2);
    assert_eq!(
        orchestrator.handle(2).map(|handle| handle.state),
        Some(PlayerState::Error)
    );
    assert_eq!(
        orchestrator.handle(0).map(|handle| handle.state),
        Some(PlayerState::Playing)
    );
    assert!(orchestrator.is_playing());

    Ok(())
}

//! Property-based tests for the interpreter.
//!
//! These tests use proptest to drive a small parallel machine through
//! randomly generated event sequences and check properties that must hold
//! from every reachable configuration.

use proptest::prelude::*;
use serde_json::json;
use statecraft::core::{Action, Configuration, Event, Guard, GuardRegistry};
use statecraft::definition::{MachineConfig, MachineHandle};
use statecraft::engine::{self, Outcome};

const EVENTS: [&str; 4] = ["PLAY", "NEXT", "ADJUST", "NUDGE"];

fn player() -> MachineHandle<u32> {
    let config = MachineConfig::from_value(json!({
        "id": "player",
        "type": "parallel",
        "states": {
            "playback": {
                "initial": "stopped",
                "on": { "NEXT": { "target": ".stopped", "internal": true, "actions": "rewind" } },
                "states": {
                    "stopped": { "on": { "PLAY": "playing" } },
                    "playing": {
                        "on": {
                            "PLAY": "paused",
                            "NEXT": { "target": "paused", "actions": "skip" }
                        }
                    },
                    "paused": { "on": { "PLAY": "playing" } }
                }
            },
            "volume": {
                "initial": "normal",
                "states": {
                    "normal": {
                        "on": {
                            "NUDGE": "normal",
                            "ADJUST": [
                                { "target": "loud", "cond": "high" },
                                { "target": "quiet", "cond": "low" }
                            ]
                        }
                    },
                    "loud": { "on": { "NUDGE": "loud", "ADJUST": "normal" } },
                    "quiet": { "on": { "NUDGE": "quiet", "ADJUST": "normal" } }
                }
            }
        }
    }))
    .unwrap();

    let guards = GuardRegistry::new()
        .with("high", Guard::new(|level: &u32, _: &Event| *level > 5))
        .with("low", Guard::new(|level: &u32, _: &Event| *level <= 5));
    engine::compile(&config, guards).unwrap()
}

/// Replay `events` from the initial configuration, skipping ignored ones.
fn reach(machine: &MachineHandle<u32>, level: u32, events: &[&str]) -> Configuration {
    let start = engine::initial_state(machine, &level).unwrap().configuration;
    events.iter().fold(start, |configuration, event| {
        match engine::send(machine, &configuration, &level, *event).unwrap() {
            Outcome::Transitioned(result) => result.configuration,
            Outcome::Unchanged => configuration,
        }
    })
}

prop_compose! {
    fn arbitrary_events()(
        events in prop::collection::vec(prop::sample::select(EVENTS.to_vec()), 0..16)
    ) -> Vec<&'static str> {
        events
    }
}

proptest! {
    #[test]
    fn transition_is_deterministic(
        level in 0u32..10,
        events in arbitrary_events(),
        event in prop::sample::select(EVENTS.to_vec()),
    ) {
        let machine = player();
        let configuration = reach(&machine, level, &events);
        let event = Event::new(event);

        let first = engine::transition(&machine, &configuration, &level, &event).unwrap();
        let second = engine::transition(&machine, &configuration, &level, &event).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reachable_configurations_are_valid(level in 0u32..10, events in arbitrary_events()) {
        let machine = player();
        let configuration = reach(&machine, level, &events);

        let value = engine::state_value(&machine, &configuration).unwrap();
        prop_assert_eq!(configuration.leaves().count(), 2);
        prop_assert!(value.matches("playback"));
        prop_assert!(value.matches("volume"));

        let rebuilt = engine::configuration_from_value(&machine, &value).unwrap();
        prop_assert_eq!(rebuilt, configuration);
    }

    #[test]
    fn self_transition_without_actions_is_idempotent(
        level in 0u32..10,
        events in arbitrary_events(),
    ) {
        let machine = player();
        let configuration = reach(&machine, level, &events);

        let outcome = engine::send(&machine, &configuration, &level, "NUDGE").unwrap();
        let result = outcome.into_result().unwrap();
        prop_assert_eq!(result.configuration, configuration);
        prop_assert!(result.actions.is_empty());
    }

    #[test]
    fn innermost_transition_wins(level in 0u32..10, events in arbitrary_events()) {
        let machine = player();
        let configuration = reach(&machine, level, &events);
        let was_playing = engine::matches(&machine, &configuration, "playback.playing").unwrap();

        let result = engine::send(&machine, &configuration, &level, "NEXT")
            .unwrap()
            .into_result()
            .unwrap();

        if was_playing {
            prop_assert!(result.value.matches("playback.paused"));
            prop_assert_eq!(result.actions, vec![Action::new("skip")]);
        } else {
            prop_assert!(result.value.matches("playback.stopped"));
            prop_assert_eq!(result.actions, vec![Action::new("rewind")]);
        }
    }

    #[test]
    fn first_enabled_candidate_is_selected(level in 0u32..10) {
        let machine = player();
        let start = engine::initial_state(&machine, &level).unwrap();

        let result = engine::send(&machine, &start.configuration, &level, "ADJUST")
            .unwrap()
            .into_result()
            .unwrap();

        let expected = if level > 5 { "volume.loud" } else { "volume.quiet" };
        prop_assert!(result.value.matches(expected));
    }

    #[test]
    fn unknown_event_leaves_configuration_unchanged(
        level in 0u32..10,
        events in arbitrary_events(),
        name in "[a-z]{1,8}",
    ) {
        let machine = player();
        let configuration = reach(&machine, level, &events);

        let outcome = engine::send(&machine, &configuration, &level, name.as_str()).unwrap();
        prop_assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn regions_advance_independently(level in 0u32..10, events in arbitrary_events()) {
        let machine = player();
        let configuration = reach(&machine, level, &events);
        let volume_before: Vec<String> = configuration
            .leaves()
            .filter(|leaf| leaf.starts_with("player.volume."))
            .map(str::to_string)
            .collect();

        let result = engine::send(&machine, &configuration, &level, "PLAY")
            .unwrap()
            .into_result()
            .unwrap();
        let volume_after: Vec<String> = result
            .configuration
            .leaves()
            .filter(|leaf| leaf.starts_with("player.volume."))
            .map(str::to_string)
            .collect();

        prop_assert_eq!(volume_before, volume_after);
    }
}

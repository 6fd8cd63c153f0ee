//! End-to-end scenarios: machines described as JSON or with the builder,
//! driven through the public API the way a UI layer would drive them.

use serde::{Deserialize, Serialize};
use serde_json::json;
use statecraft::builder::{simple_transition, MachineBuilder, StateBuilder, TransitionBuilder};
use statecraft::checkpoint::Checkpoint;
use statecraft::core::{Action, Configuration, Event, Guard, GuardError, GuardRegistry};
use statecraft::definition::{HistoryType, MachineConfig, MachineDefinition, MachineHandle};
use statecraft::effects::Service;
use statecraft::engine::{
    self, ConfigurationError, InterpreterError, InterpreterOptions, Outcome,
};
use std::thread;
use stillwater::prelude::*;

fn compile<C>(description: serde_json::Value, guards: GuardRegistry<C>) -> MachineHandle<C> {
    let config = MachineConfig::from_value(description).unwrap();
    engine::compile(&config, guards).unwrap()
}

fn toggle() -> MachineHandle<()> {
    compile(
        json!({
            "id": "toggle",
            "initial": "off",
            "states": {
                "off": { "on": { "TOGGLE": "on" } },
                "on": { "on": { "TOGGLE": "off" } }
            }
        }),
        GuardRegistry::new(),
    )
}

fn editor() -> MachineHandle<()> {
    compile(
        json!({
            "id": "editor",
            "initial": "edit",
            "states": {
                "edit": {
                    "initial": "empty",
                    "entry": "enterEdit",
                    "exit": "exitEdit",
                    "on": { "SAVE": "saved" },
                    "states": {
                        "empty": {
                            "entry": "showPlaceholder",
                            "exit": "hidePlaceholder",
                            "on": { "TYPE": "filled" }
                        },
                        "filled": { "on": { "CLEAR": "empty" } }
                    }
                },
                "saved": { "type": "final" }
            }
        }),
        GuardRegistry::new(),
    )
}

fn actions(kinds: &[&str]) -> Vec<Action> {
    kinds.iter().map(|kind| Action::new(*kind)).collect()
}

#[test]
fn toggle_scenario() {
    let machine = toggle();

    let start = engine::initial_state(&machine, &()).unwrap();
    assert_eq!(start.value.to_string(), "off");

    let on = engine::send(&machine, &start.configuration, &(), "TOGGLE")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(on.value.to_string(), "on");

    let off = engine::send(&machine, &on.configuration, &(), "TOGGLE")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(off.value.to_string(), "off");
    assert_eq!(off.configuration, start.configuration);

    let ignored = engine::send(&machine, &start.configuration, &(), "NOOP").unwrap();
    assert_eq!(ignored, Outcome::Unchanged);
}

#[test]
fn hierarchical_editor_scenario() {
    let machine = editor();

    let start = engine::initial_state(&machine, &()).unwrap();
    assert!(start.value.matches("edit.empty"));
    assert_eq!(start.actions, actions(&["enterEdit", "showPlaceholder"]));
    assert_eq!(
        engine::next_events(&machine, &start.configuration).unwrap(),
        vec!["SAVE".to_string(), "TYPE".to_string()]
    );

    let filled = engine::send(&machine, &start.configuration, &(), "TYPE")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(filled.value.matches("edit.filled"));
    assert_eq!(filled.actions, actions(&["hidePlaceholder"]));

    let cleared = engine::send(&machine, &filled.configuration, &(), "CLEAR")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(cleared.configuration, start.configuration);
    assert_eq!(cleared.actions, actions(&["showPlaceholder"]));

    let saved = engine::send(&machine, &filled.configuration, &(), "SAVE")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(saved.value.to_string(), "saved");
    assert_eq!(saved.actions, actions(&["exitEdit"]));
    assert!(saved.done);
    assert!(engine::is_done(&machine, &saved.configuration).unwrap());
}

#[test]
fn parallel_regions_enter_and_transition_together() {
    let machine = compile(
        json!({
            "id": "word",
            "type": "parallel",
            "states": {
                "bold": {
                    "initial": "off",
                    "states": {
                        "off": { "entry": "boldOff", "on": { "TOGGLE_BOLD": "on" } },
                        "on": { "on": { "RESET": "off" } }
                    }
                },
                "italic": {
                    "initial": "off",
                    "states": {
                        "off": { "entry": "italicOff", "on": { "TOGGLE_ITALIC": "on" } },
                        "on": { "on": { "RESET": "off" } }
                    }
                }
            }
        }),
        GuardRegistry::<()>::new(),
    );

    let start = engine::initial_state(&machine, &()).unwrap();
    assert_eq!(start.actions, actions(&["boldOff", "italicOff"]));
    assert!(start.value.matches("bold.off"));
    assert!(start.value.matches("italic.off"));

    let bold = engine::send(&machine, &start.configuration, &(), "TOGGLE_BOLD").unwrap();
    let bold = bold.into_result().unwrap();
    assert!(bold.value.matches("bold.on"));
    assert!(bold.value.matches("italic.off"));

    let both = engine::send(&machine, &bold.configuration, &(), "TOGGLE_ITALIC")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(
        both.configuration,
        Configuration::new(["word.bold.on", "word.italic.on"])
    );

    let reset = engine::send(&machine, &both.configuration, &(), "RESET")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(reset.configuration, start.configuration);
    assert_eq!(reset.actions, actions(&["boldOff", "italicOff"]));
}

const STUDIO: &str = r#"{
    "id": "studio",
    "initial": "recording",
    "states": {
        "recording": {
            "type": "parallel",
            "on": { "STOP": "idle" },
            "states": {
                "zeta": {
                    "initial": "rolling",
                    "states": { "rolling": { "entry": "enterZeta", "exit": "exitZeta" } }
                },
                "alpha": {
                    "initial": "rolling",
                    "states": { "rolling": { "entry": "enterAlpha", "exit": "exitAlpha" } }
                }
            }
        },
        "idle": {}
    }
}"#;

#[test]
fn regions_follow_declaration_order_however_the_document_is_parsed() {
    let from_text = MachineConfig::from_json(STUDIO).unwrap();
    let from_value =
        MachineConfig::from_value(serde_json::from_str::<serde_json::Value>(STUDIO).unwrap()).unwrap();
    let from_macro = MachineConfig::from_value(json!({
        "id": "studio",
        "initial": "recording",
        "states": {
            "recording": {
                "type": "parallel",
                "on": { "STOP": "idle" },
                "states": {
                    "zeta": {
                        "initial": "rolling",
                        "states": { "rolling": { "entry": "enterZeta", "exit": "exitZeta" } }
                    },
                    "alpha": {
                        "initial": "rolling",
                        "states": { "rolling": { "entry": "enterAlpha", "exit": "exitAlpha" } }
                    }
                }
            },
            "idle": {}
        }
    }))
    .unwrap();

    for config in [from_text, from_value, from_macro] {
        let machine = engine::compile(&config, GuardRegistry::<()>::new()).unwrap();

        let start = engine::initial_state(&machine, &()).unwrap();
        assert_eq!(start.actions, actions(&["enterZeta", "enterAlpha"]));

        let stopped = engine::send(&machine, &start.configuration, &(), "STOP")
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(stopped.actions, actions(&["exitAlpha", "exitZeta"]));
    }
}

fn audio_player(initial: &str) -> MachineHandle<()> {
    MachineBuilder::new("player")
        .initial(initial)
        .state(
            "audio",
            StateBuilder::compound("low")
                .state("low", StateBuilder::new().on("VOLUME", simple_transition("high")))
                .state("high", StateBuilder::new().on("VOLUME", simple_transition("low")))
                .state("hist", StateBuilder::history(HistoryType::Shallow).target("high"))
                .on("OPEN", simple_transition("settings")),
        )
        .state(
            "settings",
            StateBuilder::new().on("BACK", simple_transition("audio.hist")),
        )
        .build()
        .unwrap()
}

#[test]
fn history_restores_the_last_active_child() {
    let machine = audio_player("audio");
    let mut configuration = engine::initial_state(&machine, &()).unwrap().configuration;

    for event in ["VOLUME", "OPEN"] {
        configuration = engine::send(&machine, &configuration, &(), event)
            .unwrap()
            .into_result()
            .unwrap()
            .configuration;
    }
    assert!(engine::matches(&machine, &configuration, "settings").unwrap());
    assert!(configuration.recorded("player.audio.hist").is_some());

    let back = engine::send(&machine, &configuration, &(), "BACK")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(back.value.matches("audio.high"));
}

#[test]
fn history_falls_back_to_its_default_target() {
    let machine = audio_player("settings");
    let start = engine::initial_state(&machine, &()).unwrap();

    let back = engine::send(&machine, &start.configuration, &(), "BACK")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(back.value.matches("audio.high"));
}

#[test]
fn parallel_completion_raises_done_event() {
    let machine = compile(
        json!({
            "id": "uploader",
            "initial": "upload",
            "states": {
                "upload": {
                    "type": "parallel",
                    "onDone": { "target": "complete", "actions": "notify" },
                    "states": {
                        "file": {
                            "initial": "pending",
                            "states": {
                                "pending": { "on": { "FILE_OK": "done" } },
                                "done": { "type": "final" }
                            }
                        },
                        "thumbnail": {
                            "initial": "pending",
                            "states": {
                                "pending": { "on": { "THUMB_OK": "done" } },
                                "done": { "type": "final" }
                            }
                        }
                    }
                },
                "complete": { "type": "final" }
            }
        }),
        GuardRegistry::<()>::new(),
    );

    let start = engine::initial_state(&machine, &()).unwrap();
    let file = engine::send(&machine, &start.configuration, &(), "FILE_OK")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(file.value.matches("upload.file.done"));
    assert!(!file.done);

    let both = engine::send(&machine, &file.configuration, &(), "THUMB_OK")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(both.value.to_string(), "complete");
    assert_eq!(both.actions, actions(&["notify"]));
    assert!(both.done);
    assert!(both.microsteps >= 2);
}

#[test]
fn in_state_condition_gates_transitions_across_regions() {
    let machine = compile(
        json!({
            "id": "light",
            "type": "parallel",
            "states": {
                "power": {
                    "initial": "off",
                    "states": {
                        "off": { "on": { "POWER": "on" } },
                        "on": {}
                    }
                },
                "mode": {
                    "initial": "day",
                    "states": {
                        "day": { "on": { "DIM": { "target": "night", "in": "#light.power.on" } } },
                        "night": {}
                    }
                }
            }
        }),
        GuardRegistry::<()>::new(),
    );

    let start = engine::initial_state(&machine, &()).unwrap();
    let dim = engine::send(&machine, &start.configuration, &(), "DIM").unwrap();
    assert!(dim.is_unchanged());

    let powered = engine::send(&machine, &start.configuration, &(), "POWER")
        .unwrap()
        .into_result()
        .unwrap();
    let dim = engine::send(&machine, &powered.configuration, &(), "DIM")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(dim.value.matches("mode.night"));
}

#[test]
fn guard_failures_are_reported() {
    let guards = GuardRegistry::new().with(
        "withinLimit",
        Guard::try_new(|limit: &u64, event: &Event| {
            let amount = event
                .payload()
                .and_then(|payload| payload["amount"].as_u64())
                .ok_or_else(|| GuardError::new("payload has no amount"))?;
            Ok(amount <= *limit)
        }),
    );
    let machine = compile(
        json!({
            "id": "wallet",
            "initial": "idle",
            "states": {
                "idle": { "on": { "PAY": { "target": "paid", "cond": "withinLimit" } } },
                "paid": {}
            }
        }),
        guards,
    );
    let start = engine::initial_state(&machine, &100).unwrap();

    let error = engine::send(&machine, &start.configuration, &100, "PAY").unwrap_err();
    assert!(error.is_guard_failure());
    assert!(matches!(
        error,
        InterpreterError::GuardEvaluation { ref guard, .. } if guard == "withinLimit"
    ));

    let over = Event::new("PAY").with_payload(json!({ "amount": 500 }));
    let outcome = engine::transition(&machine, &start.configuration, &100, &over).unwrap();
    assert_eq!(outcome, Outcome::Unchanged);

    let within = Event::new("PAY").with_payload(json!({ "amount": 50 }));
    let outcome = engine::transition(&machine, &start.configuration, &100, &within).unwrap();
    assert!(outcome.result().unwrap().value.matches("paid"));
}

#[test]
fn invalid_configurations_fail_only_that_call() {
    let machine = editor();

    let unknown = Configuration::new(["editor.nowhere"]);
    assert_eq!(
        engine::send(&machine, &unknown, &(), "TYPE"),
        Err(InterpreterError::InvalidConfiguration(
            ConfigurationError::UnknownState {
                id: "editor.nowhere".to_string()
            }
        ))
    );

    let not_a_leaf = Configuration::new(["editor.edit"]);
    assert!(matches!(
        engine::send(&machine, &not_a_leaf, &(), "TYPE"),
        Err(InterpreterError::InvalidConfiguration(ConfigurationError::NotALeaf { .. }))
    ));

    let start = engine::initial_state(&machine, &()).unwrap();
    assert!(engine::send(&machine, &start.configuration, &(), "TYPE").is_ok());
}

#[test]
fn microstep_limit_is_configurable() {
    let config = MachineConfig::from_value(json!({
        "id": "relay",
        "initial": "a",
        "states": {
            "a": {
                "initial": "start",
                "onDone": "b",
                "states": {
                    "start": { "on": { "GO": "end" } },
                    "end": { "type": "final" }
                }
            },
            "b": {
                "initial": "end",
                "onDone": "c",
                "states": { "end": { "type": "final" } }
            },
            "c": {}
        }
    }))
    .unwrap();

    let relaxed = engine::compile(&config, GuardRegistry::<()>::new()).unwrap();
    let start = engine::initial_state(&relaxed, &()).unwrap();
    let result = engine::send(&relaxed, &start.configuration, &(), "GO")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(result.value.matches("c"));
    assert_eq!(result.microsteps, 3);

    let strict = MachineDefinition::compile_with_options(
        &config,
        GuardRegistry::<()>::new(),
        InterpreterOptions::new().max_microsteps(2),
    )
    .unwrap()
    .into_handle();
    assert_eq!(
        engine::send(&strict, &start.configuration, &(), "GO"),
        Err(InterpreterError::MicrostepLimit { limit: 2 })
    );
}

#[test]
fn definitions_are_shared_across_threads() {
    let machine = toggle();
    let start = engine::initial_state(&machine, &()).unwrap().configuration;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let machine = machine.clone();
            let start = start.clone();
            thread::spawn(move || {
                engine::send(&machine, &start, &(), "TOGGLE")
                    .unwrap()
                    .into_result()
                    .unwrap()
                    .configuration
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Configuration::new(["toggle.on"]));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Draft {
    text: String,
}

fn notes() -> MachineHandle<Draft> {
    MachineBuilder::new("notes")
        .initial("empty")
        .state(
            "empty",
            StateBuilder::new().on("TYPE", TransitionBuilder::new().to("filled").action("append")),
        )
        .state(
            "filled",
            StateBuilder::new()
                .on("TYPE", TransitionBuilder::new().action("append"))
                .on("CLEAR", TransitionBuilder::new().to("empty").action("clear")),
        )
        .build()
        .unwrap()
}

fn with_executors(service: Service<Draft, ()>) -> Service<Draft, ()> {
    service
        .on_action("append", |_, mut draft: Draft, event: Event| {
            if let Some(text) = event.payload().and_then(|payload| payload["text"].as_str()) {
                draft.text.push_str(text);
            }
            pure(draft).boxed()
        })
        .on_action("clear", |_, _: Draft, _: Event| pure(Draft::default()).boxed())
}

fn typed(text: &str) -> Event {
    Event::new("TYPE").with_payload(json!({ "text": text }))
}

#[tokio::test]
async fn service_runs_actions_and_survives_a_checkpoint() {
    let mut service = with_executors(Service::new(notes(), Draft::default()).unwrap());

    assert!(service.send(typed("hello"), &()).await.unwrap());
    assert!(service.send(typed(", world"), &()).await.unwrap());
    assert!(!service.send("UNDO", &()).await.unwrap());
    assert!(service.matches("filled"));
    assert_eq!(service.context().text, "hello, world");

    let json = service.checkpoint().to_json().unwrap();
    let checkpoint = Checkpoint::<Draft>::from_json(&json).unwrap();
    let mut resumed = with_executors(Service::from_checkpoint(notes(), checkpoint).unwrap());

    assert_eq!(resumed.context().text, "hello, world");
    assert_eq!(resumed.history().len(), 2);

    assert!(resumed.send("CLEAR", &()).await.unwrap());
    assert!(resumed.matches("empty"));
    assert_eq!(resumed.context(), &Draft::default());
}

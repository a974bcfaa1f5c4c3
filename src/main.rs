// SPDX-License-Identifier: GPL-3.0-only

//! Keyscroll scenario player
//!
//! Replays a JSON scenario against the simulated host and prints the final
//! viewport state as JSON. Useful for checking how a configuration reacts to
//! a sequence of keyboard events, focus changes and taps.
//!
//! ```text
//! keyscroll demos/scenario.json [config.json]
//! RUST_LOG=keyscroll=debug keyscroll demos/scenario.json
//! ```
//!
//! The handler configuration comes from the optional second argument, else
//! from the scenario's `config` object, else from `keyscroll.json` in the
//! working directory, else the defaults.

use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

use serde::{Deserialize, Serialize};

use keyscroll::app_settings;
use keyscroll::host::{Orientation, ScreenPresentation};
use keyscroll::sim::SimulatedHost;
use keyscroll::{
    ControlKind, EdgeInsets, HandlerConfig, Host, KeyboardEvent, KeyboardNotifier,
    KeyboardScrollHandler, Point, Rect, Size, TapDecision, ViewId,
};

/// A scripted session.
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: Option<HandlerConfig>,
    window: Size,
    viewport: ViewportSpec,
    #[serde(default)]
    controls: Vec<ControlSpec>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct ViewportSpec {
    frame: Rect,
    content_size: Size,
}

#[derive(Debug, Deserialize)]
struct ControlSpec {
    kind: ControlKind,
    frame: Rect,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    /// Begin editing the control at this index.
    Focus(usize),
    /// End editing the control at this index.
    Blur(usize),
    /// Deliver a keyboard event through the notifier.
    Keyboard(KeyboardEvent),
    /// Tap the viewport at a point in its content coordinates.
    Tap(Point),
    Orientation(Orientation),
}

#[derive(Debug, Serialize)]
struct Report {
    keyboard_visible: bool,
    content_inset: EdgeInsets,
    content_offset: Point,
    focused_control: Option<usize>,
    steps_replayed: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    let directive = match format!("{}=info", app_settings::LOG_TARGET)
        .parse::<tracing_subscriber::filter::Directive>()
    {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Invalid log directive: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: keyscroll <scenario.json> [config.json]");
        return ExitCode::FAILURE;
    };
    let config_path = args.next();

    match run(&path, config_path.as_deref()).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to encode report: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!("Scenario '{}' failed: {}", path, e);
            ExitCode::FAILURE
        }
    }
}

/// Picks the handler configuration for a replay.
fn resolve_config(
    config_path: Option<&str>,
    scenario_config: Option<HandlerConfig>,
) -> Result<HandlerConfig, Box<dyn Error>> {
    if let Some(path) = config_path {
        return Ok(HandlerConfig::from_file(path)?);
    }
    if let Some(config) = scenario_config {
        return Ok(config);
    }

    let local = Path::new(app_settings::CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(HandlerConfig::from_file(local)?);
    }
    Ok(HandlerConfig::default())
}

async fn run(path: &str, config_path: Option<&str>) -> Result<Report, Box<dyn Error>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let scenario: Scenario = serde_json::from_str(&contents)?;
    let config = resolve_config(config_path, scenario.config)?;
    tracing::info!(
        "Replaying {} step(s) with {} control(s)",
        scenario.steps.len(),
        scenario.controls.len()
    );

    let mut host = SimulatedHost::new();
    let root = host.add_root(Rect::new(0.0, 0.0, scenario.window.width, scenario.window.height));
    let viewport =
        host.add_scroll_view(root, scenario.viewport.frame, scenario.viewport.content_size);
    let controls: Vec<ViewId> = scenario
        .controls
        .iter()
        .map(|control| host.add_control(viewport, control.frame, control.kind))
        .collect();
    let screen = host.add_screen(root, ScreenPresentation {
        attached_to_window: true,
        ..Default::default()
    });
    host.set_primary_scroll_view(screen, viewport);

    let notifier = KeyboardNotifier::new();
    let mut handler =
        KeyboardScrollHandler::for_screen(notifier.clone(), screen).with_config(config);
    handler.on_screen_appeared();
    handler.attach_all_field_delegates(&mut host);

    let control_at = |index: usize| {
        controls
            .get(index)
            .copied()
            .ok_or_else(|| format!("no control at index {}", index))
    };

    let mut replayed = 0;
    for step in scenario.steps {
        match step {
            Step::Focus(index) => {
                let view = control_at(index)?;
                begin_editing(&mut handler, &mut host, view, scenario.controls[index].kind);
            }
            Step::Blur(index) => {
                let view = control_at(index)?;
                end_editing(&mut handler, view, scenario.controls[index].kind);
                host.end_editing(view);
            }
            Step::Keyboard(event) => {
                notifier.post(event);
                if let Some(event) = handler.next_keyboard_event().await {
                    handler.handle_keyboard_event(&mut host, event);
                }
            }
            Step::Tap(location) => {
                let decision = handler.handle_tap(&mut host, location);
                if decision == Some(TapDecision::Dismiss) {
                    if let Some(view) = host.first_responder() {
                        tracing::warn!("{:?} kept focus after dismissal", view);
                    }
                }
                tracing::info!("Tap at ({}, {}): {:?}", location.x, location.y, decision);
            }
            Step::Orientation(orientation) => host.set_orientation(orientation),
        }
        host.settle(&mut handler);
        replayed += 1;

        tracing::debug!(
            "After step {}: inset {:?}, offset {:?}",
            replayed,
            host.content_inset(viewport),
            host.content_offset(viewport)
        );
    }

    handler.on_screen_will_disappear(&mut host);
    host.settle(&mut handler);
    handler.on_screen_disappeared();

    let focused_control = handler
        .current_first_responder()
        .and_then(|view| controls.iter().position(|control| *control == view));

    Ok(Report {
        keyboard_visible: handler.is_keyboard_visible(),
        content_inset: host.content_inset(viewport),
        content_offset: host.content_offset(viewport),
        focused_control,
        steps_replayed: replayed,
    })
}

fn begin_editing(
    handler: &mut KeyboardScrollHandler,
    host: &mut SimulatedHost,
    view: ViewId,
    kind: ControlKind,
) {
    let allowed = match kind {
        ControlKind::TextField => handler.text_field_should_begin_editing(host, view),
        ControlKind::TextView => handler.text_view_should_begin_editing(host, view),
        ControlKind::SearchField => handler.search_field_should_begin_editing(host, view),
    };
    if !allowed {
        return;
    }

    host.focus(view);
    match kind {
        ControlKind::TextField => handler.text_field_did_begin_editing(host, view),
        ControlKind::TextView => handler.text_view_did_begin_editing(host, view),
        ControlKind::SearchField => handler.search_field_did_begin_editing(host, view),
    }
}

fn end_editing(handler: &mut KeyboardScrollHandler, view: ViewId, kind: ControlKind) {
    match kind {
        ControlKind::TextField => handler.text_field_did_end_editing(view),
        ControlKind::TextView => handler.text_view_did_end_editing(view),
        ControlKind::SearchField => handler.search_field_did_end_editing(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: The bundled demo scenario replays to a clean state
    #[tokio::test]
    async fn test_demo_scenario() {
        let report = run("demos/scenario.json", None).await.unwrap();

        assert_eq!(report.steps_replayed, 4);
        assert!(!report.keyboard_visible);
        assert_eq!(report.content_inset, EdgeInsets::ZERO);
        assert_eq!(report.content_offset, Point::ZERO, "Offset restored on hide");
        assert_eq!(report.focused_control, None, "Background tap dismissed the keyboard");
    }

    /// Test 2: Steps referring to missing controls fail the replay
    #[tokio::test]
    async fn test_unknown_control_index() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{
                "window": { "width": 320.0, "height": 568.0 },
                "viewport": {
                    "frame": {
                        "origin": { "x": 0.0, "y": 0.0 },
                        "size": { "width": 320.0, "height": 568.0 }
                    },
                    "content_size": { "width": 320.0, "height": 568.0 }
                },
                "steps": [{ "focus": 3 }]
            }"#,
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let err = run(&path, None).await.unwrap_err();
        assert!(err.to_string().contains("no control at index 3"));
    }

    /// Test 3: An explicit config file wins over the scenario's own config
    #[test]
    fn test_config_file_overrides_scenario() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{ "static_offset_y": 12.0 }"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let scenario_config = HandlerConfig::new().with_static_offset_y(99.0);
        let config = resolve_config(Some(&path), Some(scenario_config.clone())).unwrap();
        assert_eq!(config.static_offset_y, 12.0);

        let config = resolve_config(None, Some(scenario_config)).unwrap();
        assert_eq!(config.static_offset_y, 99.0);
    }

    /// Test 4: A missing config file is reported
    #[test]
    fn test_missing_config_file() {
        let err = resolve_config(Some("/nonexistent/keyscroll.json"), None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/keyscroll.json"));
    }
}

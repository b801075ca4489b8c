//! Dark UI CLI - development entry point
//!
//! Replays a scripted and a human-like interaction stream through the
//! detectors and prints the resulting scores. Pass a JSON settings file as
//! the first argument to try other thresholds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dark_ui_core::config::Settings;
use dark_ui_core::detection::{ActionKind, PointerEvent};
use dark_ui_core::motion::{calculate_evasion, Position};
use dark_ui_core::{BehaviorReport, BotGuard, InteractionEvent};

fn main() {
    env_logger::init();

    println!("Dark UI Core - bot-behavior heuristics");
    println!("======================================");
    println!();

    let settings = match std::env::args().nth(1) {
        Some(path) => match load_settings(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let mut guard = BotGuard::new(settings.clone());
    for event in scripted_stream() {
        guard.observe(&event);
    }
    print_report("Scripted stream", &guard.report());

    guard.reset();
    let mut rng = StdRng::seed_from_u64(2024);
    for event in human_stream(&mut rng) {
        guard.observe(&event);
    }
    print_report("Human-like stream", &guard.report());

    let button = Position::new(400.0, 300.0);
    let cursor = Position::new(370.0, 290.0);
    let evasion = calculate_evasion(button, cursor, &settings.evasion);
    println!("Evasion check:");
    println!("  - Cursor distance: {:.1}", evasion.distance);
    match evasion.new_position {
        Some(p) => println!("  - Button flees to: ({:.1}, {:.1})", p.x, p.y),
        None => println!("  - Button stays put"),
    }
}

fn load_settings(path: &str) -> Result<Settings, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(Settings::from_json(&json)?)
}

/// Straight lines, fixed cadence, identical clicks, instant reactions
fn scripted_stream() -> Vec<InteractionEvent> {
    let mut events = Vec::new();
    for i in 0..20 {
        let t = i as f64 * 40.0;
        events.push(InteractionEvent::PointerMove(
            PointerEvent::new(i as f64 * 12.0, i as f64 * 6.0).at(t),
        ));
    }
    for i in 0..9 {
        let t = 1000.0 + i as f64 * 300.0;
        events.push(InteractionEvent::Stimulus { timestamp: Some(t) });
        events.push(InteractionEvent::Response {
            kind: "click".to_string(),
            timestamp: Some(t + 25.0),
        });
        events.push(InteractionEvent::Click(
            PointerEvent::new(250.0, 180.0).at(t + 25.0).on("submit"),
        ));
        let kind = match i % 3 {
            0 => ActionKind::Hover,
            1 => ActionKind::Focus,
            _ => ActionKind::Keypress,
        };
        events.push(InteractionEvent::Action {
            kind,
            timestamp: Some(t + 100.0),
        });
    }
    events
}

/// Wobbly paths, irregular cadence, scattered clicks, slow reactions
fn human_stream(rng: &mut StdRng) -> Vec<InteractionEvent> {
    let mut events = Vec::new();
    let mut t = 0.0;
    for i in 0..20 {
        t += rng.gen_range(8.0..45.0);
        let x = i as f64 * 12.0 + rng.gen_range(-6.0..6.0);
        let y = i as f64 * 6.0 + rng.gen_range(-6.0..6.0);
        events.push(InteractionEvent::PointerMove(PointerEvent::new(x, y).at(t)));
    }
    let kinds = [
        "hover", "click", "scroll", "hover", "keypress", "click", "focus",
    ];
    for kind in kinds {
        t += rng.gen_range(300.0..900.0);
        events.push(InteractionEvent::Stimulus { timestamp: Some(t) });
        let reaction = rng.gen_range(180.0..450.0);
        events.push(InteractionEvent::Response {
            kind: "click".to_string(),
            timestamp: Some(t + reaction),
        });
        events.push(InteractionEvent::Click(
            PointerEvent::new(rng.gen_range(200.0..300.0), rng.gen_range(150.0..210.0))
                .at(t + reaction),
        ));
        events.push(InteractionEvent::Action {
            kind: ActionKind::from(kind),
            timestamp: Some(t + reaction + rng.gen_range(50.0..400.0)),
        });
    }
    events
}

fn print_report(title: &str, report: &BehaviorReport) {
    println!("{}:", title);
    println!(
        "  - Movement: {:.3} (flagged: {})",
        report.movement.score, report.movement.flagged
    );
    println!(
        "  - Clicks:   {:.3} (flagged: {})",
        report.clicks.score, report.clicks.flagged
    );
    println!(
        "  - Timing:   {:.3} (flagged: {})",
        report.timing.score, report.timing.flagged
    );
    println!(
        "  - Pattern:  {:.3} (flagged: {})",
        report.pattern.score, report.pattern.flagged
    );
    println!("  - Suspicious: {}", report.suspicious);
    println!();
}

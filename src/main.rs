//! Meteorite Protection System entry point
//!
//! Runs the game in the terminal (mouse driven) or headless with a scripted
//! pilot for a fixed number of frames.

use std::error::Error;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::{
    ExecutableCommand, cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    terminal,
};
use glam::Vec2;
use serde::Serialize;

use meteorite_protection::Settings;
use meteorite_protection::consts::{FRAME_DT, MAX_STEPS_PER_FRAME};
use meteorite_protection::renderer::{RenderOptions, TerminalCanvas, build_frame};
use meteorite_protection::settings::QualityPreset;
use meteorite_protection::sim::{GamePhase, GameState, TickInput, tick};

/// Settings file used when `--settings` is not given
const DEFAULT_SETTINGS_PATH: &str = "meteorite.json";
/// Longest host frame fed to the accumulator
const MAX_FRAME_DELTA: f32 = 0.1;

#[derive(Debug, Default)]
struct Args {
    headless: Option<u64>,
    seed: Option<u64>,
    quality: Option<QualityPreset>,
    settings: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            let mut value = |name: &str| args.next().ok_or(format!("{name} needs a value"));
            match arg.as_str() {
                "--headless" => {
                    let frames = value("--headless")?;
                    parsed.headless =
                        Some(frames.parse().map_err(|_| format!("bad frame count: {frames}"))?);
                }
                "--seed" => {
                    let seed = value("--seed")?;
                    parsed.seed = Some(seed.parse().map_err(|_| format!("bad seed: {seed}"))?);
                }
                "--quality" => {
                    let name = value("--quality")?;
                    parsed.quality = Some(
                        QualityPreset::parse(&name).ok_or(format!("unknown quality: {name}"))?,
                    );
                }
                "--settings" => parsed.settings = Some(PathBuf::from(value("--settings")?)),
                "-h" | "--help" => {
                    return Err(
                        "usage: meteorite-protection [--headless FRAMES] [--seed N] [--quality low|medium|high] [--settings PATH]"
                            .into(),
                    );
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(parsed)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse(std::env::args().skip(1))?;
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let mut settings = Settings::load_or_default(&settings_path);
    if let Some(quality) = args.quality {
        settings.apply_preset(quality);
    }

    let seed = args.seed.or(settings.seed).unwrap_or_else(time_seed);
    log::info!(
        "Meteorite Protection System starting (seed {seed}, quality {})",
        settings.quality.as_str()
    );

    let mut state = GameState::new(seed, settings.bounds());
    state.set_max_stars(settings.max_stars());

    match args.headless {
        Some(frames) => run_headless(&mut state, frames),
        None => run_terminal(&mut state, &settings),
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ── Headless ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HeadlessSummary {
    seed: u64,
    frames: u64,
    rounds: u32,
    score: u64,
    high_score: u64,
    ratio: f32,
    rank: f32,
    phase: GamePhase,
}

/// Pointer path for the scripted pilot: a slow loop around the left half
fn pilot_pointer(state: &GameState) -> Vec2 {
    let t = state.time;
    let b = state.bounds;
    Vec2::new(
        b.width * (0.25 + 0.2 * (t * 0.7).sin()),
        b.height * (0.5 + 0.35 * (t * 1.3).cos()),
    )
}

fn run_headless(state: &mut GameState, frames: u64) -> Result<(), Box<dyn Error>> {
    let mut rounds = 0;
    for _ in 0..frames {
        let start = state.phase == GamePhase::Title;
        if start {
            rounds += 1;
        }
        let input = TickInput {
            pointer: Some(pilot_pointer(state)),
            primary_pressed: start,
        };
        tick(state, &input, FRAME_DT)?;
    }

    let summary = HeadlessSummary {
        seed: state.seed,
        frames,
        rounds,
        score: state.score,
        high_score: state.high_score.max(state.score),
        ratio: state.ratio,
        rank: state.rank,
        phase: state.phase,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// ── Terminal ─────────────────────────────────────────────────────────────────

fn run_terminal(state: &mut GameState, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let mut out = BufWriter::new(stdout());

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Blocking reads live on their own thread so the frame loop never waits
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = game_loop(&mut out, state, settings, &rx);

    // Always restore the terminal
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if result.is_ok() {
        log::info!(
            "Session over: high score {}",
            state.high_score.max(state.score)
        );
    }
    result
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    settings: &Settings,
    rx: &mpsc::Receiver<Event>,
) -> Result<(), Box<dyn Error>> {
    let (cols, rows) = terminal::size()?;
    let mut canvas = TerminalCanvas::new(cols, rows, state.bounds);
    let options = RenderOptions::from(settings);
    let frame_budget = Duration::from_secs_f32(1.0 / settings.target_fps as f32);

    let mut input = TickInput::default();
    let mut accumulator = 0.0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();

        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(key) if is_quit(&key) => return Ok(()),
                Event::Mouse(MouseEvent {
                    kind, column, row, ..
                }) => {
                    input.pointer = Some(canvas.to_logical(column, row));
                    if kind == MouseEventKind::Down(MouseButton::Left) {
                        input.primary_pressed = true;
                    }
                }
                Event::Resize(cols, rows) => canvas.resize(cols, rows),
                _ => {}
            }
        }

        let dt = last.elapsed().as_secs_f32().min(MAX_FRAME_DELTA);
        last = Instant::now();
        accumulator += dt;

        let mut steps = 0;
        while accumulator >= FRAME_DT && steps < MAX_STEPS_PER_FRAME {
            tick(state, &input, FRAME_DT)?;
            accumulator -= FRAME_DT;
            steps += 1;

            // Clicks are edges; consume after one tick
            input.primary_pressed = false;
        }
        if steps == MAX_STEPS_PER_FRAME {
            accumulator = 0.0;
        }

        canvas.draw(&build_frame(state, &options));
        canvas.flush(out)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--headless", "600", "--seed", "42"]).unwrap();
        assert_eq!(parsed.headless, Some(600));
        assert_eq!(parsed.seed, Some(42));
        assert!(parsed.settings.is_none());

        let parsed = args(&["--quality", "LOW"]).unwrap();
        assert_eq!(parsed.quality, Some(QualityPreset::Low));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--seed"]).is_err());
        assert!(args(&["--seed", "abc"]).is_err());
        assert!(args(&["--fullscreen"]).is_err());
        assert!(args(&["--quality", "ultra"]).is_err());
    }

    #[test]
    fn test_headless_run_starts_a_round() {
        let mut state = GameState::new(5, Default::default());
        run_headless(&mut state, 120).unwrap();
        assert_ne!(state.phase, GamePhase::Title);
        assert!(state.round_time > 0.0 || matches!(state.phase, GamePhase::PlayerDead { .. }));
    }
}

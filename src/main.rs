/// Entry point and game loop.

mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};

use pitrunner::sim::save;
use pitrunner::sim::score::ScoreBoard;
use pitrunner::{logging, GameConfig, GameEvent, LevelSet, WorldState};
use ui::input::{Command, InputState};
use ui::renderer::{HudInfo, Renderer};
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "pitrunner.log";
const BLANK_WIDTH: usize = 20;
const BLANK_HEIGHT: usize = 10;

/// Dig pits, dodge pursuers and collect every coin.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level file (JSON); overrides the config
    #[arg(short, long)]
    levels: Option<PathBuf>,

    /// Level to start on, 1-based
    #[arg(long, default_value_t = 1)]
    level: usize,

    /// Append a blank level to the level file and start on it
    #[arg(long)]
    new_level: bool,

    /// Remove level N (1-based) from the level file and exit
    #[arg(long, value_name = "N")]
    delete_level: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Everything the loop owns besides the terminal.
struct Session {
    config: GameConfig,
    levels: LevelSet,
    scores: ScoreBoard,
    world: WorldState,
    status: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, std::fs::File::create(LOG_FILE).ok());

    let config = GameConfig::load(args.config.as_deref());
    let levels_path = args.levels.unwrap_or_else(|| config.levels_file.clone());
    let mut levels = LevelSet::load(&levels_path).context("loading levels")?;
    if args.level > 1 && !levels.select(args.level - 1) {
        log::warn!("level {} does not exist; starting at 1", args.level);
    }
    if let Some(n) = args.delete_level {
        anyhow::ensure!((1..=levels.len()).contains(&n), "level {n} does not exist");
        levels.select(n - 1);
        anyhow::ensure!(levels.delete_current(), "cannot delete the only level");
        levels.save(&levels_path).context("saving levels")?;
        println!("Deleted level {n}; {} left", levels.len());
        return Ok(());
    }
    if args.new_level {
        levels.create_blank(BLANK_WIDTH, BLANK_HEIGHT);
        levels.save(&levels_path).context("saving levels")?;
    }
    let scores = ScoreBoard::load(&config.scores_file).unwrap_or_else(|e| {
        log::warn!("{e}; scores start empty");
        ScoreBoard::in_memory()
    });
    let world = WorldState::from_level(levels.current(), levels.current_index(), config.physics.clone())
        .context("building level")?;

    let mut session = Session { config, levels, scores, world, status: None };
    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;
    let mut input = InputState::new();
    if terminal::supports_keyboard_enhancement().unwrap_or(false) {
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        input.honor_release = execute!(std::io::stdout(), PushKeyboardEnhancementFlags(flags)).is_ok();
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut session, &mut renderer, &mut input, sound.as_ref());

    if input.honor_release {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    if let Some(best) = session.scores.best(session.world.level_index) {
        println!("Best time on {}: {}", session.levels.current().name, ui::renderer::fmt_ms(best));
    }
    Ok(())
}

fn game_loop(
    s: &mut Session,
    renderer: &mut Renderer,
    input: &mut InputState,
    sound: Option<&SoundEngine>,
) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(s.config.physics.tick_rate_ms.max(1));
    let mut last_tick = Instant::now();
    let mut pending = input.frame_input(s.world.player_cell());

    loop {
        input.drain_events();
        if handle_commands(s, &input.commands()) {
            return Ok(());
        }

        // Latch edge-triggered actions until the next tick consumes them.
        let fresh = input.frame_input(s.world.player_cell());
        pending.keys = fresh.keys;
        pending.fire |= fresh.fire;
        pending.dig_at = fresh.dig_at.or(pending.dig_at);

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            let events = pitrunner::step(&mut s.world, pending);
            pending.fire = false;
            pending.dig_at = None;
            handle_events(s, &events, sound);
        }

        let hud = HudInfo {
            level_name: &s.levels.current().name,
            level_count: s.levels.len(),
            best_ms: s.scores.best(s.world.level_index),
            status: s.status.as_deref(),
        };
        renderer.render(&s.world, &hud)?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

fn handle_events(s: &mut Session, events: &[GameEvent], sound: Option<&SoundEngine>) {
    for ev in events {
        if let (Some(engine), Some(sfx)) = (sound, Sfx::for_event(ev)) {
            engine.play(sfx);
        }
        if let GameEvent::LevelCompleted { elapsed_ms } = *ev {
            if let Err(e) = s.scores.record(s.world.level_index, elapsed_ms) {
                log::warn!("could not record score: {e}");
            }
        }
    }
}

/// Returns true when the player asked to quit.
fn handle_commands(s: &mut Session, commands: &[Command]) -> bool {
    for cmd in commands {
        match cmd {
            Command::Quit => return true,
            Command::Pause => s.world.toggle_pause(),
            Command::Restart => {
                pitrunner::restart_level(&mut s.world);
                s.status = None;
            }
            Command::NextLevel => {
                if s.levels.next() {
                    switch_level(s);
                }
            }
            Command::PrevLevel => {
                if s.levels.prev() {
                    switch_level(s);
                }
            }
            Command::QuickSave => {
                s.status = Some(match save::save_quick(&s.config.save_dir, &s.world) {
                    Ok(_) => "saved".to_string(),
                    Err(e) => {
                        log::warn!("{e}");
                        "save failed".to_string()
                    }
                });
            }
            Command::QuickLoad => {
                s.status = Some(quick_load(s));
            }
        }
    }
    false
}

fn quick_load(s: &mut Session) -> String {
    match save::load_quick(&s.config.save_dir, s.world.level_index) {
        Ok(Some(snap)) => match save::restore_snapshot(&mut s.world, &snap) {
            Ok(()) => "loaded".to_string(),
            Err(e) => {
                log::warn!("{e}");
                "save does not match this level".to_string()
            }
        },
        Ok(None) => "no quicksave for this level".to_string(),
        Err(e) => {
            log::warn!("{e}");
            "load failed".to_string()
        }
    }
}

fn switch_level(s: &mut Session) {
    let physics = s.config.physics.clone();
    match WorldState::from_level(s.levels.current(), s.levels.current_index(), physics) {
        Ok(world) => {
            s.world = world;
            s.status = None;
        }
        Err(e) => {
            log::error!("{e}");
            s.status = Some(format!("level {} is broken", s.levels.current_index() + 1));
        }
    }
}

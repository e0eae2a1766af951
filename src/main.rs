//! Block Dodge headless driver
//!
//! Runs the simulation core without a renderer: opens the data directory,
//! makes sure a profile exists, and plays level 1 with a simple autopilot.
//!
//! Usage: `block-dodge [TICKS]` (default one minute of game time).
//! `BLOCK_DODGE_DATA_DIR` selects the data directory.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use block_dodge::consts::*;
use block_dodge::sim::{Direction, GameEvent, SessionState};
use block_dodge::{Command, CommandError, GameContext, GameController, View};

const DATA_DIR_ENV: &str = "BLOCK_DODGE_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "./block-dodge-data";
const DEFAULT_PROFILE: &str = "player";

/// Steer away from the closest obstacle above the player, fire always
fn autopilot(session: &SessionState) -> Direction {
    let player = session.player.rect();
    let (left, right) = (player.min().x, player.max().x);
    let threat = session
        .obstacles
        .iter()
        .map(|o| o.rect())
        .filter(|r| r.max().x > left - PLAYER_SIZE && r.min().x < right + PLAYER_SIZE)
        .filter(|r| r.max().y <= player.min().y)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    match threat {
        Some(r) if r.center().x >= player.center().x && left > PLAYER_SIZE => Direction::Left,
        Some(_) if right < FIELD_WIDTH - PLAYER_SIZE => Direction::Right,
        Some(_) => Direction::Left,
        None => Direction::None,
    }
}

fn run(ticks: u64) -> Result<(), CommandError> {
    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let clock_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    log::info!("Data directory: {}", data_dir.display());
    let ctx = GameContext::open(&data_dir, clock_seed);
    let mut game = GameController::new(ctx);

    if game.view() == View::ProfileCreation {
        game.apply(Command::CreateProfile(DEFAULT_PROFILE.to_string()))?;
    }
    game.apply(Command::Play)?;
    if game.view() == View::ContinuePrompt {
        game.apply(Command::DeclineContinue)?;
    }
    game.apply(Command::SelectLevel(1))?;

    let mut shots = 0u32;
    let mut destroyed = 0u32;
    for _ in 0..ticks {
        let direction = game.session().map(autopilot).unwrap_or_default();
        game.apply(Command::Move(direction))?;
        game.apply(Command::Fire)?;

        for event in game.frame() {
            match event {
                GameEvent::ShotFired => shots += 1,
                GameEvent::ObstacleDestroyed { .. } => destroyed += 1,
                GameEvent::CollisionAbsorbed { remaining, .. } => {
                    log::info!("Hit! {remaining} immunity left");
                }
                GameEvent::GameOver => log::info!("Game over"),
                GameEvent::LevelCleared { level } => log::info!("Level {level} cleared"),
                _ => {}
            }
        }

        let finished = game
            .session()
            .is_none_or(|s| s.game_over() || s.cleared());
        if finished {
            break;
        }
    }

    let snapshot = game.snapshot();
    if let Some(session) = &snapshot.session {
        log::info!(
            "Level {} ({}): score {:.1}, {}/{} obstacles, {shots} shots, {destroyed} destroyed",
            session.level,
            session.difficulty,
            session.score,
            session.obstacles_generated,
            session.obstacles_target,
        );
    }
    log::info!(
        "Profile {:?}, levels unlocked: {}",
        snapshot.profile.as_deref().unwrap_or("-"),
        snapshot.max_unlocked_level
    );
    if let Some(profile) = game.context().store.active_profile() {
        match profile.scores.highest_level() {
            Some(level) => log::info!(
                "Best scores: {:.1} total, highest cleared level {level}",
                profile.scores.total()
            ),
            None => log::info!("No cleared levels yet"),
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Block Dodge (headless) starting...");

    let ticks = match std::env::args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => u64::from(TICK_RATE) * 60,
        Some(Ok(ticks)) => ticks,
        Some(Err(e)) => {
            log::error!("Invalid tick count: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(ticks) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

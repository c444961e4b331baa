pub mod types;
pub mod errors;
pub mod config;
pub mod seeding;
pub mod progression;
pub mod elimination;
pub mod double_elim;
pub mod round_robin;
pub mod roster;
pub mod standings;
pub mod session;
pub mod export;
pub mod commands;

use types::*;
use config::*;
use errors::{AppError, AppResult};
use session::{BracketSession, SessionOptions};
use commands::{load_script, run_script};
use export::{export_session, write_export};

use chrono::Local;
use std::{fs, path::Path};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── Roster file ────────────────────────────────────────────────────────

pub fn load_roster_file(path: &Path) -> AppResult<Vec<RosterEntry>> {
    let data = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("read roster {}", path.display()), e))?;
    serde_json::from_str(&data)
        .map_err(|e| AppError::json(format!("parse roster {}", path.display()), e))
}

pub fn add_roster_entries(session: &mut BracketSession, entries: &[RosterEntry]) -> AppResult<()> {
    for entry in entries {
        let id = session.add_participant(&entry.name, entry.score)?;
        if let Some(category) = entry.category.as_deref() {
            session.set_participant_category(id, category)?;
        }
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────

/// Builds a session from the configured roster, generates the bracket, replays
/// the configured result script and writes the export.
pub fn run_session(config: &AppConfig) -> AppResult<BracketSession> {
    let mut session = BracketSession::with_options(SessionOptions {
        third_place_match: config.third_place_match,
    });

    if !config.roster_path.trim().is_empty() {
        let entries = load_roster_file(Path::new(&config.roster_path))?;
        add_roster_entries(&mut session, &entries)?;
        info!(participants = entries.len(), "loaded roster");
    }
    if config.seed_by_score {
        session.seed_by_score();
    }
    if !session.participants().is_empty() {
        session.generate(config.format)?;
    }

    if !config.script_path.trim().is_empty() {
        let commands = load_script(Path::new(&config.script_path))?;
        let applied = run_script(&mut session, &commands)?;
        info!(applied, "applied result script");
    }

    match session.standings() {
        Ok(standings) => {
            for standing in standings {
                info!(
                    name = %standing.name,
                    seed = standing.seed,
                    wins = standing.wins,
                    losses = standing.losses,
                    status = ?standing.status,
                    "standing"
                );
            }
        }
        Err(e) => warn!("{e}"),
    }
    Ok(session)
}

pub fn run() -> AppResult<()> {
    let loaded = load_env_file()?;
    let config = load_config_inner()?;

    let logs_dir = Path::new(&config.logs_dir);
    fs::create_dir_all(logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(logs_dir, "octomatch.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!(competition = %config.competition_name, format = %config.format, "OctoMatch starting");
    if loaded > 0 {
        info!(keys = loaded, "loaded .env");
    }
    log_env_warnings(&config);

    let session = run_session(&config)?;
    let export = export_session(&session, &config.competition_name);
    let path = write_export(Path::new(&config.output_dir), &export, Local::now().date_naive())?;
    println!("{}", path.display());
    Ok(())
}

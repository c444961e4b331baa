use crate::errors::{AppError, AppResult};
use crate::types::*;
use std::{
  env, fs,
  path::{Path, PathBuf},
};

pub const CONFIG_FILE_NAME: &str = "octomatch.json";

pub fn config_path() -> PathBuf {
  env_default("OCTOMATCH_CONFIG")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn parse_flag(value: &str) -> bool {
  let value = value.trim().to_ascii_lowercase();
  matches!(value.as_str(), "1" | "true" | "yes" | "on")
}

pub fn env_flag_true_default(key: &str, default: bool) -> bool {
  match env::var(key) {
    Ok(value) => parse_flag(&value),
    Err(_) => default,
  }
}

/// Fills empty path fields from the environment and lets flags and the format be
/// overridden outright.
pub fn apply_env_defaults(mut config: AppConfig) -> AppResult<AppConfig> {
  if config.roster_path.trim().is_empty() {
    if let Some(value) = env_default("OCTOMATCH_ROSTER") {
      config.roster_path = value;
    }
  }
  if config.script_path.trim().is_empty() {
    if let Some(value) = env_default("OCTOMATCH_SCRIPT") {
      config.script_path = value;
    }
  }
  if let Some(value) = env_default("OCTOMATCH_OUTPUT_DIR") {
    config.output_dir = value;
  }
  if let Some(value) = env_default("OCTOMATCH_LOGS_DIR") {
    config.logs_dir = value;
  }
  if let Some(value) = env_default("OCTOMATCH_FORMAT") {
    config.format = value
      .parse()
      .map_err(|e| AppError::Config(format!("OCTOMATCH_FORMAT: {e}")))?;
  }
  config.seed_by_score = env_flag_true_default("OCTOMATCH_SEED_BY_SCORE", config.seed_by_score);
  config.third_place_match = env_flag_true_default("OCTOMATCH_THIRD_PLACE", config.third_place_match);
  Ok(config)
}

pub fn load_config_from(path: &Path) -> AppResult<AppConfig> {
  if !path.is_file() {
    return apply_env_defaults(AppConfig::default());
  }
  let data = fs::read_to_string(path).map_err(|e| AppError::io(format!("read config {}", path.display()), e))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(|e| AppError::json(format!("parse config {}", path.display()), e))?;
  apply_env_defaults(config)
}

pub fn load_config_inner() -> AppResult<AppConfig> {
  load_config_from(&config_path())
}

pub fn load_env_file() -> AppResult<usize> {
  load_env_file_from(Path::new(".env"))
}

/// Exports `KEY=value` lines into the process environment. Variables that are
/// already set win over the file. Returns how many keys the file supplied.
pub fn load_env_file_from(env_path: &Path) -> AppResult<usize> {
  if !env_path.is_file() {
    return Ok(0);
  }
  let contents =
    fs::read_to_string(env_path).map_err(|e| AppError::io(format!("read env file {}", env_path.display()), e))?;
  let mut loaded = 0;
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(&key).is_none() {
      env::set_var(&key, value);
      loaded += 1;
    }
  }
  Ok(loaded)
}

/// Splits one `.env` line into key and value. Blank lines, comments and lines
/// without a key yield nothing.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let line = line.strip_prefix("export ").unwrap_or(line);
  let (key, value) = line.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  Some((key.to_string(), unquote(value.trim()).to_string()))
}

/// Quoted values are taken verbatim; bare values end at a `#` comment.
fn unquote(value: &str) -> &str {
  for quote in ['"', '\''] {
    if let Some(inner) = value.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
      return inner;
    }
  }
  value.split('#').next().unwrap_or_default().trim_end()
}

pub fn log_env_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();

  if config.roster_path.trim().is_empty() {
    warnings.push("OCTOMATCH_ROSTER not set and no roster path in config; starting with an empty roster");
  }
  if config.script_path.trim().is_empty() {
    warnings.push("OCTOMATCH_SCRIPT not set and no script path in config; no results will be recorded");
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}

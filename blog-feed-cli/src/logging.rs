use std::io::IsTerminal;

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Фильтр логов: `RUST_LOG`, затем уровень из настроек, затем `info`.
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Логи пишутся в stderr без времени: stdout занят выводом команд,
/// в том числе JSON. Цвета только для терминала.
pub fn init_logging(default_level: &str) -> Result<()> {
    let stderr = std::io::stderr();
    let ansi = stderr.is_terminal();

    fmt()
        .with_env_filter(build_filter(default_level))
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .without_time()
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

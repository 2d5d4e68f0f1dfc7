//! # Dash Runner
//!
//! Host do dashboard: carrega as preferências, roda o simulador de
//! telemetria e registra um resumo por segundo.
//!
//! ## Uso
//! ```bash
//! dash_runner                          # Simulação contínua
//! dash_runner --duration 30            # Para após 30 s
//! dash_runner --export prefs.json      # Exporta preferências e sai
//! dash_runner --import prefs.json      # Importa preferências e sai
//! dash_runner --reset                  # Restaura os padrões e sai
//! ```

use clap::Parser;
use crossbeam_channel::{select, tick};
use dash_core::alerts::{AlertLevel, estimated_laps, evaluate_alerts, fuel_percent, shift_light};
use dash_core::events::TelemetryEvent;
use dash_core::units::{convert_speed, convert_temperature, format_delta, format_lap_time};
use dash_core::{DashConfig, FileStore, KeyValueStore, MemoryStore, SettingsStore, TelemetryStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Host headless do dashboard de telemetria.
#[derive(Debug, Parser)]
#[command(name = "dash_runner", version)]
#[command(about = "Roda o simulador de telemetria e administra as preferências do dashboard")]
struct Args {
    /// Para a simulação após N segundos
    #[arg(long, value_name = "SECS", value_parser = parse_duration)]
    duration: Option<Duration>,

    /// Exporta as preferências para o arquivo e sai
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Importa as preferências do arquivo e sai
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Restaura as preferências padrão e sai
    #[arg(long)]
    reset: bool,
}

impl Args {
    fn is_admin_command(&self) -> bool {
        self.export.is_some() || self.import.is_some() || self.reset
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("duração inválida: {value}"))?;
    if secs <= 0.0 || !secs.is_finite() {
        return Err(format!("duração deve ser positiva: {value}"));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn main() -> ExitCode {
    let args = Args::parse();

    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = DashConfig::default_path();
    let config = DashConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config: {e}");
        }
        return ExitCode::FAILURE;
    }

    // ── Preferências ──
    let storage_dir = config.storage_dir(&DashConfig::base_dir());
    let storage: Arc<dyn KeyValueStore> = match FileStore::open(&storage_dir) {
        Ok(store) => {
            info!("Preferências em {}", store.dir().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!("Armazenamento indisponível ({e}), usando memória");
            Arc::new(MemoryStore::new())
        }
    };
    let settings = SettingsStore::load(storage);

    if args.is_admin_command() {
        return match run_admin(&args, &settings) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    // ── Telemetria ──
    let interval = config.simulation.interval();
    let telemetry = match config.simulation.seed() {
        Some(seed) => TelemetryStore::with_seed(interval, seed),
        None => TelemetryStore::new(interval),
    };

    if !config.simulation.autostart && args.duration.is_none() {
        info!("Simulação desabilitada (autostart = false), nada a fazer");
        return ExitCode::SUCCESS;
    }

    let events = telemetry.subscribe();
    if let Err(e) = telemetry.start_simulation() {
        error!("Falha ao iniciar a simulação: {e}");
        return ExitCode::FAILURE;
    }

    let deadline = args.duration.map(|d| Instant::now() + d);
    let ticker = tick(Duration::from_secs(1));
    let mut updates = 0u64;

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(TelemetryEvent::Updated) => updates += 1,
                Ok(other) => debug!("Evento: {other:?}"),
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                log_summary(&telemetry, &settings, &config, updates);
                updates = 0;
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
            }
        }
    }

    telemetry.stop_simulation();
    info!("Simulação encerrada");
    ExitCode::SUCCESS
}

/// Comandos que só mexem nas preferências.
fn run_admin(args: &Args, settings: &SettingsStore) -> Result<(), String> {
    if args.reset {
        settings.reset_settings();
    }

    if let Some(path) = &args.import {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Erro ao ler {}: {e}", path.display()))?;
        settings
            .import_settings(&text)
            .map_err(|e| format!("Importação falhou: {e}"))?;
        info!("Preferências importadas de {}", path.display());
    }

    if let Some(path) = &args.export {
        let json = settings.export_settings().map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| format!("Erro ao gravar {}: {e}", path.display()))?;
        info!("Preferências exportadas para {}", path.display());
    }

    Ok(())
}

fn log_summary(telemetry: &TelemetryStore, settings: &SettingsStore, config: &DashConfig, updates: u64) {
    let state = telemetry.snapshot();
    let Some(snapshot) = state.telemetry else {
        return;
    };
    let units = settings.settings().units;

    let (speed, speed_unit) = convert_speed(snapshot.speed, &units);
    let (engine, temp_unit) = convert_temperature(snapshot.engine_temp, &units);
    let shift = if shift_light(&snapshot, &config.alerts) { " [SHIFT]" } else { "" };

    info!(
        "{speed:>5.0} {speed_unit} | {:>4.0} rpm{shift} | marcha {} | motor {engine:.0}{temp_unit} | comb. {:.1}% (~{} voltas) | volta {} ({}) | {} pkts, {updates}/s",
        snapshot.rpm,
        snapshot.gear,
        fuel_percent(&snapshot),
        estimated_laps(snapshot.fuel_level),
        format_lap_time(snapshot.lap_time),
        format_delta(snapshot.delta),
        state.connection.packets_received,
    );

    for alert in evaluate_alerts(&snapshot, &config.alerts) {
        match alert.level {
            AlertLevel::Critical => warn!("CRÍTICO {}: {:.1}{}", alert.label, alert.value, alert.unit),
            AlertLevel::Warning => info!("Aviso {}: {:.1}{}", alert.label, alert.value, alert.unit),
            AlertLevel::Normal => {}
        }
    }
}

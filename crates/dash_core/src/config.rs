//! Configuração do host via TOML.
//!
//! Um único `config.toml` ao lado do executável. Campos ausentes recebem
//! o valor padrão.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Erros ao gravar a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao gravar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuração do simulador.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Período entre ticks (ms)
    pub interval_ms: u64,
    /// Semente do gerador (0 = aleatória)
    pub seed: u64,
    /// Iniciar a simulação junto com o host
    pub autostart: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            seed: 0,
            autostart: true,
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn seed(&self) -> Option<u64> {
        (self.seed != 0).then_some(self.seed)
    }
}

/// Onde as preferências são persistidas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Diretório relativo ao executável (ou absoluto)
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: "data".into() }
    }
}

/// Feed ao vivo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Segundos sem frames até marcar desconectado
    pub timeout_secs: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { timeout_secs: 5.0 }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.max(0.0))
    }
}

/// Thresholds de alerta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub fuel_warning_percent: f32,
    pub fuel_critical_percent: f32,
    pub tire_temp_warning: f32,
    pub tire_temp_critical: f32,
    pub tire_wear_warning: f32,
    pub tire_wear_critical: f32,
    pub engine_temp_warning: f32,
    pub engine_temp_critical: f32,
    /// Fração do rpm máximo que acende a luz de troca
    pub shift_light_ratio: f32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            fuel_warning_percent: 25.0,
            fuel_critical_percent: 10.0,
            tire_temp_warning: 100.0,
            tire_temp_critical: 120.0,
            tire_wear_warning: 0.5,
            tire_wear_critical: 0.8,
            engine_temp_warning: 105.0,
            engine_temp_critical: 110.0,
            shift_light_ratio: 0.95,
        }
    }
}

/// Configuração raiz do host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub simulation: SimulationConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
    pub alerts: AlertThresholds,
}

impl DashConfig {
    /// Carrega o `config.toml`; arquivo ausente ou inválido dá os padrões.
    pub fn load(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<DashConfig>(&content)
                .inspect_err(|e| warn!("Config {} inválida, usando padrões: {e}", path.display()))
                .unwrap_or_default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} ausente, usando padrões", path.display());
                DashConfig::default()
            }
            Err(e) => {
                warn!("Erro ao ler {}: {e}", path.display());
                DashConfig::default()
            }
        };

        info!(
            "Simulação a cada {} ms (semente {}), preferências em '{}', timeout do feed {:.1}s",
            config.simulation.interval_ms,
            config.simulation.seed().map_or("aleatória".to_string(), |s| s.to_string()),
            config.storage.dir,
            config.feed.timeout_secs,
        );
        config
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Diretório do executável (ou `.`).
    pub fn base_dir() -> PathBuf {
        std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Diretório de armazenamento resolvido contra `base`.
    pub fn storage_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.storage.dir)
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(10..=1000).contains(&self.simulation.interval_ms) {
            errors.push(format!(
                "Intervalo da simulação inválido: {} ms (10–1000)",
                self.simulation.interval_ms
            ));
        }
        if self.feed.timeout_secs <= 0.0 {
            errors.push(format!(
                "Timeout do feed inválido: {}s",
                self.feed.timeout_secs
            ));
        }
        if self.storage.dir.trim().is_empty() {
            errors.push("Diretório de armazenamento vazio".into());
        }

        let a = &self.alerts;
        // Combustível: crítico fica abaixo do aviso
        if a.fuel_critical_percent > a.fuel_warning_percent {
            errors.push("Combustível: crítico deve ser ≤ aviso".into());
        }
        for (name, warn, crit) in [
            ("Pneu temp", a.tire_temp_warning, a.tire_temp_critical),
            ("Pneu desgaste", a.tire_wear_warning, a.tire_wear_critical),
            ("Motor temp", a.engine_temp_warning, a.engine_temp_critical),
        ] {
            if warn > crit {
                errors.push(format!("{name}: aviso ({warn}) acima do crítico ({crit})"));
            }
        }

        errors
    }
}

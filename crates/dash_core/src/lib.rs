//! # Dash Core
//!
//! Núcleo do dashboard de telemetria de corrida: modelo de dados,
//! containers de estado, simulador de telemetria e persistência de
//! preferências.
//!
//! ## Módulos
//! - [`types`] – Snapshot de telemetria, patches e status de conexão
//! - [`telemetry_store`] – Container de telemetria + loop de simulação
//! - [`simulator`] – Gerador de formas de onda com jitter
//! - [`task`] – Tarefa periódica com token de cancelamento
//! - [`events`] – Assinaturas (observers) via channels
//! - [`settings`] – Preferências, controles do carro e widgets
//! - [`settings_store`] – Container de preferências com import/export
//! - [`storage`] – Armazenamento chave-valor durável
//! - [`protocol`] – Frames binários para o feed ao vivo
//! - [`feed`] – Adaptador do feed ao vivo para o container
//! - [`alerts`] – Thresholds e níveis de alerta
//! - [`units`] – Conversão de unidades e formatação de tempos
//! - [`config`] – Configuração do host via TOML

/// Merge-patch campo a campo: `Some(v)` sobrescreve, `None` mantém.
macro_rules! merge_fields {
    ($target:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone();
            }
        )*
    };
}

pub mod types;
pub mod simulator;
pub mod task;
pub mod events;
pub mod telemetry_store;
pub mod settings;
pub mod storage;
pub mod settings_store;
pub mod protocol;
pub mod feed;
pub mod alerts;
pub mod units;
pub mod config;

// Re-exports convenientes
pub use types::{ConnectionStatus, ConnectionStatusPatch, TelemetryPatch, TelemetrySnapshot};
pub use telemetry_store::{TelemetryState, TelemetryStore};
pub use settings::{AppSettings, CarControls, WidgetConfig};
pub use settings_store::{SettingsError, SettingsStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use config::DashConfig;

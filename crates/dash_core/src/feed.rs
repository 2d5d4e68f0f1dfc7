//! Adaptador do feed ao vivo para o container de telemetria.
//!
//! Recebe frames já lidos do transporte, aplica os patches e mantém o
//! status de conexão (latência, perdas, timeout, mensagem de erro).

use crate::protocol::{ProtocolError, decode_patch};
use crate::telemetry_store::TelemetryStore;
use crate::types::ConnectionStatusPatch;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tempo sem frames até considerar a fonte desconectada.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LiveFeed {
    store: TelemetryStore,
    timeout: Duration,
    last_frame: Option<Instant>,
}

impl LiveFeed {
    pub fn new(store: TelemetryStore, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            last_frame: None,
        }
    }

    /// Decodifica e aplica um frame recebido em `now`.
    ///
    /// Retorna `Ok(false)` quando o frame é ignorado porque o simulador está
    /// ativo (ele é o único escritor enquanto roda). Frames inválidos contam
    /// como perdidos e deixam a mensagem no status.
    pub fn ingest(&mut self, frame: &[u8], now: Instant) -> Result<bool, ProtocolError> {
        let patch = match decode_patch(frame) {
            Ok(patch) => patch,
            Err(e) => {
                let lost = self.store.connection_status().packets_lost + 1;
                self.store.update_connection_status(&ConnectionStatusPatch {
                    packets_lost: Some(lost),
                    error: Some(Some(e.to_string())),
                    ..Default::default()
                });
                debug!("Frame inválido descartado: {e}");
                return Err(e);
            }
        };

        if self.store.is_simulating() {
            debug!("Simulação ativa, ignorando frame do feed");
            return Ok(false);
        }

        let status = self.store.connection_status();
        if !status.connected || status.error.is_some() {
            info!("Feed ao vivo conectado");
            self.store.update_connection_status(&ConnectionStatusPatch {
                connected: Some(true),
                error: Some(None),
                ..Default::default()
            });
        }

        self.store.update_telemetry(&patch);
        self.last_frame = Some(now);
        Ok(true)
    }

    /// Latência medida pelo transporte (ms).
    pub fn report_latency(&self, latency_ms: f32) {
        self.store.update_connection_status(&ConnectionStatusPatch {
            latency: Some(latency_ms),
            ..Default::default()
        });
    }

    /// Marca a fonte como desconectada se não chega frame há mais que o
    /// timeout. Retorna `true` quando a transição aconteceu agora.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_frame else {
            return false;
        };
        let silent = now.saturating_duration_since(last);
        if silent <= self.timeout || !self.store.connection_status().connected {
            return false;
        }

        warn!("Sem dados do feed há {:.1}s", silent.as_secs_f64());
        self.store.update_connection_status(&ConnectionStatusPatch::error(format!(
            "Sem dados há {:.1}s",
            silent.as_secs_f64()
        )));
        true
    }

    /// Encerramento voluntário da fonte.
    pub fn disconnect(&mut self) {
        self.last_frame = None;
        self.store.update_connection_status(&ConnectionStatusPatch::connected(false));
        info!("Feed ao vivo desconectado");
    }
}

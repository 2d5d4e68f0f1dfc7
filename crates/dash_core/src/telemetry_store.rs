//! Container de telemetria.
//!
//! Dono exclusivo do snapshot mais recente, do status de conexão e da
//! flag de simulação. Leitores sempre recebem uma cópia consistente
//! (o merge acontece inteiro sob o lock).

use crate::events::{Subscribers, TelemetryEvent};
use crate::simulator::Simulator;
use crate::task::{CancellationToken, PeriodicTask};
use crate::types::{ConnectionStatus, ConnectionStatusPatch, TelemetryPatch, TelemetrySnapshot};
use chrono::Utc;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// Período padrão do simulador (20 Hz).
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Cópia do estado observável do container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryState {
    /// `None` até o primeiro update ou após `reset_data`
    pub telemetry: Option<TelemetrySnapshot>,
    pub connection: ConnectionStatus,
    pub is_simulating: bool,
}

struct Inner {
    state: TelemetryState,
    simulation: Option<PeriodicTask>,
}

struct Shared {
    inner: Mutex<Inner>,
    subscribers: Subscribers<TelemetryEvent>,
    interval: Duration,
    seed: Option<u64>,
}

/// Handle do container de telemetria (clone barato, mesmo estado).
#[derive(Clone)]
pub struct TelemetryStore {
    shared: Arc<Shared>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl TelemetryStore {
    /// Cria um container vazio com o período de simulação dado.
    pub fn new(interval: Duration) -> Self {
        Self::build(interval, None)
    }

    /// Container cujo simulador usa semente fixa.
    pub fn with_seed(interval: Duration, seed: u64) -> Self {
        Self::build(interval, Some(seed))
    }

    fn build(interval: Duration, seed: Option<u64>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: TelemetryState::default(),
                    simulation: None,
                }),
                subscribers: Subscribers::new(),
                interval,
                seed,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    // ──────────────────────────────────────────
    // Leitura
    // ──────────────────────────────────────────

    pub fn snapshot(&self) -> TelemetryState {
        self.shared.inner.lock().state.clone()
    }

    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        self.shared.inner.lock().state.telemetry.clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.inner.lock().state.connection.clone()
    }

    pub fn is_simulating(&self) -> bool {
        self.shared.inner.lock().state.is_simulating
    }

    /// Registra um observer de mudanças.
    pub fn subscribe(&self) -> Receiver<TelemetryEvent> {
        self.shared.subscribers.subscribe()
    }

    // ──────────────────────────────────────────
    // Escrita
    // ──────────────────────────────────────────

    /// Aplica um patch parcial ao snapshot atual (ou ao padrão, se não
    /// houver). Incrementa `packets_received` e atualiza `last_update`.
    pub fn update_telemetry(&self, patch: &TelemetryPatch) {
        {
            let mut inner = self.shared.inner.lock();
            apply_telemetry(&mut inner.state, patch, now_ms());
        }
        self.shared.subscribers.publish(TelemetryEvent::Updated);
    }

    /// Merge-patch no status de conexão.
    pub fn update_connection_status(&self, patch: &ConnectionStatusPatch) {
        self.shared.inner.lock().state.connection.apply(patch);
        self.shared.subscribers.publish(TelemetryEvent::ConnectionChanged);
    }

    /// Inicia o simulador. Idempotente: se já existe uma simulação ativa,
    /// nada acontece.
    pub fn start_simulation(&self) -> std::io::Result<()> {
        {
            let mut inner = self.shared.inner.lock();
            let running = inner
                .simulation
                .as_ref()
                .is_some_and(|task| !task.token().is_cancelled() && !task.is_finished());
            if inner.state.is_simulating && running {
                debug!("Simulação já ativa, ignorando start");
                return Ok(());
            }
            if let Some(stale) = inner.simulation.take() {
                stale.cancel();
            }

            let task = self.spawn_simulation()?;
            inner.simulation = Some(task);

            let now = now_ms();
            inner.state.is_simulating = true;
            inner.state.telemetry = Some(TelemetrySnapshot::default());
            inner.state.connection.connected = true;
            inner.state.connection.last_update = now;
        }

        info!("Simulação iniciada ({} ms por tick)", self.shared.interval.as_millis());
        self.shared.subscribers.publish(TelemetryEvent::SimulationStarted);
        self.shared.subscribers.publish(TelemetryEvent::ConnectionChanged);
        Ok(())
    }

    /// Para o simulador e marca a conexão como desconectada. O último
    /// snapshot continua visível.
    pub fn stop_simulation(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if let Some(task) = inner.simulation.take() {
                task.cancel();
            }
            inner.state.is_simulating = false;
            inner.state.connection = ConnectionStatus::default();
        }

        info!("Simulação parada");
        self.shared.subscribers.publish(TelemetryEvent::SimulationStopped);
        self.shared.subscribers.publish(TelemetryEvent::ConnectionChanged);
    }

    /// Limpa snapshot e status e para a simulação.
    pub fn reset_data(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if let Some(task) = inner.simulation.take() {
                task.cancel();
            }
            inner.state = TelemetryState::default();
        }

        info!("Dados de telemetria resetados");
        self.shared.subscribers.publish(TelemetryEvent::Reset);
    }

    fn spawn_simulation(&self) -> std::io::Result<PeriodicTask> {
        let mut simulator = match self.shared.seed {
            Some(seed) => Simulator::with_seed(seed),
            None => Simulator::new(),
        };
        // Weak: a tarefa não mantém o container vivo sozinha
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);

        PeriodicTask::spawn(
            "telemetry-sim",
            self.shared.interval,
            CancellationToken::new(),
            move |token| match weak.upgrade() {
                Some(shared) => shared.simulation_tick(&mut simulator, token),
                None => ControlFlow::Break(()),
            },
        )
    }
}

impl Shared {
    fn simulation_tick(&self, simulator: &mut Simulator, token: &CancellationToken) -> ControlFlow<()> {
        {
            let mut inner = self.inner.lock();
            // Checado sob o lock: nenhum write depois de stop/reset retornar
            if token.is_cancelled() || !inner.state.is_simulating {
                return ControlFlow::Break(());
            }

            let now = now_ms();
            let patch = {
                let current = inner.state.telemetry.get_or_insert_with(TelemetrySnapshot::default);
                simulator.next_patch(now as f64 / 1000.0, now, current)
            };
            apply_telemetry(&mut inner.state, &patch, now);
        }

        self.subscribers.publish(TelemetryEvent::Updated);
        ControlFlow::Continue(())
    }
}

fn apply_telemetry(state: &mut TelemetryState, patch: &TelemetryPatch, now: i64) {
    state
        .telemetry
        .get_or_insert_with(TelemetrySnapshot::default)
        .apply(patch);
    state.connection.last_update = now;
    state.connection.packets_received += 1;
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::derive_gear;
    use std::thread::sleep;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn first_update_falls_back_to_default_snapshot() {
        let store = TelemetryStore::new(TICK);
        assert!(store.telemetry().is_none());

        store.update_telemetry(&TelemetryPatch {
            speed: Some(180.0),
            ..Default::default()
        });

        let s = store.telemetry().unwrap();
        assert_eq!(s.speed, 180.0);
        assert_eq!(s.rpm, TelemetrySnapshot::default().rpm);
        assert_eq!(s.fuel_level, TelemetrySnapshot::default().fuel_level);
    }

    #[test]
    fn update_keeps_prior_values_for_absent_fields() {
        let store = TelemetryStore::new(TICK);
        store.update_telemetry(&TelemetryPatch {
            rpm: Some(7200.0),
            gear: Some(5),
            ..Default::default()
        });
        store.update_telemetry(&TelemetryPatch {
            speed: Some(240.0),
            ..Default::default()
        });

        let s = store.telemetry().unwrap();
        assert_eq!(s.speed, 240.0);
        assert_eq!(s.rpm, 7200.0);
        assert_eq!(s.gear, 5);
    }

    #[test]
    fn update_counts_packets_and_stamps_time() {
        let store = TelemetryStore::new(TICK);
        let before = now_ms();
        for _ in 0..3 {
            store.update_telemetry(&TelemetryPatch::default());
        }
        let status = store.connection_status();
        assert_eq!(status.packets_received, 3);
        assert!(status.last_update >= before);
    }

    #[test]
    fn connection_patch_touches_only_given_fields() {
        let store = TelemetryStore::new(TICK);
        store.update_telemetry(&TelemetryPatch::default());
        store.update_connection_status(&ConnectionStatusPatch {
            latency: Some(12.5),
            ..Default::default()
        });
        let status = store.connection_status();
        assert_eq!(status.latency, 12.5);
        assert_eq!(status.packets_received, 1);
        assert!(!status.connected);
    }

    #[test]
    fn start_seeds_default_and_marks_connected() {
        let store = TelemetryStore::new(Duration::from_secs(60));
        store.update_telemetry(&TelemetryPatch {
            fuel_level: Some(3.0),
            ..Default::default()
        });
        store.start_simulation().unwrap();

        let state = store.snapshot();
        assert!(state.is_simulating);
        assert!(state.connection.connected);
        assert_eq!(state.telemetry, Some(TelemetrySnapshot::default()));
        store.stop_simulation();
    }

    #[test]
    fn double_start_runs_a_single_generator() {
        let store = TelemetryStore::with_seed(TICK, 1);
        store.start_simulation().unwrap();
        store.start_simulation().unwrap();

        sleep(TICK * 25);
        let received = store.connection_status().packets_received;
        store.stop_simulation();

        // Um gerador faz no máximo ~25 ticks nessa janela; dois fariam ~50
        assert!(received > 0);
        assert!(received <= 30, "recebidos {received}");
    }

    #[test]
    fn stop_halts_updates_and_keeps_last_snapshot() {
        let store = TelemetryStore::with_seed(TICK, 2);
        store.start_simulation().unwrap();
        sleep(TICK * 5);
        store.stop_simulation();

        let frozen = store.snapshot();
        assert!(!frozen.is_simulating);
        assert!(!frozen.connection.connected);
        assert!(frozen.telemetry.is_some());

        sleep(TICK * 3);
        let later = store.snapshot();
        assert_eq!(later.connection.packets_received, frozen.connection.packets_received);
        assert_eq!(later.telemetry, frozen.telemetry);
    }

    #[test]
    fn restart_after_stop_does_not_leak_old_generator() {
        let store = TelemetryStore::with_seed(TICK, 3);
        store.start_simulation().unwrap();
        store.stop_simulation();
        store.start_simulation().unwrap();

        sleep(TICK * 25);
        let received = store.connection_status().packets_received;
        store.stop_simulation();
        assert!(received <= 30, "recebidos {received}");
    }

    #[test]
    fn simulation_keeps_gear_and_fuel_invariants() {
        let store = TelemetryStore::with_seed(TICK, 4);
        let rx = store.subscribe();
        store.start_simulation().unwrap();

        let mut last_fuel = f32::MAX;
        let mut seen = 0;
        while seen < 10 {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(TelemetryEvent::Updated) => {
                    let s = store.telemetry().unwrap();
                    assert!(s.fuel_level <= last_fuel);
                    assert!(s.fuel_level >= 0.0);
                    if s.speed > 0.0 {
                        assert_eq!(s.gear, derive_gear(s.speed));
                    }
                    last_fuel = s.fuel_level;
                    seen += 1;
                }
                Ok(_) => {}
                Err(e) => panic!("sem ticks do simulador: {e}"),
            }
        }
        store.stop_simulation();
    }

    #[test]
    fn reset_clears_everything() {
        let store = TelemetryStore::with_seed(TICK, 5);
        store.start_simulation().unwrap();
        sleep(TICK * 2);
        store.reset_data();

        assert_eq!(store.snapshot(), TelemetryState::default());
        sleep(TICK * 3);
        assert_eq!(store.snapshot(), TelemetryState::default());
    }

    #[test]
    fn observers_are_notified() {
        let store = TelemetryStore::new(TICK);
        let rx = store.subscribe();
        store.update_telemetry(&TelemetryPatch::default());
        store.reset_data();
        assert_eq!(rx.try_recv(), Ok(TelemetryEvent::Updated));
        assert_eq!(rx.try_recv(), Ok(TelemetryEvent::Reset));
    }

    #[test]
    fn dropping_all_handles_ends_simulation_thread() {
        let store = TelemetryStore::new(TICK);
        store.start_simulation().unwrap();
        let weak = Arc::downgrade(&store.shared);
        drop(store);
        sleep(TICK * 3);
        assert!(weak.upgrade().is_none());
    }
}

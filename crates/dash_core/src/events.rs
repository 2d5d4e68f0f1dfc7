//! Assinaturas de mudanças de estado via channels.
//!
//! Cada observer recebe um `Receiver` próprio. O envio nunca bloqueia:
//! se o observer está lento e o buffer encheu, o evento é descartado;
//! receivers desconectados são removidos no próximo publish.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use tracing::debug;

/// Buffer por observer.
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Evento emitido pelo container de telemetria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Novo snapshot aplicado
    Updated,
    /// Status de conexão alterado
    ConnectionChanged,
    SimulationStarted,
    SimulationStopped,
    /// Snapshot e status zerados
    Reset,
}

/// Evento emitido pelo container de preferências.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    SettingsChanged,
    ControlsChanged,
    WidgetsChanged,
    /// Tudo restaurado aos padrões
    Reset,
    /// Documento importado
    Imported,
}

/// Lista de observers de um container.
pub struct Subscribers<E> {
    senders: Mutex<Vec<Sender<E>>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um novo observer.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        self.senders.lock().push(tx);
        rx
    }

    /// Entrega o evento a todos os observers sem bloquear.
    pub fn publish(&self, event: E) {
        self.senders.lock().retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Observer lento, descartando evento");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_event() {
        let subs = Subscribers::new();
        let a = subs.subscribe();
        let b = subs.subscribe();
        subs.publish(TelemetryEvent::Updated);
        assert_eq!(a.try_recv(), Ok(TelemetryEvent::Updated));
        assert_eq!(b.try_recv(), Ok(TelemetryEvent::Updated));
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let subs = Subscribers::new();
        let keep = subs.subscribe();
        drop(subs.subscribe());
        assert_eq!(subs.len(), 2);
        subs.publish(SettingsEvent::Reset);
        assert_eq!(subs.len(), 1);
        assert_eq!(keep.try_recv(), Ok(SettingsEvent::Reset));
    }

    #[test]
    fn full_buffer_drops_instead_of_blocking() {
        let subs = Subscribers::new();
        let rx = subs.subscribe();
        for _ in 0..SUBSCRIBER_BUFFER + 10 {
            subs.publish(TelemetryEvent::Updated);
        }
        assert_eq!(rx.len(), SUBSCRIBER_BUFFER);
        assert_eq!(subs.len(), 1);
    }
}

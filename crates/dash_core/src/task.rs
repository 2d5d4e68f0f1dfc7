//! Tarefa periódica com cancelamento cooperativo.
//!
//! O token é verificado uma vez por tick, antes do callback. Um `stop`
//! nunca bloqueia: o tick em voo ainda acorda, observa o token e encerra.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Token de cancelamento compartilhado entre quem agenda e a tarefa.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle de uma tarefa periódica. Dropar o handle não para a tarefa;
/// use o token.
pub struct PeriodicTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Agenda `tick` a cada `period` numa thread dedicada.
    ///
    /// O callback recebe o próprio token (para checagens sob lock) e pode
    /// se desregistrar retornando `ControlFlow::Break`.
    pub fn spawn<F>(
        name: &str,
        period: Duration,
        token: CancellationToken,
        mut tick: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(&CancellationToken) -> ControlFlow<()> + Send + 'static,
    {
        let task_token = token.clone();
        let thread_name = name.to_string();
        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut ticks: u64 = 0;
                let mut last_cost = Duration::ZERO;
                loop {
                    // Dormir pelo tempo restante do período
                    std::thread::sleep(period.saturating_sub(last_cost));

                    if task_token.is_cancelled() {
                        break;
                    }
                    let cycle_start = Instant::now();
                    if tick(&task_token).is_break() {
                        break;
                    }
                    last_cost = cycle_start.elapsed();
                    ticks += 1;
                }
                debug!("Tarefa {thread_name} encerrada após {ticks} ticks");
            })?;

        Ok(Self { token, handle })
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancela e espera a thread terminar (no máximo um período).
    pub fn join(self) {
        self.token.cancel();
        let _ = self.handle.join();
    }
}

//! Simulador de telemetria – gera patches realistas sem fonte ao vivo.
//!
//! Cada campo simulado segue
//! `clamp(base + amplitude * sin(t * freq) + U(-jitter, jitter), min, max)`.
//! A marcha é derivada da velocidade e o combustível só diminui.

use crate::types::{TelemetryPatch, TelemetrySnapshot, WheelArray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Duração do ciclo de volta simulado (ms).
pub const LAP_CYCLE_MS: i64 = 120_000;

/// Consumo de combustível por tick (litros).
pub const FUEL_PER_TICK: f32 = 0.02;

/// Velocidade por marcha usada na derivação (km/h).
const SPEED_PER_GEAR: f32 = 25.0;
const MIN_GEAR: i32 = 1;
const MAX_GEAR: i32 = 6;

/// Forma de onda de um campo simulado.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    pub base: f64,
    pub amplitude: f64,
    pub freq: f64,
    pub jitter: f64,
    pub min: f64,
    pub max: f64,
}

impl Waveform {
    /// Valor determinístico (sem jitter) no instante `t` (segundos).
    pub fn value_at(&self, t: f64) -> f64 {
        self.base + self.amplitude * (t * self.freq).sin()
    }

    /// Amostra com jitter uniforme, limitada a `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, t: f64, rng: &mut R) -> f64 {
        let noise = if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        (self.value_at(t) + noise).clamp(self.min, self.max)
    }
}

pub const SPEED: Waveform = Waveform {
    base: 125.0,
    amplitude: 80.0,
    freq: 0.3,
    jitter: 5.0,
    min: 0.0,
    max: 350.0,
};

pub const RPM: Waveform = Waveform {
    base: 3100.0,
    amplitude: 2000.0,
    freq: 0.5,
    jitter: 100.0,
    min: 800.0,
    max: 8000.0,
};

pub const THROTTLE: Waveform = Waveform {
    base: 0.65,
    amplitude: 0.3,
    freq: 0.4,
    jitter: 0.05,
    min: 0.0,
    max: 1.0,
};

pub const STEER: Waveform = Waveform {
    base: 0.05,
    amplitude: 0.5,
    freq: 0.2,
    jitter: 0.05,
    min: -1.0,
    max: 1.0,
};

pub const ENGINE_TEMP: Waveform = Waveform {
    base: 86.0,
    amplitude: 10.0,
    freq: 0.1,
    jitter: 1.0,
    min: 70.0,
    max: 110.0,
};

/// Pressão do freio quando o gate está aberto.
pub const BRAKE: Waveform = Waveform {
    base: 0.9,
    amplitude: 0.0,
    freq: 0.0,
    jitter: 0.1,
    min: 0.0,
    max: 1.0,
};

/// O freio só atua na crista de `sin(t * BRAKE_GATE_FREQ)`.
pub const BRAKE_GATE_FREQ: f64 = 0.7;
pub const BRAKE_GATE_LEVEL: f64 = 0.7;

/// Temperatura dos pneus por roda (FL, FR, RL, RR).
pub const TIRE_TEMP: [Waveform; 4] = [
    Waveform { base: 85.0, amplitude: 10.0, freq: 0.15, jitter: 2.0, min: 40.0, max: 120.0 },
    Waveform { base: 85.0, amplitude: 10.0, freq: 0.16, jitter: 2.0, min: 40.0, max: 120.0 },
    Waveform { base: 80.0, amplitude: 8.0, freq: 0.14, jitter: 2.0, min: 40.0, max: 120.0 },
    Waveform { base: 80.0, amplitude: 8.0, freq: 0.13, jitter: 2.0, min: 40.0, max: 120.0 },
];

/// Marcha derivada da velocidade: `clamp(floor(speed / 25), 1, 6)`.
pub fn derive_gear(speed: f32) -> i32 {
    ((speed / SPEED_PER_GEAR).floor() as i32).clamp(MIN_GEAR, MAX_GEAR)
}

/// Gerador de telemetria simulada.
pub struct Simulator {
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Simulador com semente aleatória.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Simulador reprodutível (mesma semente → mesma sequência).
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Calcula o próximo patch.
    ///
    /// `t` é o tempo de parede em segundos (entrada das formas de onda),
    /// `wall_ms` o mesmo instante em ms (ciclo de volta) e `current` o
    /// snapshot atual (combustível e eventos de TC/ABS dependem dele).
    pub fn next_patch(&mut self, t: f64, wall_ms: i64, current: &TelemetrySnapshot) -> TelemetryPatch {
        let rng = &mut self.rng;

        let speed = SPEED.sample(t, rng) as f32;
        let brake = if (t * BRAKE_GATE_FREQ).sin() > BRAKE_GATE_LEVEL {
            BRAKE.sample(t, rng) as f32
        } else {
            0.0
        };

        let mut tire_temp: WheelArray = [0.0; 4];
        for (slot, wave) in tire_temp.iter_mut().zip(TIRE_TEMP.iter()) {
            *slot = wave.sample(t, rng) as f32;
        }

        let tc_cut = current.throttle > 0.8 && rng.gen_bool(0.1);
        let abs_in_action = current.brake > 0.5 && rng.gen_bool(0.2);

        TelemetryPatch {
            speed: Some(speed),
            rpm: Some(RPM.sample(t, rng) as f32),
            throttle: Some(THROTTLE.sample(t, rng) as f32),
            brake: Some(brake),
            steer: Some(STEER.sample(t, rng) as f32),
            gear: Some(derive_gear(speed)),
            lap_time: Some(wall_ms.rem_euclid(LAP_CYCLE_MS) as u32),
            tire_temp: Some(tire_temp),
            engine_temp: Some(ENGINE_TEMP.sample(t, rng) as f32),
            fuel_level: Some((current.fuel_level - FUEL_PER_TICK).max(0.0)),
            tc_cut: Some(tc_cut),
            abs_in_action: Some(abs_in_action),
            ..Default::default()
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sim: &mut Simulator, ticks: usize) -> Vec<TelemetrySnapshot> {
        let mut current = TelemetrySnapshot::default();
        let mut out = Vec::with_capacity(ticks);
        for i in 0..ticks {
            let wall_ms = 1_700_000_000_000 + (i as i64) * 50;
            let patch = sim.next_patch(wall_ms as f64 / 1000.0, wall_ms, &current);
            current.apply(&patch);
            out.push(current.clone());
        }
        out
    }

    #[test]
    fn waveform_without_jitter_is_deterministic() {
        let wave = Waveform {
            base: 10.0,
            amplitude: 2.0,
            freq: 1.0,
            jitter: 0.0,
            min: 0.0,
            max: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let t = std::f64::consts::FRAC_PI_2;
        assert!((wave.sample(t, &mut rng) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn waveform_is_clamped() {
        let wave = Waveform {
            base: 0.0,
            amplitude: 500.0,
            freq: 1.0,
            jitter: 50.0,
            min: -1.0,
            max: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..1000 {
            let v = wave.sample(i as f64 * 0.01, &mut rng);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn same_seed_reproduces_sequence() {
        let a = run(&mut Simulator::with_seed(42), 100);
        let b = run(&mut Simulator::with_seed(42), 100);
        assert_eq!(a, b);
    }

    #[test]
    fn simulated_fields_stay_within_bounds() {
        for s in run(&mut Simulator::with_seed(3), 2000) {
            assert!((0.0..=350.0).contains(&s.speed));
            assert!((800.0..=8000.0).contains(&s.rpm));
            assert!((0.0..=1.0).contains(&s.throttle));
            assert!((0.0..=1.0).contains(&s.brake));
            assert!((-1.0..=1.0).contains(&s.steer));
            assert!((70.0..=110.0).contains(&s.engine_temp));
            assert!(s.tire_temp.iter().all(|t| (40.0..=120.0).contains(t)));
            assert!(s.lap_time < LAP_CYCLE_MS as u32);
        }
    }

    #[test]
    fn gear_follows_speed() {
        for s in run(&mut Simulator::with_seed(9), 500) {
            if s.speed > 0.0 {
                let expected = ((s.speed / 25.0).floor() as i32).clamp(1, 6);
                assert_eq!(s.gear, expected, "speed {}", s.speed);
            }
        }
    }

    #[test]
    fn derive_gear_edges() {
        assert_eq!(derive_gear(0.0), 1);
        assert_eq!(derive_gear(24.9), 1);
        assert_eq!(derive_gear(50.0), 2);
        assert_eq!(derive_gear(149.9), 5);
        assert_eq!(derive_gear(340.0), 6);
    }

    #[test]
    fn fuel_never_increases_and_floors_at_zero() {
        let mut sim = Simulator::with_seed(5);
        let mut current = TelemetrySnapshot {
            fuel_level: 0.05,
            ..Default::default()
        };
        let mut previous = current.fuel_level;
        for i in 0..10 {
            let patch = sim.next_patch(i as f64, i * 1000, &current);
            current.apply(&patch);
            assert!(current.fuel_level <= previous);
            assert!(current.fuel_level >= 0.0);
            previous = current.fuel_level;
        }
        assert_eq!(current.fuel_level, 0.0);
    }

    #[test]
    fn tc_and_abs_events_depend_on_pedals() {
        let mut sim = Simulator::with_seed(21);
        let idle = TelemetrySnapshot {
            throttle: 0.0,
            brake: 0.0,
            ..Default::default()
        };
        let pushing = TelemetrySnapshot {
            throttle: 1.0,
            brake: 1.0,
            ..Default::default()
        };

        for i in 0..200 {
            let patch = sim.next_patch(i as f64, i * 50, &idle);
            assert_eq!(patch.tc_cut, Some(false));
            assert_eq!(patch.abs_in_action, Some(false));
        }

        let (mut tc, mut abs) = (0, 0);
        for i in 0..1000 {
            let patch = sim.next_patch(i as f64, i * 50, &pushing);
            tc += usize::from(patch.tc_cut == Some(true));
            abs += usize::from(patch.abs_in_action == Some(true));
        }
        // ~10% e ~20% dos ticks
        assert!((50..=150).contains(&tc), "tc_cut em {tc} ticks");
        assert!((130..=270).contains(&abs), "abs em {abs} ticks");
    }

    #[test]
    fn brake_is_zero_outside_gate() {
        let mut sim = Simulator::with_seed(11);
        // sin(0) = 0 < 0.7 → gate fechado
        let patch = sim.next_patch(0.0, 0, &TelemetrySnapshot::default());
        assert_eq!(patch.brake, Some(0.0));
    }
}

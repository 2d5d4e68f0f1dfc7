//! Definição de tipos/structs para telemetria de corrida.
//!
//! Um [`TelemetrySnapshot`] é sempre o registro completo mais recente;
//! atualizações chegam como [`TelemetryPatch`] (merge-patch: só os campos
//! presentes sobrescrevem). Nenhum histórico é mantido.

use serde::{Deserialize, Serialize};

/// Valores por roda, sempre na ordem FL, FR, RL, RR.
pub type WheelArray = [f32; 4];

/// Posição de uma roda dentro de um [`WheelArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Wheel {
    /// Todas as rodas na ordem dos arrays.
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::RearLeft,
        Wheel::RearRight,
    ];

    /// Índice no array por roda.
    pub const fn index(self) -> usize {
        match self {
            Wheel::FrontLeft => 0,
            Wheel::FrontRight => 1,
            Wheel::RearLeft => 2,
            Wheel::RearRight => 3,
        }
    }

    /// Rótulo curto (ex: "FL").
    pub const fn label(self) -> &'static str {
        match self {
            Wheel::FrontLeft => "FL",
            Wheel::FrontRight => "FR",
            Wheel::RearLeft => "RL",
            Wheel::RearRight => "RR",
        }
    }
}

// ──────────────────────────────────────────────
// Dano
// ──────────────────────────────────────────────

/// Dano por região do carro (0–1).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Damage {
    pub front: f32,
    pub rear: f32,
    pub left: f32,
    pub right: f32,
    pub center: f32,
}

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Registro completo de telemetria de um instante.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    // Núcleo
    /// Velocidade (km/h)
    pub speed: f32,
    pub rpm: f32,
    /// Marcha (-1 ré, 0 neutro)
    pub gear: i32,
    pub max_rpm: f32,

    // Motor
    pub turbo_boost: f32,
    /// Combustível (litros)
    pub fuel_level: f32,
    /// Capacidade do tanque (litros)
    pub fuel_capacity: f32,
    /// Temperatura do motor (°C)
    pub engine_temp: f32,

    // Eletrônica
    pub abs: bool,
    /// Nível do controle de tração (0–10)
    pub tc: u8,
    pub tc_cut: bool,
    pub abs_in_action: bool,

    // Freios
    /// Distribuição de frenagem (% dianteira)
    pub brake_bias: f32,
    pub brake_temp: WheelArray,

    // Pneus
    /// Temperatura (°C)
    pub tire_temp: WheelArray,
    /// Pressão (psi)
    pub tire_pressure: WheelArray,
    /// Desgaste (0–1)
    pub tire_wear: WheelArray,
    pub tire_compound: String,

    // Pedais e volante
    pub throttle: f32,
    pub brake: f32,
    /// Volante (-1 a 1)
    pub steer: f32,
    pub clutch: f32,

    // Voltas (milissegundos)
    pub lap_time: u32,
    pub last_lap: u32,
    pub best_lap: u32,
    /// Delta para a melhor volta (ms, negativo = mais rápido)
    pub delta: i32,
    pub current_sector: u8,

    // Posição na pista
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub velocity: [f32; 3],

    pub damage: Damage,

    // Box e flags
    pub is_in_pit: bool,
    pub is_in_pit_lane: bool,
    pub mandatory_pit_done: bool,

    // DRS
    pub drs_available: bool,
    pub drs_enabled: bool,
}

impl Default for TelemetrySnapshot {
    /// Snapshot padrão usado para semear a simulação e completar o
    /// primeiro patch quando ainda não há snapshot anterior.
    fn default() -> Self {
        Self {
            speed: 0.0,
            rpm: 800.0,
            gear: 0,
            max_rpm: 8000.0,
            turbo_boost: 0.0,
            fuel_level: 65.0,
            fuel_capacity: 80.0,
            engine_temp: 85.0,
            abs: true,
            tc: 3,
            tc_cut: false,
            abs_in_action: false,
            brake_bias: 60.0,
            brake_temp: [350.0, 350.0, 300.0, 300.0],
            tire_temp: [85.0, 85.0, 80.0, 80.0],
            tire_pressure: [28.5, 28.5, 27.0, 27.0],
            tire_wear: [0.1, 0.1, 0.15, 0.15],
            tire_compound: "Soft".into(),
            throttle: 0.0,
            brake: 0.0,
            steer: 0.0,
            clutch: 0.0,
            lap_time: 0,
            last_lap: 92_340, // 1:32.340
            best_lap: 91_850, // 1:31.850
            delta: 490,       // +0.490
            current_sector: 1,
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            velocity: [0.0; 3],
            damage: Damage::default(),
            is_in_pit: false,
            is_in_pit_lane: false,
            mandatory_pit_done: false,
            drs_available: false,
            drs_enabled: false,
        }
    }
}

impl TelemetrySnapshot {
    /// Valor de uma roda num array por roda.
    pub fn wheel(values: &WheelArray, wheel: Wheel) -> f32 {
        values[wheel.index()]
    }

    /// Aplica um merge-patch: campos presentes sobrescrevem, ausentes
    /// mantêm o valor atual. Sem validação de faixa.
    pub fn apply(&mut self, patch: &TelemetryPatch) {
        merge_fields!(self, patch, [
            speed, rpm, gear, max_rpm,
            turbo_boost, fuel_level, fuel_capacity, engine_temp,
            abs, tc, tc_cut, abs_in_action,
            brake_bias, brake_temp,
            tire_temp, tire_pressure, tire_wear, tire_compound,
            throttle, brake, steer, clutch,
            lap_time, last_lap, best_lap, delta, current_sector,
            position_x, position_y, position_z, velocity,
            damage,
            is_in_pit, is_in_pit_lane, mandatory_pit_done,
            drs_available, drs_enabled,
        ]);
    }

    /// Retorna uma cópia com o patch aplicado.
    pub fn merged(&self, patch: &TelemetryPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

// ──────────────────────────────────────────────
// Patch parcial
// ──────────────────────────────────────────────

/// Atualização parcial de telemetria. `None` = manter valor anterior.
///
/// Também é o payload dos frames do feed ao vivo (ver [`crate::protocol`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryPatch {
    pub speed: Option<f32>,
    pub rpm: Option<f32>,
    pub gear: Option<i32>,
    pub max_rpm: Option<f32>,
    pub turbo_boost: Option<f32>,
    pub fuel_level: Option<f32>,
    pub fuel_capacity: Option<f32>,
    pub engine_temp: Option<f32>,
    pub abs: Option<bool>,
    pub tc: Option<u8>,
    pub tc_cut: Option<bool>,
    pub abs_in_action: Option<bool>,
    pub brake_bias: Option<f32>,
    pub brake_temp: Option<WheelArray>,
    pub tire_temp: Option<WheelArray>,
    pub tire_pressure: Option<WheelArray>,
    pub tire_wear: Option<WheelArray>,
    pub tire_compound: Option<String>,
    pub throttle: Option<f32>,
    pub brake: Option<f32>,
    pub steer: Option<f32>,
    pub clutch: Option<f32>,
    pub lap_time: Option<u32>,
    pub last_lap: Option<u32>,
    pub best_lap: Option<u32>,
    pub delta: Option<i32>,
    pub current_sector: Option<u8>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub position_z: Option<f32>,
    pub velocity: Option<[f32; 3]>,
    pub damage: Option<Damage>,
    pub is_in_pit: Option<bool>,
    pub is_in_pit_lane: Option<bool>,
    pub mandatory_pit_done: Option<bool>,
    pub drs_available: Option<bool>,
    pub drs_enabled: Option<bool>,
}

// ──────────────────────────────────────────────
// Status de conexão
// ──────────────────────────────────────────────

/// Estado da fonte de dados (simulador ou feed ao vivo).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    /// Último update (ms desde epoch)
    pub last_update: i64,
    /// Latência (ms)
    pub latency: f32,
    pub packets_received: u64,
    pub packets_lost: u64,
    /// Mensagem de erro da fonte ao vivo, se houver
    pub error: Option<String>,
}

impl ConnectionStatus {
    /// Merge-patch sem recálculo de campos derivados.
    pub fn apply(&mut self, patch: &ConnectionStatusPatch) {
        merge_fields!(self, patch, [
            connected, last_update, latency, packets_received, packets_lost, error,
        ]);
    }
}

/// Atualização parcial do [`ConnectionStatus`].
///
/// `error: Some(None)` limpa a mensagem de erro.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatusPatch {
    pub connected: Option<bool>,
    pub last_update: Option<i64>,
    pub latency: Option<f32>,
    pub packets_received: Option<u64>,
    pub packets_lost: Option<u64>,
    pub error: Option<Option<String>>,
}

impl ConnectionStatusPatch {
    pub fn connected(connected: bool) -> Self {
        Self {
            connected: Some(connected),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            connected: Some(false),
            error: Some(Some(message.into())),
            ..Default::default()
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

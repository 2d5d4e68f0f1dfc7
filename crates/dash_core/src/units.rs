//! Conversão de unidades e formatação de tempos de volta.
//!
//! A telemetria é sempre armazenada em km/h, °C e psi; a conversão
//! acontece só na exibição, conforme [`Units`].

use crate::settings::{PressureUnit, SpeedUnit, TemperatureUnit, Units};

const KMH_PER_MPH: f32 = 1.609_344;
const BAR_PER_PSI: f32 = 0.068_947_6;

pub fn kmh_to_mph(kmh: f32) -> f32 {
    kmh / KMH_PER_MPH
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

pub fn psi_to_bar(psi: f32) -> f32 {
    psi * BAR_PER_PSI
}

/// Velocidade na unidade escolhida, com o rótulo.
pub fn convert_speed(kmh: f32, units: &Units) -> (f32, &'static str) {
    match units.speed {
        SpeedUnit::Kmh => (kmh, "km/h"),
        SpeedUnit::Mph => (kmh_to_mph(kmh), "mph"),
    }
}

pub fn convert_temperature(celsius: f32, units: &Units) -> (f32, &'static str) {
    match units.temperature {
        TemperatureUnit::Celsius => (celsius, "°C"),
        TemperatureUnit::Fahrenheit => (celsius_to_fahrenheit(celsius), "°F"),
    }
}

pub fn convert_pressure(psi: f32, units: &Units) -> (f32, &'static str) {
    match units.pressure {
        PressureUnit::Psi => (psi, "psi"),
        PressureUnit::Bar => (psi_to_bar(psi), "bar"),
    }
}

/// Formata um tempo de volta como `m:ss.mmm`; zero vira `--:--.---`.
pub fn format_lap_time(ms: u32) -> String {
    if ms == 0 {
        return "--:--.---".into();
    }
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) as f64 / 1000.0;
    format!("{minutes}:{seconds:06.3}")
}

/// Formata um delta com sinal (`+0.490`, `-1.203`); zero vira `-.---`.
pub fn format_delta(ms: i32) -> String {
    match ms {
        0 => "-.---".into(),
        d if d > 0 => format!("+{:.3}", d as f64 / 1000.0),
        d => format!("{:.3}", d as f64 / 1000.0),
    }
}

//! Sistema de alertas – níveis e avaliação de thresholds.

use crate::config::AlertThresholds;
use crate::types::{TelemetrySnapshot, Wheel};
use serde::{Deserialize, Serialize};

/// Consumo médio estimado por volta (litros).
pub const FUEL_PER_LAP: f32 = 2.5;

/// Nível de alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

/// Um alerta disparado.
#[derive(Debug, Clone)]
pub struct Alert {
    pub metric: String,
    pub label: String,
    pub value: f32,
    pub unit: String,
    pub level: AlertLevel,
}

/// Faixa térmica de um pneu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TireTempBand {
    Cold,
    Optimal,
    Warm,
    Hot,
    Overheating,
}

impl TireTempBand {
    /// Classifica a temperatura (°C).
    pub fn classify(temp: f32) -> Self {
        if temp < 60.0 {
            TireTempBand::Cold
        } else if temp < 80.0 {
            TireTempBand::Optimal
        } else if temp < 100.0 {
            TireTempBand::Warm
        } else if temp < 120.0 {
            TireTempBand::Hot
        } else {
            TireTempBand::Overheating
        }
    }
}

/// Avalia um snapshot contra os thresholds e retorna alertas.
pub fn evaluate_alerts(snapshot: &TelemetrySnapshot, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    // Combustível (quanto menor, pior)
    let fuel = fuel_percent(snapshot);
    let fuel_level = level_for_low_value(fuel, thresholds.fuel_warning_percent, thresholds.fuel_critical_percent);
    if fuel_level != AlertLevel::Normal {
        alerts.push(Alert {
            metric: "fuel".into(),
            label: "Combustível".into(),
            value: fuel,
            unit: "%".into(),
            level: fuel_level,
        });
    }

    // Motor
    check(
        &mut alerts,
        "engine_temp",
        "Motor Temp",
        snapshot.engine_temp,
        "°C",
        thresholds.engine_temp_warning,
        thresholds.engine_temp_critical,
    );

    // Pneus
    for wheel in Wheel::ALL {
        let i = wheel.index();
        check(
            &mut alerts,
            &format!("tire_{}_temp", wheel.label().to_lowercase()),
            &format!("Pneu {} Temp", wheel.label()),
            snapshot.tire_temp[i],
            "°C",
            thresholds.tire_temp_warning,
            thresholds.tire_temp_critical,
        );
        check(
            &mut alerts,
            &format!("tire_{}_wear", wheel.label().to_lowercase()),
            &format!("Pneu {} Desgaste", wheel.label()),
            snapshot.tire_wear[i],
            "",
            thresholds.tire_wear_warning,
            thresholds.tire_wear_critical,
        );
    }

    alerts
}

fn check(
    alerts: &mut Vec<Alert>,
    metric: &str,
    label: &str,
    value: f32,
    unit: &str,
    warn: f32,
    crit: f32,
) {
    if value <= 0.0 {
        return; // Sem leitura
    }
    let level = level_for_value(value, warn, crit);
    if level == AlertLevel::Normal {
        return;
    }

    alerts.push(Alert {
        metric: metric.into(),
        label: label.into(),
        value,
        unit: unit.into(),
        level,
    });
}

/// Retorna o [`AlertLevel`] para um valor dado thresholds.
pub fn level_for_value(value: f32, warn: f32, crit: f32) -> AlertLevel {
    if value >= crit {
        AlertLevel::Critical
    } else if value >= warn {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

/// Como [`level_for_value`], para métricas em que menor é pior.
pub fn level_for_low_value(value: f32, warn: f32, crit: f32) -> AlertLevel {
    if value <= crit {
        AlertLevel::Critical
    } else if value <= warn {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

/// Combustível em % da capacidade.
pub fn fuel_percent(snapshot: &TelemetrySnapshot) -> f32 {
    if snapshot.fuel_capacity <= 0.0 {
        return 0.0;
    }
    snapshot.fuel_level / snapshot.fuel_capacity * 100.0
}

/// Voltas restantes estimadas com o combustível atual.
pub fn estimated_laps(fuel_level: f32) -> u32 {
    (fuel_level.max(0.0) / FUEL_PER_LAP).floor() as u32
}

/// Luz de troca de marcha.
pub fn shift_light(snapshot: &TelemetrySnapshot, thresholds: &AlertThresholds) -> bool {
    snapshot.rpm >= snapshot.max_rpm * thresholds.shift_light_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_has_no_alerts() {
        let alerts = evaluate_alerts(&TelemetrySnapshot::default(), &AlertThresholds::default());
        assert!(alerts.is_empty(), "{alerts:?}");
    }

    #[test]
    fn low_fuel_levels() {
        let th = AlertThresholds::default();
        let mut s = TelemetrySnapshot {
            fuel_level: 16.0, // 20%
            ..Default::default()
        };
        let alerts = evaluate_alerts(&s, &th);
        assert_eq!(alerts[0].metric, "fuel");
        assert_eq!(alerts[0].level, AlertLevel::Warning);

        s.fuel_level = 0.0;
        assert_eq!(evaluate_alerts(&s, &th)[0].level, AlertLevel::Critical);
    }

    #[test]
    fn hot_tire_triggers_per_wheel_alert() {
        let s = TelemetrySnapshot {
            tire_temp: [85.0, 125.0, 80.0, 80.0],
            ..Default::default()
        };
        let alerts = evaluate_alerts(&s, &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, "tire_fr_temp");
        assert_eq!(alerts[0].level, AlertLevel::Critical);
    }

    #[test]
    fn tire_bands() {
        assert_eq!(TireTempBand::classify(45.0), TireTempBand::Cold);
        assert_eq!(TireTempBand::classify(75.0), TireTempBand::Optimal);
        assert_eq!(TireTempBand::classify(99.9), TireTempBand::Warm);
        assert_eq!(TireTempBand::classify(110.0), TireTempBand::Hot);
        assert_eq!(TireTempBand::classify(120.0), TireTempBand::Overheating);
    }

    #[test]
    fn laps_and_shift_light() {
        assert_eq!(estimated_laps(65.0), 26);
        assert_eq!(estimated_laps(-1.0), 0);

        let th = AlertThresholds::default();
        let mut s = TelemetrySnapshot {
            rpm: 7500.0,
            ..Default::default()
        };
        assert!(!shift_light(&s, &th));
        s.rpm = 7650.0;
        assert!(shift_light(&s, &th));
    }

    #[test]
    fn warning_level() {
        assert_eq!(level_for_value(75.0, 70.0, 85.0), AlertLevel::Warning);
        assert_eq!(level_for_value(90.0, 70.0, 85.0), AlertLevel::Critical);
        assert_eq!(level_for_value(50.0, 70.0, 85.0), AlertLevel::Normal);
        assert_eq!(level_for_low_value(20.0, 25.0, 10.0), AlertLevel::Warning);
    }
}

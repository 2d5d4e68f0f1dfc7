//! Preferências do usuário, controles do carro e layout de widgets.
//!
//! Os nomes JSON seguem camelCase, o mesmo formato do documento exportado.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

// ──────────────────────────────────────────────
// Preferências
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[default]
    Psi,
    Bar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Compact,
    #[default]
    Detailed,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Auto,
    Landscape,
    Portrait,
}

/// Unidades de exibição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub speed: SpeedUnit,
    pub temperature: TemperatureUnit,
    pub pressure: PressureUnit,
}

/// Destino UDP da fonte ao vivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpTarget {
    pub ip: String,
    pub port: u16,
    pub enabled: bool,
}

impl Default for UdpTarget {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".into(),
            port: 9996,
            enabled: false,
        }
    }
}

/// Retângulo de um widget na grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl WidgetRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customization {
    pub layout: Layout,
    pub widgets: Vec<String>,
    pub positions: BTreeMap<String, WidgetRect>,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            layout: Layout::Detailed,
            widgets: ["speed", "rpm", "gear", "abs", "tc", "fuel", "tires"]
                .map(String::from)
                .to_vec(),
            positions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioSettings {
    pub enabled: bool,
    /// Volume (0–1)
    pub volume: f32,
    pub shift_beep: bool,
    pub warning_alerts: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.7,
            shift_beep: true,
            warning_alerts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MobileSettings {
    pub haptic_feedback: bool,
    pub orientation: Orientation,
}

impl Default for MobileSettings {
    fn default() -> Self {
        Self {
            haptic_feedback: true,
            orientation: Orientation::Auto,
        }
    }
}

/// Preferências do aplicativo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub theme: Theme,
    pub units: Units,
    pub udp: UdpTarget,
    pub customization: Customization,
    pub audio: AudioSettings,
    pub mobile: MobileSettings,
}

/// Patch raso: cada campo presente substitui o objeto inteiro.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSettingsPatch {
    pub theme: Option<Theme>,
    pub units: Option<Units>,
    pub udp: Option<UdpTarget>,
    pub customization: Option<Customization>,
    pub audio: Option<AudioSettings>,
    pub mobile: Option<MobileSettings>,
}

impl AppSettings {
    pub fn apply(&mut self, patch: &AppSettingsPatch) {
        merge_fields!(self, patch, [theme, units, udp, customization, audio, mobile]);
    }
}

// ──────────────────────────────────────────────
// Controles do carro
// ──────────────────────────────────────────────

/// Faixas nominais (informativas, não validadas no merge).
pub const TC_RANGE: RangeInclusive<u8> = 0..=10;
pub const BRAKE_BIAS_RANGE: RangeInclusive<f32> = 45.0..=75.0;
pub const ENGINE_MAP_RANGE: RangeInclusive<u8> = 1..=8;
pub const RADIO_PRESET_RANGE: RangeInclusive<u8> = 1..=8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurboMode {
    Low,
    #[default]
    Medium,
    High,
}

/// Estado alternável pelo piloto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarControls {
    // Eletrônica
    pub abs: bool,
    pub tc: u8,
    /// % dianteira
    pub brake_bias: f32,
    pub turbo_mode: TurboMode,

    // Motor
    pub ignition: bool,
    pub engine_map: u8,

    // Luzes e setas
    pub headlights: bool,
    pub high_beams: bool,
    pub left_signal: bool,
    pub right_signal: bool,
    pub hazard_lights: bool,
    pub rain_lights: bool,

    // Assistências
    pub pit_limiter: bool,
    pub drs: bool,
    pub wipers: bool,

    pub radio_preset: u8,
}

impl Default for CarControls {
    fn default() -> Self {
        Self {
            abs: true,
            tc: 3,
            brake_bias: 60.0,
            turbo_mode: TurboMode::Medium,
            ignition: true,
            engine_map: 4,
            headlights: false,
            high_beams: false,
            left_signal: false,
            right_signal: false,
            hazard_lights: false,
            rain_lights: false,
            pit_limiter: false,
            drs: false,
            wipers: false,
            radio_preset: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarControlsPatch {
    pub abs: Option<bool>,
    pub tc: Option<u8>,
    pub brake_bias: Option<f32>,
    pub turbo_mode: Option<TurboMode>,
    pub ignition: Option<bool>,
    pub engine_map: Option<u8>,
    pub headlights: Option<bool>,
    pub high_beams: Option<bool>,
    pub left_signal: Option<bool>,
    pub right_signal: Option<bool>,
    pub hazard_lights: Option<bool>,
    pub rain_lights: Option<bool>,
    pub pit_limiter: Option<bool>,
    pub drs: Option<bool>,
    pub wipers: Option<bool>,
    pub radio_preset: Option<u8>,
}

/// Controles numéricos ajustáveis em passos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustable {
    Tc,
    BrakeBias,
    EngineMap,
    RadioPreset,
}

impl CarControls {
    /// Merge seguido da correção das setas, em duas etapas: exclusividade
    /// esquerda/direita (esquerda vence se o patch liga as duas) e depois
    /// o pisca-alerta, que desliga ambas.
    pub fn apply(&mut self, patch: &CarControlsPatch) {
        merge_fields!(self, patch, [
            abs, tc, brake_bias, turbo_mode,
            ignition, engine_map,
            headlights, high_beams, left_signal, right_signal, hazard_lights, rain_lights,
            pit_limiter, drs, wipers,
            radio_preset,
        ]);

        if patch.left_signal == Some(true) && self.right_signal {
            self.right_signal = false;
        } else if patch.right_signal == Some(true) && self.left_signal {
            self.left_signal = false;
        }

        if patch.hazard_lights == Some(true) {
            self.left_signal = false;
            self.right_signal = false;
        }
    }

    /// Patch que move um controle `delta` passos, limitado à faixa nominal.
    pub fn adjust(&self, control: Adjustable, delta: i32) -> CarControlsPatch {
        fn step(value: u8, delta: i32, range: &RangeInclusive<u8>) -> u8 {
            (value as i32 + delta).clamp(*range.start() as i32, *range.end() as i32) as u8
        }

        match control {
            Adjustable::Tc => CarControlsPatch {
                tc: Some(step(self.tc, delta, &TC_RANGE)),
                ..Default::default()
            },
            Adjustable::BrakeBias => CarControlsPatch {
                brake_bias: Some(
                    (self.brake_bias + delta as f32)
                        .clamp(*BRAKE_BIAS_RANGE.start(), *BRAKE_BIAS_RANGE.end()),
                ),
                ..Default::default()
            },
            Adjustable::EngineMap => CarControlsPatch {
                engine_map: Some(step(self.engine_map, delta, &ENGINE_MAP_RANGE)),
                ..Default::default()
            },
            Adjustable::RadioPreset => CarControlsPatch {
                radio_preset: Some(step(self.radio_preset, delta, &RADIO_PRESET_RANGE)),
                ..Default::default()
            },
        }
    }
}

// ──────────────────────────────────────────────
// Widgets
// ──────────────────────────────────────────────

/// Descritor declarativo de um widget do dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub title: String,
    pub enabled: bool,
    pub position: WidgetRect,
    /// Parâmetros livres do widget
    pub settings: Map<String, Value>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            widget_type: String::new(),
            title: String::new(),
            enabled: true,
            position: WidgetRect::default(),
            settings: Map::new(),
        }
    }
}

/// Patch de widget. O `id` não é alterável.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    pub widget_type: Option<String>,
    pub title: Option<String>,
    pub enabled: Option<bool>,
    pub position: Option<WidgetRect>,
    pub settings: Option<Map<String, Value>>,
}

impl WidgetConfig {
    pub fn apply(&mut self, patch: &WidgetPatch) {
        merge_fields!(self, patch, [widget_type, title, enabled, position, settings]);
    }
}

fn widget(id: &str, widget_type: &str, title: &str, position: WidgetRect, settings: Value) -> WidgetConfig {
    WidgetConfig {
        id: id.into(),
        widget_type: widget_type.into(),
        title: title.into(),
        enabled: true,
        position,
        settings: match settings {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

/// Layout padrão, na ordem de exibição.
pub fn default_widgets() -> Vec<WidgetConfig> {
    vec![
        widget(
            "speed",
            "gauge",
            "Speed",
            WidgetRect::new(0, 0, 2, 2),
            json!({ "maxValue": 350, "unit": "kmh", "showDigital": true }),
        ),
        widget(
            "rpm",
            "gauge",
            "RPM",
            WidgetRect::new(2, 0, 2, 2),
            json!({ "showRedline": true, "showShiftLight": true }),
        ),
        widget(
            "gear",
            "digital",
            "Gear",
            WidgetRect::new(4, 0, 1, 1),
            json!({ "showNeutral": true }),
        ),
        widget(
            "abs",
            "indicator",
            "ABS",
            WidgetRect::new(0, 2, 1, 1),
            json!({ "activeColor": "green", "inactiveColor": "gray" }),
        ),
        widget(
            "tc",
            "indicator",
            "TC",
            WidgetRect::new(1, 2, 1, 1),
            json!({ "showLevel": true }),
        ),
        widget(
            "fuel",
            "bar",
            "Fuel",
            WidgetRect::new(2, 2, 2, 1),
            json!({ "warningLevel": 10, "unit": "liters" }),
        ),
        widget(
            "tires",
            "tire-temps",
            "Tire Temps",
            WidgetRect::new(0, 3, 4, 2),
            json!({ "showPressure": true, "showWear": true }),
        ),
    ]
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn left_signal_clears_right() {
        let mut c = CarControls {
            right_signal: true,
            ..Default::default()
        };
        c.apply(&CarControlsPatch {
            left_signal: Some(true),
            ..Default::default()
        });
        assert!(c.left_signal);
        assert!(!c.right_signal);
    }

    #[test]
    fn right_signal_clears_left() {
        let mut c = CarControls {
            left_signal: true,
            ..Default::default()
        };
        c.apply(&CarControlsPatch {
            right_signal: Some(true),
            ..Default::default()
        });
        assert!(c.right_signal);
        assert!(!c.left_signal);
    }

    #[test]
    fn hazards_clear_both_signals() {
        let mut c = CarControls {
            left_signal: true,
            ..Default::default()
        };
        c.apply(&CarControlsPatch {
            hazard_lights: Some(true),
            ..Default::default()
        });
        assert!(c.hazard_lights);
        assert!(!c.left_signal);
        assert!(!c.right_signal);
    }

    #[test]
    fn conflicting_patch_resolves_in_order() {
        // Esquerda vence a direita; pisca-alerta vence as duas
        let mut c = CarControls::default();
        c.apply(&CarControlsPatch {
            left_signal: Some(true),
            right_signal: Some(true),
            ..Default::default()
        });
        assert!(c.left_signal && !c.right_signal);

        c.apply(&CarControlsPatch {
            right_signal: Some(true),
            hazard_lights: Some(true),
            ..Default::default()
        });
        assert!(!c.left_signal && !c.right_signal && c.hazard_lights);
    }

    #[test]
    fn controls_merge_passes_values_through() {
        let mut c = CarControls::default();
        c.apply(&CarControlsPatch {
            tc: Some(42),
            turbo_mode: Some(TurboMode::High),
            ..Default::default()
        });
        assert_eq!(c.tc, 42);
        assert_eq!(c.turbo_mode, TurboMode::High);
        assert_eq!(c.engine_map, 4);
    }

    #[test]
    fn adjust_clamps_to_nominal_range() {
        let c = CarControls {
            tc: 9,
            brake_bias: 74.0,
            engine_map: 1,
            ..Default::default()
        };
        assert_eq!(c.adjust(Adjustable::Tc, 5).tc, Some(10));
        assert_eq!(c.adjust(Adjustable::BrakeBias, 3).brake_bias, Some(75.0));
        assert_eq!(c.adjust(Adjustable::EngineMap, -2).engine_map, Some(1));
        assert_eq!(c.adjust(Adjustable::RadioPreset, 2).radio_preset, Some(3));
    }

    #[test]
    fn settings_patch_replaces_nested_objects() {
        let mut s = AppSettings::default();
        s.apply(&AppSettingsPatch {
            units: Some(Units {
                speed: SpeedUnit::Mph,
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(s.units.speed, SpeedUnit::Mph);
        assert_eq!(s.udp, UdpTarget::default());
    }

    #[test]
    fn settings_json_uses_camel_case_names() {
        let value = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(value["audio"]["shiftBeep"], json!(true));
        assert_eq!(value["mobile"]["hapticFeedback"], json!(true));
        assert_eq!(value["units"]["speed"], json!("kmh"));
        assert_eq!(value["udp"]["port"], json!(9996));
    }

    #[test]
    fn widget_patch_keeps_id() {
        let mut w = default_widgets().remove(0);
        w.apply(&WidgetPatch {
            title: Some("Velocidade".into()),
            enabled: Some(false),
            ..Default::default()
        });
        assert_eq!(w.id, "speed");
        assert_eq!(w.title, "Velocidade");
        assert!(!w.enabled);
        assert_eq!(w.settings["maxValue"], json!(350));
    }

    #[test]
    fn default_widgets_have_unique_ids() {
        let widgets = default_widgets();
        let mut ids: Vec<_> = widgets.iter().map(|w| w.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), widgets.len());
        assert_eq!(widgets[0].widget_type, "gauge");
    }
}

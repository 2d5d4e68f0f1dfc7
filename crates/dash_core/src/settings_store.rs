//! Container de preferências (settings, controles e widgets).
//!
//! Toda mutação produz um novo estado completo e é persistida na hora sob
//! [`SETTINGS_KEY`]. Falhas de escrita são logadas e descartadas.
//!
//! ## Import
//!
//! O documento tem três fatias (`settings`, `controls`, `widgets`) e cada
//! uma é mesclada por chave sobre os padrões:
//! - `settings`/`controls`: chaves ausentes recebem o valor padrão;
//! - `widgets`: se presente, o array define quais widgets existem e em que
//!   ordem, e cada item é mesclado sobre o widget padrão de mesmo `id`;
//!   se ausente, vale a lista padrão.
//!
//! O parse é feito por inteiro antes de tocar no estado: um documento
//! inválido não altera nada.

use crate::events::{SettingsEvent, Subscribers};
use crate::settings::{
    AppSettings, AppSettingsPatch, CarControls, CarControlsPatch, WidgetConfig, WidgetPatch,
    default_widgets,
};
use crate::storage::{KeyValueStore, SETTINGS_KEY};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Erros do container de preferências.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Documento de preferências inválido: {0}")]
    Parse(String),

    #[error("Erro de serialização: {0}")]
    Serialize(String),
}

/// Estado completo do container; também é o formato do documento
/// persistido e exportado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub settings: AppSettings,
    pub controls: CarControls,
    pub widgets: Vec<WidgetConfig>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            settings: AppSettings::default(),
            controls: CarControls::default(),
            widgets: default_widgets(),
        }
    }
}

impl SettingsDocument {
    /// Faz o parse de um documento mesclando cada fatia sobre os padrões.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SettingsError::Parse(e.to_string()))?;
        let Value::Object(mut root) = value else {
            return Err(SettingsError::Parse("a raiz deve ser um objeto".into()));
        };

        let settings = merge_over(&AppSettings::default(), root.remove("settings"), "settings", true)?;
        let controls = merge_over(&CarControls::default(), root.remove("controls"), "controls", true)?;
        let widgets = match root.remove("widgets") {
            None | Some(Value::Null) => default_widgets(),
            Some(Value::Array(items)) => merge_widgets(items)?,
            Some(_) => return Err(SettingsError::Parse("widgets deve ser um array".into())),
        };

        Ok(Self {
            settings,
            controls,
            widgets,
        })
    }

    /// Serializa como JSON indentado.
    pub fn to_pretty_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))
    }
}

fn to_object<T: Serialize>(value: &T, slice: &str) -> Result<Map<String, Value>, SettingsError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SettingsError::Serialize(format!("{slice} não é um objeto"))),
        Err(e) => Err(SettingsError::Serialize(e.to_string())),
    }
}

/// Remove chaves `null`. O serde_json grava floats não finitos como
/// `null`; sem a chave, o campo volta ao valor base (ou ao padrão do
/// sub-objeto) em vez de invalidar o documento inteiro.
fn strip_nulls(map: &mut Map<String, Value>, deep: bool) {
    map.retain(|_, value| !value.is_null());
    if deep {
        for value in map.values_mut() {
            if let Value::Object(inner) = value {
                strip_nulls(inner, true);
            }
        }
    }
}

/// Mescla as chaves de `overlay` sobre `base` (raso, por chave).
///
/// `deep` também limpa `null` dentro de sub-objetos tipados; os widgets
/// usam `false` para preservar o mapa livre `settings`.
fn merge_over<T>(base: &T, overlay: Option<Value>, slice: &str, deep: bool) -> Result<T, SettingsError>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let mut overlay = match overlay {
        None | Some(Value::Null) => return Ok(base.clone()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(SettingsError::Parse(format!("{slice} deve ser um objeto"))),
    };
    strip_nulls(&mut overlay, deep);

    let mut merged = to_object(base, slice)?;
    merged.extend(overlay);
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| SettingsError::Parse(format!("{slice}: {e}")))
}

fn merge_widgets(items: Vec<Value>) -> Result<Vec<WidgetConfig>, SettingsError> {
    let defaults = default_widgets();
    let mut seen = HashSet::new();
    let mut widgets = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        let slice = format!("widgets[{i}]");
        let id = item
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| SettingsError::Parse(format!("{slice} sem id")))?
            .to_string();
        if !seen.insert(id.clone()) {
            return Err(SettingsError::Parse(format!("{slice}: id duplicado {id:?}")));
        }

        let base = defaults
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .unwrap_or_else(|| WidgetConfig {
                id,
                ..Default::default()
            });
        widgets.push(merge_over(&base, Some(item), &slice, false)?);
    }

    Ok(widgets)
}

/// Container de preferências.
pub struct SettingsStore {
    document: Mutex<SettingsDocument>,
    storage: Arc<dyn KeyValueStore>,
    subscribers: Subscribers<SettingsEvent>,
}

impl SettingsStore {
    /// Carrega o documento persistido (mesclado sobre os padrões). Um
    /// documento corrompido é ignorado.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let document = match storage.get(SETTINGS_KEY) {
            Ok(Some(text)) => match SettingsDocument::parse(&text) {
                Ok(doc) => {
                    info!("Preferências carregadas ({SETTINGS_KEY})");
                    doc
                }
                Err(e) => {
                    warn!("Preferências persistidas ignoradas: {e}");
                    SettingsDocument::default()
                }
            },
            Ok(None) => {
                info!("Usando preferências padrão");
                SettingsDocument::default()
            }
            Err(e) => {
                warn!("Erro ao ler preferências: {e}");
                SettingsDocument::default()
            }
        };

        Self {
            document: Mutex::new(document),
            storage,
            subscribers: Subscribers::new(),
        }
    }

    // ──────────────────────────────────────────
    // Leitura
    // ──────────────────────────────────────────

    pub fn document(&self) -> SettingsDocument {
        self.document.lock().clone()
    }

    pub fn settings(&self) -> AppSettings {
        self.document.lock().settings.clone()
    }

    pub fn controls(&self) -> CarControls {
        self.document.lock().controls.clone()
    }

    pub fn widgets(&self) -> Vec<WidgetConfig> {
        self.document.lock().widgets.clone()
    }

    pub fn subscribe(&self) -> Receiver<SettingsEvent> {
        self.subscribers.subscribe()
    }

    // ──────────────────────────────────────────
    // Mutações
    // ──────────────────────────────────────────

    pub fn update_settings(&self, patch: &AppSettingsPatch) {
        self.mutate(SettingsEvent::SettingsChanged, |doc| {
            doc.settings.apply(patch);
            true
        });
    }

    /// Merge + correção de exclusividade das setas.
    pub fn update_controls(&self, patch: &CarControlsPatch) {
        self.mutate(SettingsEvent::ControlsChanged, |doc| {
            doc.controls.apply(patch);
            true
        });
    }

    /// Retorna `false` (sem efeito) se o widget não existe.
    pub fn update_widget(&self, id: &str, patch: &WidgetPatch) -> bool {
        self.mutate(SettingsEvent::WidgetsChanged, |doc| {
            match doc.widgets.iter_mut().find(|w| w.id == id) {
                Some(widget) => {
                    widget.apply(patch);
                    true
                }
                None => {
                    debug!("Widget {id:?} não existe, update ignorado");
                    false
                }
            }
        })
    }

    /// Adiciona ao fim da lista. Um `id` repetido é rejeitado.
    pub fn add_widget(&self, widget: WidgetConfig) -> bool {
        self.mutate(SettingsEvent::WidgetsChanged, |doc| {
            if doc.widgets.iter().any(|w| w.id == widget.id) {
                warn!("Widget {:?} já existe, ignorando", widget.id);
                return false;
            }
            doc.widgets.push(widget);
            true
        })
    }

    /// Remove pelo `id`; inexistente é no-op.
    pub fn remove_widget(&self, id: &str) -> bool {
        self.mutate(SettingsEvent::WidgetsChanged, |doc| {
            let before = doc.widgets.len();
            doc.widgets.retain(|w| w.id != id);
            doc.widgets.len() != before
        })
    }

    /// Restaura settings, controles e widgets aos padrões.
    pub fn reset_settings(&self) {
        self.mutate(SettingsEvent::Reset, |doc| {
            *doc = SettingsDocument::default();
            true
        });
        info!("Preferências restauradas aos padrões");
    }

    /// Documento JSON indentado com `settings`, `controls` e `widgets`.
    pub fn export_settings(&self) -> Result<String, SettingsError> {
        self.document.lock().to_pretty_json()
    }

    /// Importa um documento exportado. Em erro o estado não muda.
    pub fn import_settings(&self, text: &str) -> Result<(), SettingsError> {
        let imported = SettingsDocument::parse(text).inspect_err(|e| {
            warn!("Falha ao importar preferências: {e}");
        })?;
        self.mutate(SettingsEvent::Imported, |doc| {
            *doc = imported;
            true
        });
        info!("Preferências importadas");
        Ok(())
    }

    /// Aplica `f`; se houve mudança, persiste e notifica.
    fn mutate<F>(&self, event: SettingsEvent, f: F) -> bool
    where
        F: FnOnce(&mut SettingsDocument) -> bool,
    {
        {
            let mut doc = self.document.lock();
            if !f(&mut doc) {
                return false;
            }
            // Persistir sob o lock mantém as escritas na mesma ordem das mutações
            self.persist(&doc);
        }
        self.subscribers.publish(event);
        true
    }

    fn persist(&self, doc: &SettingsDocument) {
        let json = match serde_json::to_string(doc) {
            Ok(json) => json,
            Err(e) => {
                warn!("Erro ao serializar preferências: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set(SETTINGS_KEY, &json) {
            warn!("Escrita das preferências descartada: {e}");
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

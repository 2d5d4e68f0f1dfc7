//! Protocolo binário do feed ao vivo.
//!
//! Um processo de aquisição externo entrega patches parciais de telemetria
//! neste formato. O transporte (UDP, pipe, etc.) fica fora deste crate.
//!
//! ```text
//! ┌──────────┬─────────┬──────────────────────────┐
//! │ Magic(1) │ Ver.(1) │ bincode(TelemetryPatch)  │
//! └──────────┴─────────┴──────────────────────────┘
//! ```

use crate::types::TelemetryPatch;

/// Magic byte que identifica frames do feed ('R').
pub const MAGIC_BYTE: u8 = 0x52;

/// Versão atual do protocolo.
pub const PROTOCOL_VERSION: u8 = 1;

/// Tamanho do header (magic + version).
const HEADER_SIZE: usize = 2;

/// Tamanho máximo de pacote UDP seguro (sem fragmentação).
pub const MAX_FRAME_SIZE: usize = 65507;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Frame muito grande ({0} bytes, máximo {MAX_FRAME_SIZE})")]
    TooLarge(usize),

    #[error("Magic byte inválido: 0x{0:02X} (esperado 0x{MAGIC_BYTE:02X})")]
    InvalidMagic(u8),

    #[error("Versão incompatível: {0} (suportada: {PROTOCOL_VERSION})")]
    VersionMismatch(u8),

    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

/// Codifica um patch no formato `[MAGIC][VERSION][bincode...]`.
pub fn encode_patch(patch: &TelemetryPatch) -> Result<Vec<u8>, ProtocolError> {
    let body = bincode::serialize(patch).map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.push(MAGIC_BYTE);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&body);

    if frame.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::TooLarge(frame.len()));
    }
    Ok(frame)
}

/// Decodifica um frame, validando magic byte e versão.
pub fn decode_patch(data: &[u8]) -> Result<TelemetryPatch, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }
    if data.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::TooLarge(data.len()));
    }

    let magic = data[0];
    if magic != MAGIC_BYTE {
        return Err(ProtocolError::InvalidMagic(magic));
    }

    let version = data[1];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }

    bincode::deserialize(&data[HEADER_SIZE..]).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Damage;

    fn sample_patch() -> TelemetryPatch {
        TelemetryPatch {
            speed: Some(241.3),
            rpm: Some(7650.0),
            gear: Some(6),
            tire_temp: Some([92.0, 93.5, 88.1, 87.9]),
            tire_compound: Some("Medium".into()),
            damage: Some(Damage {
                front: 0.2,
                ..Default::default()
            }),
            drs_enabled: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn partial_patch_survives_the_wire() {
        let original = sample_patch();
        let decoded = decode_patch(&encode_patch(&original).unwrap()).unwrap();
        assert_eq!(original, decoded);
        assert!(decoded.fuel_level.is_none());
    }

    #[test]
    fn header_is_correct() {
        let encoded = encode_patch(&TelemetryPatch::default()).unwrap();
        assert_eq!(encoded[0], MAGIC_BYTE);
        assert_eq!(encoded[1], PROTOCOL_VERSION);
    }

    #[test]
    fn rejects_invalid_magic() {
        let mut encoded = encode_patch(&sample_patch()).unwrap();
        encoded[0] = 0xFF;
        assert!(matches!(decode_patch(&encoded), Err(ProtocolError::InvalidMagic(0xFF))));
    }

    #[test]
    fn rejects_short_frame() {
        assert!(matches!(decode_patch(&[MAGIC_BYTE]), Err(ProtocolError::TooShort(1))));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut encoded = encode_patch(&sample_patch()).unwrap();
        encoded[1] = 99;
        assert!(matches!(decode_patch(&encoded), Err(ProtocolError::VersionMismatch(99))));
    }

    #[test]
    fn rejects_truncated_body() {
        let encoded = encode_patch(&sample_patch()).unwrap();
        let truncated = &encoded[..encoded.len() - 3];
        assert!(matches!(decode_patch(truncated), Err(ProtocolError::Deserialize(_))));
    }

    #[test]
    fn frames_are_compact() {
        let encoded = encode_patch(&sample_patch()).unwrap();
        assert!(encoded.len() < 200, "frame com {} bytes", encoded.len());
    }
}

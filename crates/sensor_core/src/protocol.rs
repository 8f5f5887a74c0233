//! Formato de texto dos frames.
//!
//! O frame inteiro é uma linha ASCII com três campos decimais:
//!
//! ```text
//! ┌──────────┬───┬──────────┬───┬────────────┐
//! │ touch0   │ , │ touch1   │ , │ soundLevel │
//! │ (0 | 1)  │   │ (0 | 1)  │   │ (inteiro)  │
//! └──────────┴───┴──────────┴───┴────────────┘
//! ```
//!
//! Não há header, versão nem escape: nenhum campo contém `,`.
//! Na linha serial os frames são separados por `\n`.

use crate::types::{EncodedFrame, SensorFrame};

/// Separador de campos.
pub const FIELD_SEPARATOR: char = ',';

/// Número de campos de um frame.
pub const FIELD_COUNT: usize = 3;

/// Erros de decodificação.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame com poucos campos ({0}, mínimo {FIELD_COUNT})")]
    TooFewFields(usize),

    #[error("Campo {field} não é um inteiro: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Codifica um [`SensorFrame`] em texto.
///
/// Total para qualquer valor: toques viram `1`/`0` e o nível de som
/// é escrito em decimal sem truncamento.
pub fn encode_frame(frame: &SensorFrame) -> EncodedFrame {
    EncodedFrame::from_text(format!(
        "{}{sep}{}{sep}{}",
        u8::from(frame.touch0),
        u8::from(frame.touch1),
        frame.sound_level,
        sep = FIELD_SEPARATOR,
    ))
}

/// Decodifica uma linha `p0,p1,s` recebida.
///
/// Tolerante como o consumidor do navegador: espaços nas bordas são
/// ignorados, campos extras também. Toque é considerado ativo somente
/// quando vale exatamente `1`; o nível de som é limitado a `0..=u16::MAX`.
pub fn decode_frame(line: &str) -> Result<SensorFrame, ProtocolError> {
    let parts: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    if parts.len() < FIELD_COUNT {
        return Err(ProtocolError::TooFewFields(parts.len()));
    }

    let touch0 = parse_int("touch0", parts[0])? == 1;
    let touch1 = parse_int("touch1", parts[1])? == 1;
    let sound = parse_int("soundLevel", parts[2])?;
    let sound_level = sound.clamp(0, i64::from(u16::MAX)) as u16;

    Ok(SensorFrame {
        touch0,
        touch1,
        sound_level,
    })
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, ProtocolError> {
    let raw = raw.trim();
    raw.parse::<i64>().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

// ──────────────────────────────────────────────
// Separação de linhas em stream
// ──────────────────────────────────────────────

/// Acumula pedaços de texto de um stream e entrega linhas completas.
///
/// A última linha parcial fica no buffer até o próximo `\n`.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona um pedaço e retorna as linhas completas (trim, não vazias).
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    /// Texto parcial ainda sem terminador.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_touch_as_digits() {
        let frame = SensorFrame::new(true, false, 37);
        assert_eq!(encode_frame(&frame).as_str(), "1,0,37");
    }

    #[test]
    fn encodes_all_quiet() {
        assert_eq!(encode_frame(&SensorFrame::default()).as_str(), "0,0,0");
    }

    #[test]
    fn encodes_sound_without_truncation() {
        let frame = SensorFrame::new(false, true, 255);
        assert_eq!(encode_frame(&frame).as_str(), "0,1,255");
        let wide = SensorFrame::new(true, true, u16::MAX);
        assert_eq!(encode_frame(&wide).as_str(), "1,1,65535");
    }

    #[test]
    fn decodes_producer_output() {
        let frame = SensorFrame::new(true, true, 201);
        let encoded = encode_frame(&frame);
        assert_eq!(decode_frame(encoded.as_str()).unwrap(), frame);
    }

    #[test]
    fn decode_tolerates_whitespace_and_extra_fields() {
        let frame = decode_frame("  1, 0 ,42,extra\r").unwrap();
        assert_eq!(frame, SensorFrame::new(true, false, 42));
    }

    #[test]
    fn decode_treats_non_one_as_untouched() {
        let frame = decode_frame("2,-1,5").unwrap();
        assert!(!frame.touch0);
        assert!(!frame.touch1);
    }

    #[test]
    fn decode_clamps_sound_level() {
        assert_eq!(decode_frame("0,0,-7").unwrap().sound_level, 0);
        assert_eq!(decode_frame("0,0,70000").unwrap().sound_level, u16::MAX);
    }

    #[test]
    fn decode_rejects_short_line() {
        assert_eq!(decode_frame("1,0"), Err(ProtocolError::TooFewFields(2)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_frame("1,x,3"),
            Err(ProtocolError::InvalidNumber { field: "touch1", .. })
        ));
    }

    #[test]
    fn splitter_keeps_partial_line() {
        let mut s = LineSplitter::new();
        assert!(s.push("1,0,3").is_empty());
        assert_eq!(s.pending(), "1,0,3");

        let lines = s.push("7\n0,1,");
        assert_eq!(lines, vec!["1,0,37".to_string()]);
        assert_eq!(s.pending(), "0,1,");

        let lines = s.push("5\n\n1,1,9\n");
        assert_eq!(lines, vec!["0,1,5".to_string(), "1,1,9".to_string()]);
        assert_eq!(s.pending(), "");
    }

    #[test]
    fn splitter_trims_crlf() {
        let mut s = LineSplitter::new();
        assert_eq!(s.push("0,0,1\r\n"), vec!["0,0,1".to_string()]);
    }
}

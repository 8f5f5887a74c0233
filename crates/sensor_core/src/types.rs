//! Definição dos tipos de frame de sensores.
//!
//! Um [`SensorFrame`] é um snapshot de uma única amostragem; o
//! [`EncodedFrame`] é a sua forma textual `touch0,touch1,soundLevel`.

use std::fmt;

// ──────────────────────────────────────────────
// Pinos de toque
// ──────────────────────────────────────────────

/// Pino de toque lido pelo produtor de frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPin {
    P0,
    P1,
}

impl TouchPin {
    /// Índice numérico do pino (0 ou 1).
    pub fn index(self) -> u8 {
        match self {
            TouchPin::P0 => 0,
            TouchPin::P1 => 1,
        }
    }
}

impl fmt::Display for TouchPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin{}", self.index())
    }
}

// ──────────────────────────────────────────────
// Frame amostrado
// ──────────────────────────────────────────────

/// Uma leitura completa dos sensores.
///
/// Criado a cada tick e descartado logo após a codificação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorFrame {
    /// Estado do pino de toque 0
    pub touch0: bool,
    /// Estado do pino de toque 1
    pub touch1: bool,
    /// Nível de som bruto do microfone (0–255 no micro:bit)
    pub sound_level: u16,
}

impl SensorFrame {
    pub fn new(touch0: bool, touch1: bool, sound_level: u16) -> Self {
        Self {
            touch0,
            touch1,
            sound_level,
        }
    }

    /// Estado do pino informado.
    pub fn touch(&self, pin: TouchPin) -> bool {
        match pin {
            TouchPin::P0 => self.touch0,
            TouchPin::P1 => self.touch1,
        }
    }
}

// ──────────────────────────────────────────────
// Frame codificado
// ──────────────────────────────────────────────

/// Frame serializado no formato `touch0,touch1,soundLevel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedFrame(String);

impl EncodedFrame {
    /// Envolve um texto já codificado (ex: recebido do transporte).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedFrame {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

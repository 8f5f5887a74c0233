//! Abstração dos sensores de toque e de som.
//!
//! O produtor de frames nunca acessa hardware diretamente: recebe um
//! backend que implementa [`TouchSensor`] e [`SoundSensor`].
//!
//! Backends disponíveis:
//! - [`FixedSensors`] – leituras constantes (testes)
//! - [`SimulatedBoard`] – placa simulada determinística (seed)
//! - [`ScriptedSensors`] – reproduz leituras gravadas em arquivo `p0,p1,s`
//! - [`MissingSensor`] – hardware ausente, toda leitura falha
//! - [`SensorPair`] – combina um backend de toque com outro de som

use crate::protocol::{LineSplitter, decode_frame};
use crate::types::{SensorFrame, TouchPin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Sensor envolvido numa falha de leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Touch(TouchPin),
    Sound,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Touch(pin) => write!(f, "toque {pin}"),
            SensorKind::Sound => f.write_str("microfone"),
        }
    }
}

/// Falha ao obter um valor de sensor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorReadError {
    #[error("Sensor indisponível: {0}")]
    Unavailable(SensorKind),

    #[error("Erro de leitura do sensor: {0}")]
    Io(String),

    #[error("Leituras gravadas esgotadas após {0} ticks")]
    Exhausted(usize),
}

/// Leitura digital de um pino de toque.
pub trait TouchSensor {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError>;
}

/// Leitura do nível de som atual do microfone.
pub trait SoundSensor {
    fn sound_level(&mut self) -> Result<u16, SensorReadError>;
}

// ──────────────────────────────────────────────
// FixedSensors
// ──────────────────────────────────────────────

/// Backend com leituras constantes, alteráveis entre ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedSensors {
    pub frame: SensorFrame,
}

impl FixedSensors {
    pub fn new(touch0: bool, touch1: bool, sound_level: u16) -> Self {
        Self {
            frame: SensorFrame::new(touch0, touch1, sound_level),
        }
    }
}

impl TouchSensor for FixedSensors {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        Ok(self.frame.touch(pin))
    }
}

impl SoundSensor for FixedSensors {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        Ok(self.frame.sound_level)
    }
}

// ──────────────────────────────────────────────
// MissingSensor
// ──────────────────────────────────────────────

/// Hardware ausente: toda leitura retorna [`SensorReadError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingSensor;

impl TouchSensor for MissingSensor {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        Err(SensorReadError::Unavailable(SensorKind::Touch(pin)))
    }
}

impl SoundSensor for MissingSensor {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        Err(SensorReadError::Unavailable(SensorKind::Sound))
    }
}

// ──────────────────────────────────────────────
// SensorPair
// ──────────────────────────────────────────────

/// Combina backends distintos para toque e som.
#[derive(Debug, Clone, Default)]
pub struct SensorPair<T, S> {
    pub touch: T,
    pub sound: S,
}

impl<T, S> SensorPair<T, S> {
    pub fn new(touch: T, sound: S) -> Self {
        Self { touch, sound }
    }
}

impl<T: TouchSensor, S> TouchSensor for SensorPair<T, S> {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        self.touch.is_touched(pin)
    }
}

impl<T, S: SoundSensor> SoundSensor for SensorPair<T, S> {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        self.sound.sound_level()
    }
}

// ──────────────────────────────────────────────
// SimulatedBoard
// ──────────────────────────────────────────────

/// Nível de som acima do qual o jogo considera um "shake".
pub const SHAKE_THRESHOLD: u16 = 200;

/// Nível máximo reportado pelo microfone do micro:bit.
pub const MAX_SOUND_LEVEL: u16 = 255;

/// Placa simulada determinística.
///
/// Os pinos alternam de estado raramente (~1 em 20 leituras) e o som faz
/// um passeio aleatório em `0..=255` com picos ocasionais acima de
/// [`SHAKE_THRESHOLD`]. A mesma seed sempre gera a mesma sequência.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    rng: StdRng,
    pins: [bool; 2],
    sound: u16,
}

impl SimulatedBoard {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            pins: [false; 2],
            sound: 20,
        }
    }
}

impl TouchSensor for SimulatedBoard {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        let idx = usize::from(pin.index());
        if self.rng.gen_bool(0.05) {
            self.pins[idx] = !self.pins[idx];
        }
        Ok(self.pins[idx])
    }
}

impl SoundSensor for SimulatedBoard {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        if self.rng.gen_bool(0.02) {
            // Pico: palmas / shake
            self.sound = self.rng.gen_range(SHAKE_THRESHOLD..=MAX_SOUND_LEVEL);
        } else {
            let step: i32 = self.rng.gen_range(-8..=8);
            let next = (i32::from(self.sound) + step).clamp(0, i32::from(MAX_SOUND_LEVEL));
            self.sound = next as u16;
        }
        Ok(self.sound)
    }
}

// ──────────────────────────────────────────────
// ScriptedSensors
// ──────────────────────────────────────────────

/// Reproduz leituras gravadas, uma linha `p0,p1,s` por tick.
///
/// Os pinos de toque leem o frame corrente; a leitura do som, última do
/// tick, avança para o próximo frame.
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    frames: Vec<SensorFrame>,
    cursor: usize,
}

impl ScriptedSensors {
    pub fn new(frames: Vec<SensorFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Interpreta um texto com uma leitura por linha (linhas vazias ignoradas).
    pub fn from_text(text: &str) -> Result<Self, SensorReadError> {
        let mut splitter = LineSplitter::new();
        let mut lines = splitter.push(text);
        let tail = splitter.pending().trim();
        if !tail.is_empty() {
            lines.push(tail.to_string());
        }

        let frames = lines
            .iter()
            .enumerate()
            .map(|(n, line)| {
                decode_frame(line)
                    .map_err(|e| SensorReadError::Io(format!("linha {}: {e}", n + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("{} leituras gravadas carregadas", frames.len());
        Ok(Self::new(frames))
    }

    /// Carrega as leituras de um arquivo.
    pub fn from_file(path: &Path) -> Result<Self, SensorReadError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SensorReadError::Io(format!("{}: {e}", path.display())))?;
        let sensors = Self::from_text(&content)?;
        info!(
            "Leituras gravadas: {} frames de {}",
            sensors.frames.len(),
            path.display()
        );
        Ok(sensors)
    }

    /// Frames ainda não consumidos.
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }

    fn current(&self) -> Result<&SensorFrame, SensorReadError> {
        self.frames
            .get(self.cursor)
            .ok_or(SensorReadError::Exhausted(self.frames.len()))
    }
}

impl TouchSensor for ScriptedSensors {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        Ok(self.current()?.touch(pin))
    }
}

impl SoundSensor for ScriptedSensors {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        let level = self.current()?.sound_level;
        self.cursor += 1;
        Ok(level)
    }
}

// ──────────────────────────────────────────────
// Backend selecionado por configuração
// ──────────────────────────────────────────────

/// Backend escolhido em tempo de execução (`[sender].backend`).
#[derive(Debug, Clone)]
pub enum SensorBackend {
    Simulated(SimulatedBoard),
    Scripted(ScriptedSensors),
}

impl TouchSensor for SensorBackend {
    fn is_touched(&mut self, pin: TouchPin) -> Result<bool, SensorReadError> {
        match self {
            SensorBackend::Simulated(b) => b.is_touched(pin),
            SensorBackend::Scripted(b) => b.is_touched(pin),
        }
    }
}

impl SoundSensor for SensorBackend {
    fn sound_level(&mut self) -> Result<u16, SensorReadError> {
        match self {
            SensorBackend::Simulated(b) => b.sound_level(),
            SensorBackend::Scripted(b) => b.sound_level(),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

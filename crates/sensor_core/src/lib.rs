//! # Sensor Core
//!
//! Crate compartilhada com o produtor de frames de sensores, o formato de
//! texto `touch0,touch1,soundLevel`, os transportes estilo rádio e a
//! configuração TOML usados pelos binários sender, receiver e web.
//!
//! ## Módulos
//! - [`types`] – `SensorFrame` e `EncodedFrame`
//! - [`sensors`] – Traits `TouchSensor`/`SoundSensor` e backends
//! - [`producer`] – Amostragem + codificação de um frame
//! - [`protocol`] – Encode/decode de texto e separação de linhas
//! - [`transport`] – Rádio emulado (UDP) e loopback em memória
//! - [`sink`] – Destinos de frame (console, transporte)
//! - [`driver`] – Laços de envio e recepção com cancelamento
//! - [`config`] – Configuração unificada via TOML

pub mod types;
pub mod sensors;
pub mod producer;
pub mod protocol;
pub mod transport;
pub mod sink;
pub mod driver;
pub mod config;

// Re-exports convenientes
pub use types::{EncodedFrame, SensorFrame, TouchPin};
pub use sensors::{SensorReadError, SoundSensor, TouchSensor};
pub use producer::FrameProducer;
pub use protocol::{decode_frame, encode_frame};
pub use config::{AppConfig, ReceiverConfig, SenderConfig, WebConfig};

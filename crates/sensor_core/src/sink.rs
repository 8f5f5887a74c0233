//! Destinos de frames: console ou transporte.

use crate::transport::{Transport, TransportError};
use crate::types::EncodedFrame;
use std::io::Write;

/// Falha do destino, propagada sem tradução.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Erro ao escrever no console: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Destino de um frame codificado.
pub trait FrameSink {
    fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError>;
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError> {
        (**self).deliver(frame)
    }
}

/// Escreve cada frame numa linha (equivalente ao `print`).
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for ConsoleSink<W> {
    fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError> {
        writeln!(self.out, "{frame}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Encaminha cada frame para [`Transport::send`].
///
/// O transporte já deve estar ligado e configurado.
#[derive(Debug)]
pub struct TransportSink<T> {
    transport: T,
}

impl<T: Transport> TransportSink<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> FrameSink for TransportSink<T> {
    fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError> {
        self.transport.send(frame)?;
        Ok(())
    }
}

//! Thread de rede que escuta o rádio e envia frames para a thread principal via channel.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use sensor_core::config::ReceiverConfig;
use sensor_core::driver::{ShutdownFlag, run_receiver};
use sensor_core::sink::{FrameSink, SinkError};
use sensor_core::transport::{Transport, TransportError, UdpTransport};
use sensor_core::types::{EncodedFrame, SensorFrame};
use sensor_core::decode_frame;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Capacidade do channel entre a rede e a impressão.
const CHANNEL_CAPACITY: usize = 64;

/// Mensagem enviada da thread de rede para a thread principal.
#[derive(Debug, Clone)]
pub struct NetMessage {
    pub frame: EncodedFrame,
    /// Frame interpretado, `None` se o texto não é `p0,p1,s`
    pub decoded: Option<SensorFrame>,
}

impl NetMessage {
    pub fn new(frame: EncodedFrame) -> Self {
        let decoded = match decode_frame(frame.as_str()) {
            Ok(f) => Some(f),
            Err(e) => {
                debug!("Frame não interpretável {:?}: {e}", frame.as_str());
                None
            }
        };
        Self { frame, decoded }
    }
}

/// Sink que encaminha frames para o channel.
///
/// Non-blocking: se a thread principal está lenta, descarta o frame.
pub struct ChannelSink {
    tx: Sender<NetMessage>,
}

impl ChannelSink {
    pub fn new(tx: Sender<NetMessage>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelSink {
    fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError> {
        match self.tx.try_send(NetMessage::new(frame.clone())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Channel cheio, descartando frame"),
            Err(TrySendError::Disconnected(_)) => debug!("Channel fechado, descartando frame"),
        }
        Ok(())
    }
}

/// Inicia a thread de rede. Retorna o receiver do channel.
///
/// A thread termina com erro apenas se a configuração do rádio é
/// inutilizável; falhas de bind são tentadas de novo.
pub fn spawn_receiver_thread(
    config: ReceiverConfig,
    shutdown: ShutdownFlag,
) -> std::io::Result<(Receiver<NetMessage>, JoinHandle<Result<(), TransportError>>)> {
    let (tx, rx) = bounded::<NetMessage>(CHANNEL_CAPACITY);

    let handle = std::thread::Builder::new()
        .name("radio-receiver".into())
        .spawn(move || receiver_loop(tx, &config, &shutdown))?;

    Ok((rx, handle))
}

fn receiver_loop(
    tx: Sender<NetMessage>,
    config: &ReceiverConfig,
    shutdown: &ShutdownFlag,
) -> Result<(), TransportError> {
    let mut sink = ChannelSink::new(tx);

    while !shutdown.is_shutdown_requested() {
        let mut radio =
            UdpTransport::listener("0.0.0.0", config.port).with_source_filter(&config.sender_ip)?;

        let bring_up = radio
            .enable()
            .and_then(|()| radio.configure(config.transport_config()));
        if let Err(e) = bring_up {
            error!("Falha ao ligar o rádio na porta {}: {e}. Tentando novamente em 2s...", config.port);
            std::thread::sleep(Duration::from_secs(2));
            continue;
        }

        let mode = if config.sender_ip.is_empty() {
            "Auto (qualquer origem)"
        } else {
            config.sender_ip.as_str()
        };
        info!(
            "Receiver escutando em 0.0.0.0:{} – Grupo: {} – Modo: {mode}",
            config.port, config.group_id
        );

        if let Err(e) = run_receiver(&mut radio, &mut sink, config.poll_interval(), shutdown) {
            error!("Recepção interrompida: {e}. Religando em 2s...");
            std::thread::sleep(Duration::from_secs(2));
        }
    }

    Ok(())
}

//! Laços de execução: amostragem → sink, e recepção → sink.
//!
//! Ambos rodam até um [`ShutdownFlag`] ser acionado (ou até `max_frames`
//! no laço de envio). Cada tick é independente.

use crate::producer::FrameProducer;
use crate::sensors::{SensorReadError, SoundSensor, TouchSensor};
use crate::sink::FrameSink;
use crate::transport::{Transport, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Sinal de cancelamento compartilhável entre threads.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// O que fazer quando uma leitura de sensor falha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Loga, pula o tick e continua
    #[default]
    LogAndContinue,
    /// Encerra o laço com erro
    Stop,
}

/// Parâmetros do laço de envio.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Período entre ticks
    pub interval: Duration,
    /// Encerra após N frames entregues (`None` = sem limite)
    pub max_frames: Option<u64>,
    pub on_read_error: ErrorPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(20),
            max_frames: None,
            on_read_error: ErrorPolicy::LogAndContinue,
        }
    }
}

/// Contadores de uma execução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_sent: u64,
    pub read_errors: u64,
    pub sink_errors: u64,
}

/// Erro que encerra um laço.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Leitura de sensor falhou: {0}")]
    Sensor(#[from] SensorReadError),

    #[error("Transporte falhou: {0}")]
    Transport(#[from] TransportError),
}

/// Laço de envio: amostra, entrega a um sink, dorme o restante do intervalo.
///
/// Erros do sink são logados e contados; erros de leitura seguem
/// [`DriverOptions::on_read_error`]. Um tick com erro de leitura nunca
/// chega ao sink. Leituras gravadas esgotadas encerram o laço normalmente,
/// qualquer que seja a política.
pub fn run_driver<B, S>(
    producer: &mut FrameProducer<B>,
    sink: &mut S,
    options: &DriverOptions,
    shutdown: &ShutdownFlag,
) -> Result<RunStats, DriverError>
where
    B: TouchSensor + SoundSensor,
    S: FrameSink + ?Sized,
{
    let mut stats = RunStats::default();

    loop {
        if shutdown.is_shutdown_requested() {
            info!("Encerramento solicitado após {} frames", stats.frames_sent);
            break;
        }
        if options.max_frames.is_some_and(|max| stats.frames_sent >= max) {
            debug!("Limite de {} frames atingido", stats.frames_sent);
            break;
        }

        let cycle_start = Instant::now();

        match producer.sample_and_encode() {
            Ok(frame) => match sink.deliver(&frame) {
                Ok(()) => stats.frames_sent += 1,
                Err(e) => {
                    stats.sink_errors += 1;
                    error!("Erro ao entregar frame: {e}");
                }
            },
            Err(SensorReadError::Exhausted(n)) => {
                info!("Leituras gravadas esgotadas após {n} ticks");
                break;
            }
            Err(e) => {
                stats.read_errors += 1;
                match options.on_read_error {
                    ErrorPolicy::LogAndContinue => warn!("Erro de leitura: {e}"),
                    ErrorPolicy::Stop => return Err(e.into()),
                }
            }
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < options.interval {
            std::thread::sleep(options.interval - elapsed);
        }
    }

    Ok(stats)
}

/// Laço de recepção: consulta o transporte e entrega o que chegar.
///
/// Dorme `poll_interval` quando nada chegou. Erros do transporte
/// encerram o laço; erros do sink são logados.
pub fn run_receiver<T, S>(
    transport: &mut T,
    sink: &mut S,
    poll_interval: Duration,
    shutdown: &ShutdownFlag,
) -> Result<RunStats, DriverError>
where
    T: Transport + ?Sized,
    S: FrameSink + ?Sized,
{
    let mut stats = RunStats::default();

    while !shutdown.is_shutdown_requested() {
        match transport.receive()? {
            Some(frame) => match sink.deliver(&frame) {
                Ok(()) => stats.frames_sent += 1,
                Err(e) => {
                    stats.sink_errors += 1;
                    error!("Erro ao entregar frame: {e}");
                }
            },
            None => std::thread::sleep(poll_interval),
        }
    }

    info!("Recepção encerrada após {} frames", stats.frames_sent);
    Ok(stats)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{FixedSensors, MissingSensor, ScriptedSensors};
    use crate::sink::{ConsoleSink, SinkError};
    use crate::transport::{TransportConfig, loopback_pair};
    use crate::types::EncodedFrame;

    /// Sink que registra frames e pode falhar sob demanda.
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<String>,
        fail: bool,
    }

    impl FrameSink for RecordingSink {
        fn deliver(&mut self, frame: &EncodedFrame) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Transport(TransportError::Disconnected));
            }
            self.frames.push(frame.to_string());
            Ok(())
        }
    }

    fn fast(max_frames: Option<u64>, on_read_error: ErrorPolicy) -> DriverOptions {
        DriverOptions {
            interval: Duration::ZERO,
            max_frames,
            on_read_error,
        }
    }

    #[test]
    fn stops_after_max_frames() {
        let mut producer = FrameProducer::new(FixedSensors::new(true, false, 37));
        let mut sink = RecordingSink::default();
        let stats = run_driver(
            &mut producer,
            &mut sink,
            &fast(Some(3), ErrorPolicy::Stop),
            &ShutdownFlag::new(),
        )
        .unwrap();

        assert_eq!(stats.frames_sent, 3);
        assert_eq!(sink.frames, vec!["1,0,37"; 3]);
    }

    #[test]
    fn stops_immediately_when_shutdown_requested() {
        let shutdown = ShutdownFlag::new();
        shutdown.request_shutdown();
        let mut producer = FrameProducer::new(FixedSensors::default());
        let mut sink = RecordingSink::default();

        let stats = run_driver(&mut producer, &mut sink, &fast(None, ErrorPolicy::Stop), &shutdown)
            .unwrap();
        assert_eq!(stats, RunStats::default());
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn shutdown_from_another_thread() {
        let shutdown = ShutdownFlag::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.request_shutdown();
        });

        let mut producer = FrameProducer::new(FixedSensors::default());
        let mut sink = RecordingSink::default();
        let options = DriverOptions {
            interval: Duration::from_millis(1),
            ..Default::default()
        };
        let stats = run_driver(&mut producer, &mut sink, &options, &shutdown).unwrap();
        handle.join().unwrap();

        assert!(stats.frames_sent > 0);
        assert!(shutdown.is_shutdown_requested());
    }

    #[test]
    fn read_error_with_stop_policy_never_reaches_sink() {
        let mut producer = FrameProducer::new(MissingSensor);
        let mut sink = RecordingSink::default();
        let result = run_driver(
            &mut producer,
            &mut sink,
            &fast(Some(5), ErrorPolicy::Stop),
            &ShutdownFlag::new(),
        );

        assert!(matches!(result, Err(DriverError::Sensor(_))));
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn read_errors_are_skipped_with_log_policy() {
        let mut producer = FrameProducer::new(MissingSensor);
        let shutdown = ShutdownFlag::new();
        let mut sink = RecordingSink::default();

        // Toda leitura falha; o limite nunca é atingido, então encerramos
        // via flag depois de alguns ticks.
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request_shutdown();
        });
        let options = DriverOptions {
            interval: Duration::from_millis(1),
            max_frames: Some(2),
            on_read_error: ErrorPolicy::LogAndContinue,
        };
        let stats = run_driver(&mut producer, &mut sink, &options, &shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(stats.frames_sent, 0);
        assert!(stats.read_errors > 1);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn exhausted_script_ends_loop_before_max_frames() {
        for policy in [ErrorPolicy::LogAndContinue, ErrorPolicy::Stop] {
            let mut producer =
                FrameProducer::new(ScriptedSensors::from_text("1,1,5\n").unwrap());
            let mut sink = RecordingSink::default();
            let stats = run_driver(
                &mut producer,
                &mut sink,
                &fast(Some(2), policy),
                &ShutdownFlag::new(),
            )
            .unwrap();

            assert_eq!(stats.frames_sent, 1);
            assert_eq!(stats.read_errors, 0);
            assert_eq!(sink.frames, vec!["1,1,5"]);
        }
    }

    #[test]
    fn sink_errors_are_counted_and_loop_continues() {
        let mut producer = FrameProducer::new(FixedSensors::default());
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let shutdown = ShutdownFlag::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request_shutdown();
        });
        let options = DriverOptions {
            interval: Duration::from_millis(1),
            max_frames: Some(1),
            on_read_error: ErrorPolicy::Stop,
        };
        let stats = run_driver(&mut producer, &mut sink, &options, &shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(stats.frames_sent, 0);
        assert!(stats.sink_errors > 1);
    }

    #[test]
    fn driver_feeds_receiver_over_loopback() {
        let (mut tx, mut rx) = loopback_pair();
        for t in [&mut tx, &mut rx] {
            t.enable().unwrap();
            t.configure(TransportConfig::with_group(42)).unwrap();
        }

        let mut producer = FrameProducer::new(FixedSensors::new(false, true, 255));
        let mut sink = crate::sink::TransportSink::new(tx);
        run_driver(
            &mut producer,
            &mut sink,
            &fast(Some(2), ErrorPolicy::Stop),
            &ShutdownFlag::new(),
        )
        .unwrap();

        let mut frames = Vec::new();
        while let Some(f) = rx.receive().unwrap() {
            frames.push(f.into_string());
        }
        assert_eq!(frames, vec!["0,1,255", "0,1,255"]);
    }

    #[test]
    fn receiver_prints_until_shutdown() {
        let (mut tx, mut rx) = loopback_pair();
        for t in [&mut tx, &mut rx] {
            t.enable().unwrap();
            t.configure(TransportConfig::default()).unwrap();
        }
        tx.send(&EncodedFrame::from_text("1,0,37")).unwrap();
        tx.send(&EncodedFrame::from_text("0,0,0")).unwrap();

        let shutdown = ShutdownFlag::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.request_shutdown();
        });

        let mut sink = ConsoleSink::new(Vec::new());
        let stats = run_receiver(&mut rx, &mut sink, Duration::from_millis(1), &shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(stats.frames_sent, 2);
        assert_eq!(sink.into_inner(), b"1,0,37\n0,0,0\n");
    }

    #[test]
    fn receiver_stops_on_transport_error() {
        let (_tx, mut rx) = loopback_pair();
        let mut sink = ConsoleSink::new(Vec::new());
        let result = run_receiver(&mut rx, &mut sink, Duration::ZERO, &ShutdownFlag::new());
        assert!(matches!(result, Err(DriverError::Transport(TransportError::Disabled))));
    }
}

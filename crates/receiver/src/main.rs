//! # Sensor Receiver
//!
//! Escuta o rádio (UDP) e imprime cada frame recebido no stdout, uma
//! linha por frame, exatamente como chegou.
//!
//! ## Uso
//! ```bash
//! sensor_receiver
//! sensor_receiver --config outro.toml
//! ```

mod net_thread;

use sensor_core::config::AppConfig;
use sensor_core::driver::ShutdownFlag;
use sensor_core::sink::{ConsoleSink, FrameSink};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Config ──
    let mut args = std::env::args().skip(1);
    let config_path = match (args.next().as_deref(), args.next()) {
        (None, _) => AppConfig::default_path(),
        (Some("--config"), Some(path)) => PathBuf::from(path),
        (Some(other), _) => {
            error!("Argumento inválido: {other} (uso: --config <path>)");
            return ExitCode::FAILURE;
        }
    };
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config: {e}");
        }
        return ExitCode::FAILURE;
    }

    // ── Thread de rede ──
    let shutdown = ShutdownFlag::new();
    let (rx, handle) = match net_thread::spawn_receiver_thread(config.receiver.clone(), shutdown.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Falha ao criar thread de rede: {e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Display ──
    let mut display = ConsoleSink::stdout();
    let mut received: u64 = 0;
    for msg in rx {
        if let Err(e) = display.deliver(&msg.frame) {
            // stdout fechado (ex: pipe encerrado): não há mais para onde imprimir
            error!("{e}");
            shutdown.request_shutdown();
            break;
        }
        received += 1;
        if let Some(frame) = msg.decoded {
            debug!(
                "P0:{} P1:{} S:{}",
                u8::from(frame.touch0),
                u8::from(frame.touch1),
                frame.sound_level
            );
        }
    }

    match handle.join() {
        Ok(Ok(())) => {
            info!("Receiver encerrado após {received} frames");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("Rádio inutilizável: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("Thread de rede terminou com pânico");
            ExitCode::FAILURE
        }
    }
}

//! # Sensor Sender
//!
//! Amostra os pinos de toque e o microfone e envia cada frame
//! `touch0,touch1,soundLevel` pelo rádio (UDP) ou imprime no console.
//!
//! ## Uso
//! ```bash
//! sensor_sender                         # Rádio, grupo do config.toml
//! sensor_sender --console               # Imprime frames no stdout
//! sensor_sender --frames 100            # Encerra após 100 frames
//! sensor_sender --config outro.toml
//! ```
//!
//! Logs vão para o stderr; no modo console o stdout contém apenas frames.

mod args;

use args::SenderArgs;
use sensor_core::config::AppConfig;
use sensor_core::driver::{ShutdownFlag, run_driver};
use sensor_core::sink::{ConsoleSink, FrameSink, TransportSink};
use sensor_core::transport::{Transport, UdpTransport};
use sensor_core::FrameProducer;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match SenderArgs::parse(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Carregar config ──
    let config_path = args.config_path.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
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

    let sender_cfg = &config.sender;
    let mut options = sender_cfg.driver_options();
    if args.frames.is_some() {
        options.max_frames = args.frames;
    }
    let use_console = args.console || sender_cfg.sink == "console";

    // ── Sensores ──
    let backend = match sender_cfg.build_backend() {
        Ok(b) => b,
        Err(e) => {
            error!("Falha ao iniciar sensores: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Backend de sensores: {}", sender_cfg.backend);
    let mut producer = FrameProducer::new(backend);

    // ── Sink ──
    let dest_addr = format!("{}:{}", sender_cfg.dest_ip, sender_cfg.port);
    let mut sink: Box<dyn FrameSink> = if use_console {
        Box::new(ConsoleSink::stdout())
    } else {
        let mut radio = UdpTransport::sender(&sender_cfg.bind_ip, &sender_cfg.dest_ip, sender_cfg.port);
        let bring_up = radio
            .enable()
            .and_then(|()| radio.configure(sender_cfg.transport_config()));
        if let Err(e) = bring_up {
            error!("Falha ao ligar o rádio: {e}");
            return ExitCode::FAILURE;
        }
        Box::new(TransportSink::new(radio))
    };

    // ── Banner ──
    eprintln!();
    eprintln!("══════════════════════════════════════════════");
    eprintln!("   ⚡ SENSOR SENDER – ATIVO");
    eprintln!("══════════════════════════════════════════════");
    if use_console {
        eprintln!("  Destino:   console (stdout)");
    } else {
        eprintln!("  Destino:   {dest_addr} (grupo {})", sender_cfg.group_id);
    }
    eprintln!("  Intervalo: {:.3}s", options.interval.as_secs_f64());
    eprintln!("  Formato:   touch0,touch1,soundLevel");
    eprintln!("══════════════════════════════════════════════");
    eprintln!();

    // ── Loop principal ──
    let shutdown = ShutdownFlag::new();
    match run_driver(&mut producer, &mut sink, &options, &shutdown) {
        Ok(stats) => {
            info!(
                "Encerrado: {} frames enviados | {} erros de leitura | {} erros de envio",
                stats.frames_sent, stats.read_errors, stats.sink_errors
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

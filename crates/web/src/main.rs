//! # Sensor Web
//!
//! Serve a página estática do jogo que consome os frames `p0,p1,s`
//! do micro:bit via Web Serial. Uma única rota de página: `GET /`.
//!
//! ## Uso
//! ```bash
//! sensor_web                       # http://127.0.0.1:5000/
//! sensor_web --config outro.toml
//! ```

mod server;

use sensor_core::config::AppConfig;
use sensor_core::driver::ShutdownFlag;
use server::StaticServer;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
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

    let addr = format!("{}:{}", config.web.bind_ip, config.web.port);
    let server = match StaticServer::bind(&addr) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match server.serve(&ShutdownFlag::new()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

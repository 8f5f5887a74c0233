//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável, com seções
//! `[sender]`, `[receiver]` e `[web]`.

use crate::driver::{DriverOptions, ErrorPolicy};
use crate::sensors::{ScriptedSensors, SensorBackend, SensorReadError, SimulatedBoard};
use crate::transport::{DEFAULT_GROUP, DEFAULT_MAX_LENGTH, MAX_FRAME_LEN, TransportConfig};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Erros ao salvar a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao escrever {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuração do Sender (placa com sensores).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Destino dos frames: "radio" ou "console"
    pub sink: String,
    /// Grupo do rádio
    pub group_id: u8,
    /// Tamanho máximo do frame no rádio (bytes)
    pub max_length: usize,
    /// IP de destino (255.255.255.255 para broadcast)
    pub dest_ip: String,
    /// Porta UDP
    pub port: u16,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
    /// Intervalo entre amostras em segundos
    pub interval_secs: f64,
    /// Backend de sensores: "simulated" ou "scripted"
    pub backend: String,
    /// Arquivo `p0,p1,s` para o backend "scripted"
    pub script_path: String,
    /// Seed da placa simulada
    pub seed: u64,
    /// Em erro de leitura: "log" (continua) ou "stop"
    pub on_read_error: String,
    /// Encerra após N frames (0 = sem limite)
    pub max_frames: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            sink: "radio".into(),
            group_id: DEFAULT_GROUP,
            max_length: DEFAULT_MAX_LENGTH,
            dest_ip: "255.255.255.255".into(),
            port: 5005,
            bind_ip: String::new(),
            interval_secs: 0.02,
            backend: "simulated".into(),
            script_path: String::new(),
            seed: 42,
            on_read_error: "log".into(),
            max_frames: 0,
        }
    }
}

impl SenderConfig {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            group_id: self.group_id,
            max_length: self.max_length,
        }
    }

    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            interval: Duration::try_from_secs_f64(self.interval_secs)
                .unwrap_or(DriverOptions::default().interval),
            max_frames: (self.max_frames > 0).then_some(self.max_frames),
            on_read_error: if self.on_read_error == "stop" {
                ErrorPolicy::Stop
            } else {
                ErrorPolicy::LogAndContinue
            },
        }
    }

    /// Instancia o backend de sensores configurado.
    pub fn build_backend(&self) -> Result<SensorBackend, SensorReadError> {
        match self.backend.as_str() {
            "scripted" => {
                ScriptedSensors::from_file(Path::new(&self.script_path)).map(SensorBackend::Scripted)
            }
            _ => Ok(SensorBackend::Simulated(SimulatedBoard::new(self.seed))),
        }
    }
}

const DEFAULT_POLL_INTERVAL_SECS: f64 = 0.01;

/// Configuração do Receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Porta UDP para escutar
    pub port: u16,
    /// Grupo do rádio
    pub group_id: u8,
    /// Tamanho máximo do frame aceito (bytes)
    pub max_length: usize,
    /// IP do sender (vazio = qualquer origem)
    pub sender_ip: String,
    /// Espera entre consultas quando nada chegou (segundos)
    pub poll_interval_secs: f64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: 5005,
            group_id: DEFAULT_GROUP,
            max_length: DEFAULT_MAX_LENGTH,
            sender_ip: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ReceiverConfig {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            group_id: self.group_id,
            max_length: self.max_length,
        }
    }

    /// Espera entre consultas; valor negativo ou não finito usa o padrão.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS))
    }
}

/// Configuração do servidor web da página estática.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_ip: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_ip: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Configuração raiz (unifica sender, receiver e web).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub receiver: ReceiverConfig,
    pub web: WebConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Arquivo ausente ou inválido resulta na configuração padrão.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let s = &self.sender;

        if s.port == 0 {
            errors.push("Porta do sender não pode ser 0".into());
        }
        if s.sink != "radio" && s.sink != "console" {
            errors.push(format!("Sink desconhecido: {:?} (radio | console)", s.sink));
        }
        if !(0.0..=60.0).contains(&s.interval_secs) {
            errors.push(format!(
                "Intervalo do sender inválido: {} (0.0–60.0)",
                s.interval_secs
            ));
        }
        match s.backend.as_str() {
            "simulated" => {}
            "scripted" if s.script_path.is_empty() => {
                errors.push("Backend \"scripted\" requer script_path".into());
            }
            "scripted" => {}
            other => errors.push(format!(
                "Backend desconhecido: {other:?} (simulated | scripted)"
            )),
        }
        if s.on_read_error != "log" && s.on_read_error != "stop" {
            errors.push(format!(
                "on_read_error inválido: {:?} (log | stop)",
                s.on_read_error
            ));
        }

        for (who, len) in [("sender", s.max_length), ("receiver", self.receiver.max_length)] {
            if len == 0 || len > MAX_FRAME_LEN {
                errors.push(format!(
                    "max_length do {who} inválido: {len} (1–{MAX_FRAME_LEN})"
                ));
            }
        }
        if self.receiver.port == 0 {
            errors.push("Porta do receiver não pode ser 0".into());
        }
        if !(0.0..=60.0).contains(&self.receiver.poll_interval_secs) {
            errors.push(format!(
                "poll_interval_secs do receiver inválido: {} (0.0–60.0)",
                self.receiver.poll_interval_secs
            ));
        }
        if !self.receiver.sender_ip.is_empty()
            && self.receiver.sender_ip.parse::<IpAddr>().is_err()
        {
            errors.push(format!(
                "sender_ip do receiver inválido: {:?}",
                self.receiver.sender_ip
            ));
        }
        if self.web.port == 0 {
            errors.push("Porta do web não pode ser 0".into());
        }

        errors
    }
}

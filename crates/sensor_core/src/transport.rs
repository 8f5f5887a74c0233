//! Transporte ponto-a-ponto estilo rádio.
//!
//! Emula o rádio do micro:bit: o transporte precisa ser ligado
//! ([`Transport::enable`]) e configurado com um grupo
//! ([`Transport::configure`]) antes de enviar ou receber. Frames de outros
//! grupos são descartados silenciosamente na recepção.
//!
//! Formato do datagrama:
//!
//! ```text
//! ┌──────────┬────────────────────────┐
//! │ Grupo(1) │ Frame UTF-8 (N ≤ len)  │
//! └──────────┴────────────────────────┘
//! ```

use crate::types::EncodedFrame;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, info};

/// Grupo padrão (o mesmo dos scripts de rádio originais).
pub const DEFAULT_GROUP: u8 = 42;

/// Tamanho padrão máximo de frame (bytes).
pub const DEFAULT_MAX_LENGTH: usize = 32;

/// Limite absoluto de tamanho de frame do rádio (bytes).
pub const MAX_FRAME_LEN: usize = 251;

/// Erros de transporte. Propagados sem tradução pelos sinks.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transporte desligado (chame enable() antes)")]
    Disabled,

    #[error("Frame muito longo ({len} bytes, máximo {max})")]
    FrameTooLong { len: usize, max: usize },

    #[error("Configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("Endereço inválido: {0}")]
    Address(String),

    #[error("Outro lado do transporte foi fechado")]
    Disconnected,

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Parâmetros do rádio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub group_id: u8,
    /// Tamanho máximo do frame em bytes (1–251)
    pub max_length: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            group_id: DEFAULT_GROUP,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl TransportConfig {
    pub fn with_group(group_id: u8) -> Self {
        Self {
            group_id,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.max_length == 0 || self.max_length > MAX_FRAME_LEN {
            return Err(TransportError::InvalidConfig(format!(
                "max_length {} fora de 1–{MAX_FRAME_LEN}",
                self.max_length
            )));
        }
        Ok(())
    }
}

/// Interface do transporte usada pelo sink e pelo laço de recepção.
pub trait Transport {
    /// Liga o transporte (bind de socket, etc.).
    fn enable(&mut self) -> Result<(), TransportError>;

    /// Aplica grupo e tamanho máximo.
    fn configure(&mut self, config: TransportConfig) -> Result<(), TransportError>;

    /// Envia um frame (fire-and-forget).
    fn send(&mut self, frame: &EncodedFrame) -> Result<(), TransportError>;

    /// Frame recebido neste tick, ou `None` se nada chegou.
    fn receive(&mut self) -> Result<Option<EncodedFrame>, TransportError>;
}

// ──────────────────────────────────────────────
// Envelope do datagrama
// ──────────────────────────────────────────────

/// Monta `[grupo][frame...]`, validando o tamanho.
pub fn encode_datagram(config: &TransportConfig, frame: &EncodedFrame) -> Result<Vec<u8>, TransportError> {
    if frame.len() > config.max_length {
        return Err(TransportError::FrameTooLong {
            len: frame.len(),
            max: config.max_length,
        });
    }

    let mut datagram = Vec::with_capacity(1 + frame.len());
    datagram.push(config.group_id);
    datagram.extend_from_slice(frame.as_bytes());
    Ok(datagram)
}

/// Extrai o frame se o datagrama pertence ao grupo configurado.
pub fn decode_datagram(config: &TransportConfig, data: &[u8]) -> Option<EncodedFrame> {
    let (&group, body) = data.split_first()?;
    if group != config.group_id {
        debug!("Ignorando frame do grupo {group} (esperado: {})", config.group_id);
        return None;
    }
    if body.len() > config.max_length {
        debug!("Ignorando frame de {} bytes (máximo {})", body.len(), config.max_length);
        return None;
    }
    match std::str::from_utf8(body) {
        Ok(text) => Some(EncodedFrame::from_text(text)),
        Err(e) => {
            debug!("Frame não é UTF-8 válido: {e}");
            None
        }
    }
}

// ──────────────────────────────────────────────
// UDP
// ──────────────────────────────────────────────

/// Rádio emulado sobre UDP (broadcast ou unicast).
#[derive(Debug)]
pub struct UdpTransport {
    bind_addr: String,
    dest_addr: Option<String>,
    source_filter: Option<IpAddr>,
    read_timeout: Duration,
    config: TransportConfig,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    /// Transporte de envio: bind efêmero em `bind_ip` (vazio = todas as interfaces).
    pub fn sender(bind_ip: &str, dest_ip: &str, port: u16) -> Self {
        let bind_ip = if bind_ip.is_empty() { "0.0.0.0" } else { bind_ip };
        Self {
            bind_addr: format!("{bind_ip}:0"),
            dest_addr: Some(format!("{dest_ip}:{port}")),
            source_filter: None,
            read_timeout: Duration::from_millis(100),
            config: TransportConfig::default(),
            socket: None,
        }
    }

    /// Transporte de recepção escutando em `bind_ip:port`.
    pub fn listener(bind_ip: &str, port: u16) -> Self {
        let bind_ip = if bind_ip.is_empty() { "0.0.0.0" } else { bind_ip };
        Self {
            bind_addr: format!("{bind_ip}:{port}"),
            dest_addr: None,
            source_filter: None,
            read_timeout: Duration::from_millis(100),
            config: TransportConfig::default(),
            socket: None,
        }
    }

    /// Aceita apenas datagramas vindos de `ip` (vazio = qualquer origem).
    pub fn with_source_filter(mut self, ip: &str) -> Result<Self, TransportError> {
        self.source_filter = if ip.is_empty() {
            None
        } else {
            Some(
                ip.parse()
                    .map_err(|_| TransportError::Address(ip.to_string()))?,
            )
        };
        Ok(self)
    }

    /// Tempo máximo de espera de [`Transport::receive`].
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Endereço local após `enable()`.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        let sock = self.socket.as_ref().ok_or(TransportError::Disabled)?;
        Ok(sock.local_addr()?)
    }

    pub fn config(&self) -> TransportConfig {
        self.config
    }

    fn socket(&self) -> Result<&UdpSocket, TransportError> {
        self.socket.as_ref().ok_or(TransportError::Disabled)
    }
}

impl Transport for UdpTransport {
    fn enable(&mut self) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }

        let sock = UdpSocket::bind(&self.bind_addr)?;
        sock.set_read_timeout(Some(self.read_timeout))?;

        if let Some(dest) = &self.dest_addr {
            let dest_ip = dest
                .rsplit_once(':')
                .and_then(|(ip, _)| ip.parse::<Ipv4Addr>().ok());
            if dest_ip.is_some_and(|ip| ip.is_broadcast()) {
                sock.set_broadcast(true)?;
                info!("Modo BROADCAST ativado");
            } else {
                info!("Modo UNICAST → {dest}");
            }
        }

        info!("Rádio UDP ligado em {}", sock.local_addr()?);
        self.socket = Some(sock);
        Ok(())
    }

    fn configure(&mut self, config: TransportConfig) -> Result<(), TransportError> {
        config.check()?;
        info!("Rádio configurado: grupo {} | máximo {} bytes", config.group_id, config.max_length);
        self.config = config;
        Ok(())
    }

    fn send(&mut self, frame: &EncodedFrame) -> Result<(), TransportError> {
        let sock = self.socket()?;
        let dest = self
            .dest_addr
            .as_deref()
            .ok_or_else(|| TransportError::Address("transporte sem destino".into()))?;
        let datagram = encode_datagram(&self.config, frame)?;
        let sent = sock.send_to(&datagram, dest)?;
        debug!("→ {sent} bytes para {dest}: {frame}");
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<EncodedFrame>, TransportError> {
        let sock = self.socket()?;
        let mut buf = [0u8; MAX_FRAME_LEN + 1];

        match sock.recv_from(&mut buf) {
            Ok((size, addr)) => {
                if let Some(filter) = self.source_filter {
                    if addr.ip() != filter {
                        debug!("Ignorando frame de {} (esperado: {filter})", addr.ip());
                        return Ok(None);
                    }
                }
                Ok(decode_datagram(&self.config, &buf[..size]))
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ──────────────────────────────────────────────
// Loopback em memória
// ──────────────────────────────────────────────

/// Ponta de um par de transportes em memória.
#[derive(Debug)]
pub struct LoopbackTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    enabled: bool,
    config: TransportConfig,
}

/// Cria duas pontas conectadas: o que uma envia, a outra recebe.
pub fn loopback_pair() -> (LoopbackTransport, LoopbackTransport) {
    let (a_tx, b_rx) = unbounded();
    let (b_tx, a_rx) = unbounded();
    (
        LoopbackTransport::new(a_tx, a_rx),
        LoopbackTransport::new(b_tx, b_rx),
    )
}

impl LoopbackTransport {
    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        Self {
            tx,
            rx,
            enabled: false,
            config: TransportConfig::default(),
        }
    }

    fn ensure_enabled(&self) -> Result<(), TransportError> {
        if self.enabled { Ok(()) } else { Err(TransportError::Disabled) }
    }
}

impl Transport for LoopbackTransport {
    fn enable(&mut self) -> Result<(), TransportError> {
        self.enabled = true;
        Ok(())
    }

    fn configure(&mut self, config: TransportConfig) -> Result<(), TransportError> {
        config.check()?;
        self.config = config;
        Ok(())
    }

    fn send(&mut self, frame: &EncodedFrame) -> Result<(), TransportError> {
        self.ensure_enabled()?;
        let datagram = encode_datagram(&self.config, frame)?;
        self.tx.send(datagram).map_err(|_| TransportError::Disconnected)
    }

    fn receive(&mut self) -> Result<Option<EncodedFrame>, TransportError> {
        self.ensure_enabled()?;
        loop {
            match self.rx.try_recv() {
                Ok(data) => {
                    if let Some(frame) = decode_datagram(&self.config, &data) {
                        return Ok(Some(frame));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

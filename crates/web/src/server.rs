//! Servidor HTTP da página estática, sobre `tiny_http`.
//!
//! Rotas:
//! - `GET /` – página do jogo (`templates/index.html`)
//! - `GET /static/js/sketch.js` – script do jogo
//!
//! `HEAD` é aceito nas mesmas rotas. Caminho desconhecido → 404, outro
//! método numa rota conhecida → 405. Requisição malformada → 400 (pelo
//! próprio `tiny_http`).

use sensor_core::driver::ShutdownFlag;
use std::net::SocketAddr;
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

const INDEX_HTML: &str = include_str!("../templates/index.html");
const SKETCH_JS: &str = include_str!("../static/js/sketch.js");

/// Espera máxima por uma requisição antes de reavaliar o ShutdownFlag.
const RECV_POLL: Duration = Duration::from_millis(100);

/// Erros do servidor web.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Falha ao abrir {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Resultado do roteamento de uma requisição.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static str,
}

impl Page {
    fn new(status: u16, content_type: &'static str, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    fn text(status: u16, body: &'static str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    /// Converte para a resposta do `tiny_http`, com os cabeçalhos da rota.
    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_string(self.body).with_status_code(self.status);
        if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            response.add_header(h);
        }
        if self.status == 405 {
            if let Ok(h) = Header::from_bytes(&b"Allow"[..], &b"GET, HEAD"[..]) {
                response.add_header(h);
            }
        }
        response
    }
}

/// Escolhe a página para `method` + `target` (query string ignorada).
pub fn route(method: &str, target: &str) -> Page {
    let path = target.split_once('?').map_or(target, |(p, _)| p);

    let found = match path {
        "/" => Some(Page::new(200, "text/html; charset=utf-8", INDEX_HTML)),
        "/static/js/sketch.js" => Some(Page::new(
            200,
            "text/javascript; charset=utf-8",
            SKETCH_JS,
        )),
        _ => None,
    };

    match (found, method) {
        (None, _) => Page::text(404, "Not Found\n"),
        (Some(page), "GET" | "HEAD") => page,
        (Some(_), _) => Page::text(405, "Method Not Allowed\n"),
    }
}

/// Servidor da página estática.
pub struct StaticServer {
    server: Server,
}

impl std::fmt::Debug for StaticServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticServer").finish_non_exhaustive()
    }
}

impl StaticServer {
    pub fn bind(addr: &str) -> Result<Self, WebError> {
        let server = Server::http(addr).map_err(|e| WebError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { server })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Atende requisições até o encerramento ser solicitado.
    pub fn serve(&self, shutdown: &ShutdownFlag) -> Result<(), WebError> {
        match self.local_addr() {
            Some(addr) => info!("Servidor web em http://{addr}/"),
            None => info!("Servidor web iniciado"),
        }

        while !shutdown.is_shutdown_requested() {
            if let Some(request) = self.server.recv_timeout(RECV_POLL)? {
                handle_request(request);
            }
        }

        info!("Servidor web encerrado");
        Ok(())
    }
}

fn handle_request(request: Request) {
    let page = route(request.method().as_str(), request.url());
    debug!("{} {} → {}", request.method(), request.url(), page.status);

    let peer = request.remote_addr().copied();
    if let Err(e) = request.respond(page.into_response()) {
        match peer {
            Some(peer) => warn!("Erro respondendo {peer}: {e}"),
            None => warn!("Erro respondendo: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn root_renders_page() {
        let page = route("GET", "/");
        assert_eq!(page.status, 200);
        assert!(page.content_type.starts_with("text/html"));
        assert!(page.body.contains("id=\"p5host\""));
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(route("GET", "/?x=1").status, 200);
    }

    #[test]
    fn serves_sketch_script() {
        let page = route("GET", "/static/js/sketch.js");
        assert_eq!(page.status, 200);
        assert!(page.body.contains("function parseFrame"));
    }

    #[test]
    fn unknown_path_is_404() {
        assert_eq!(route("GET", "/admin").status, 404);
        assert_eq!(route("POST", "/nope").status, 404);
    }

    #[test]
    fn wrong_method_is_405() {
        assert_eq!(route("POST", "/").status, 405);
        assert_eq!(route("HEAD", "/").status, 200);
    }

    fn request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn serves_over_tcp_until_shutdown() {
        let server = StaticServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = ShutdownFlag::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || server.serve(&remote));

        let page = request(addr, "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        assert!(page.starts_with("HTTP/1.1 200"), "{page}");
        assert!(page.contains("text/html"));
        assert!(page.ends_with(INDEX_HTML));

        let head = request(addr, "HEAD / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        assert!(head.starts_with("HTTP/1.1 200"), "{head}");
        assert!(!head.contains("p5host"));

        let post = request(addr, "POST / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 0\r\n\r\n");
        assert!(post.starts_with("HTTP/1.1 405"), "{post}");
        assert!(post.contains("Allow: GET, HEAD\r\n"));

        let missing = request(addr, "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        shutdown.request_shutdown();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn bind_failure_names_address() {
        let first = StaticServer::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().unwrap().to_string();
        let err = StaticServer::bind(&addr).unwrap_err();
        assert!(matches!(err, WebError::Bind { .. }));
        assert!(err.to_string().contains(&addr));
    }
}

//! TCP front end: accepts clients and runs one session thread per connection.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use log::{debug, error, info, warn};

use crate::config::ServerSettings;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{self, Session};

pub struct Server {
    listener: TcpListener,
    engine: Arc<Engine>,
    greeting: String,
    clients: Arc<AtomicUsize>,
}

impl Server {
    pub fn bind(settings: &ServerSettings, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind((settings.host.as_str(), settings.port))?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            engine,
            greeting: protocol::greeting(&settings.greeting),
            clients: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn clients(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Accept clients until the listener fails.
    pub fn serve(&self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept()?;
            let engine = Arc::clone(&self.engine);
            let greeting = self.greeting.clone();
            let clients = Arc::clone(&self.clients);

            let spawned = thread::Builder::new()
                .name(format!("client-{peer}"))
                .spawn(move || {
                    let _guard = ClientGuard::register(clients, peer);
                    if let Err(e) = handle_client(stream, engine, &greeting) {
                        debug!("client {peer} dropped: {e}");
                    }
                });
            if let Err(e) = spawned {
                error!("cannot start a thread for {peer}: {e}");
            }
        }
    }
}

/// Keeps the connected-client count in step with live sessions.
struct ClientGuard {
    clients: Arc<AtomicUsize>,
    peer: SocketAddr,
}

impl ClientGuard {
    fn register(clients: Arc<AtomicUsize>, peer: SocketAddr) -> Self {
        let now = clients.fetch_add(1, Ordering::SeqCst) + 1;
        info!("client {peer} connected ({now} connected)");
        Self { clients, peer }
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        let now = self.clients.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("client {} disconnected ({now} connected)", self.peer);
    }
}

fn handle_client(stream: TcpStream, engine: Arc<Engine>, greeting: &str) -> Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    writer.write_all(greeting.as_bytes())?;
    writer.flush()?;

    let mut session = Session::new(engine);
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("read failed: {e}");
                break;
            }
        };
        let reply = session.handle(line.trim_end_matches('\r'));
        writer.write_all(reply.text.as_bytes())?;
        writer.flush()?;
        if reply.quit {
            break;
        }
    }
    Ok(())
}

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mysql::{Conn, OptsBuilder};
use ssh2::{Channel, Session};
use tracing::{debug, info, instrument, warn};

use crate::config::{AppConfig, DatabaseConfig, SshConfig};
use crate::error::{ExportError, Result};

const ACCEPT_POLL: Duration = Duration::from_millis(20);
const PUMP_IDLE: Duration = Duration::from_millis(2);

/// An encrypted forwarding tunnel: connections to the ephemeral local port
/// are proxied through the bastion to the remote database endpoint.
///
/// The tunnel stays open for the lifetime of the value; dropping it stops
/// the forwarding worker and joins it.
pub struct SshTunnel {
    local_port: u16,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SshTunnel {
    /// Connects to the bastion, authenticates, and starts forwarding an
    /// ephemeral loopback port to `remote_host:remote_port`. A single
    /// attempt; any handshake or authentication problem is
    /// [`ExportError::ConnectionFailed`].
    #[instrument(level = "info", skip_all, fields(bastion = %ssh.ssh_host, remote = %remote_host))]
    pub fn open(ssh: &SshConfig, remote_host: &str, remote_port: u16) -> Result<Self> {
        let session = connect_session(ssh)?;

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(connection_error)?;
        let local_port = listener.local_addr().map_err(connection_error)?.port();
        listener.set_nonblocking(true).map_err(connection_error)?;
        info!(local_port, "tunnel established");

        let stop = Arc::new(AtomicBool::new(false));
        let worker = thread::spawn({
            let stop = Arc::clone(&stop);
            let remote_host = remote_host.to_string();
            move || forward_loop(session, listener, &remote_host, remote_port, &stop)
        });

        Ok(Self {
            local_port,
            stop,
            worker: Some(worker),
        })
    }

    /// Loopback port the database client should connect to.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }
}

impl Drop for SshTunnel {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Opens the tunnel and a database connection through it, runs `work`, and
/// releases both on every exit path: the connection always closes before
/// the tunnel is torn down.
pub fn with_database<T>(config: &AppConfig, work: impl FnOnce(&mut Conn) -> Result<T>) -> Result<T> {
    let tunnel = SshTunnel::open(
        &config.ssh,
        &config.database.db_host,
        config.database.db_port,
    )?;
    let mut conn = connect_database(&config.database, tunnel.local_port())?;
    info!("successfully connected to the database");

    let outcome = work(&mut conn);

    // Teardown order matters: connection first, tunnel second.
    drop(conn);
    drop(tunnel);
    outcome
}

fn connect_session(ssh: &SshConfig) -> Result<Session> {
    let tcp = TcpStream::connect((ssh.ssh_host.as_str(), ssh.ssh_port)).map_err(connection_error)?;
    let mut session = Session::new().map_err(connection_error)?;
    session.set_tcp_stream(tcp);
    session.handshake().map_err(connection_error)?;
    authenticate(&session, ssh)?;
    Ok(session)
}

/// Key authentication when a key path is configured; plain password
/// authentication otherwise.
fn authenticate(session: &Session, ssh: &SshConfig) -> Result<()> {
    match (&ssh.ssh_key_path, &ssh.ssh_password) {
        (Some(key_path), _) => session
            .userauth_pubkey_file(
                &ssh.ssh_username,
                None,
                key_path,
                ssh.ssh_private_key_password.as_deref(),
            )
            .map_err(connection_error),
        (None, Some(password)) => session
            .userauth_password(&ssh.ssh_username, password)
            .map_err(connection_error),
        (None, None) => Err(ExportError::ConnectionFailed(
            "no SSH key path or password configured".to_string(),
        )),
    }
}

fn connect_database(db: &DatabaseConfig, local_port: u16) -> Result<Conn> {
    let opts = OptsBuilder::new()
        .ip_or_hostname(Some("127.0.0.1"))
        .tcp_port(local_port)
        .user(Some(&db.db_user))
        .pass(Some(&db.db_password))
        .db_name(Some(&db.db_name))
        // Loopback must go over TCP so traffic enters the tunnel.
        .prefer_socket(false)
        .init(vec![format!("SET NAMES {}", db.charset)]);
    Conn::new(opts).map_err(|error| ExportError::ConnectionFailed(error.to_string()))
}

fn connection_error(error: impl std::fmt::Display) -> ExportError {
    ExportError::ConnectionFailed(error.to_string())
}

/// Accepts local connections until the stop flag is raised, forwarding each
/// through a direct-tcpip channel. Connections are served one at a time;
/// the exporter opens exactly one.
fn forward_loop(
    session: Session,
    listener: TcpListener,
    remote_host: &str,
    remote_port: u16,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "forwarding local connection");
                if let Err(error) = forward_connection(&session, stream, remote_host, remote_port, stop)
                {
                    warn!(%error, "tunnel forwarding ended with an error");
                }
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(error) => {
                warn!(%error, "tunnel listener failed");
                break;
            }
        }
    }
}

fn forward_connection(
    session: &Session,
    mut stream: TcpStream,
    remote_host: &str,
    remote_port: u16,
    stop: &AtomicBool,
) -> io::Result<()> {
    let mut channel = session
        .channel_direct_tcpip(remote_host, remote_port, None)
        .map_err(io::Error::other)?;

    stream.set_nonblocking(true)?;
    session.set_blocking(false);
    let result = pump(&mut stream, &mut channel, stop);
    session.set_blocking(true);

    let _ = channel.close();
    let _ = channel.wait_close();
    result
}

/// Shuttles bytes both ways until either side reaches EOF or the tunnel is
/// asked to stop. Both the stream and the session are non-blocking here.
fn pump(stream: &mut TcpStream, channel: &mut Channel, stop: &AtomicBool) -> io::Result<()> {
    let mut buffer = [0u8; 16 * 1024];
    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }

        let mut moved = false;
        match stream.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                write_all_retrying(channel, &buffer[..n])?;
                moved = true;
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {}
            Err(error) => return Err(error),
        }

        match channel.read(&mut buffer) {
            Ok(0) => {
                if channel.eof() {
                    return Ok(());
                }
            }
            Ok(n) => {
                write_all_retrying(stream, &buffer[..n])?;
                moved = true;
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {}
            Err(error) => return Err(error),
        }

        if !moved {
            thread::sleep(PUMP_IDLE);
        }
    }
}

/// `write_all` that tolerates `WouldBlock` from a non-blocking sink.
fn write_all_retrying<W: Write>(writer: &mut W, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(PUMP_IDLE);
            }
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

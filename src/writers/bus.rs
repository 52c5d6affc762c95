//! Message bus writer
//!
//! Publishes every record as one message on a subject. Publishing goes through
//! the [`Publisher`] trait; [`NatsPublisher`] implements it with the NATS text
//! protocol over TCP.

use crate::core::{LogWriter, LoggerError, Result};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_SUBJECT: &str = "default-logger-subject";
pub const DEFAULT_URL: &str = "nats://127.0.0.1:4222";
const DEFAULT_PORT: u16 = 4222;
const IO_TIMEOUT: Duration = Duration::from_secs(5);

pub trait Publisher: Send + Sync {
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Writer that publishes each record on a fixed subject.
///
/// Trailing `\n` or `\r\n` is removed, so each message carries exactly one record.
pub struct BusWriter {
    subject: String,
    publisher: Arc<dyn Publisher>,
}

impl BusWriter {
    /// # Errors
    ///
    /// Returns error if the subject is empty or contains whitespace
    pub fn new(subject: impl Into<String>, publisher: Arc<dyn Publisher>) -> Result<Self> {
        let subject = subject.into();
        validate_subject(&subject)?;
        Ok(Self { subject, publisher })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() {
        return Err(LoggerError::config("bus writer", "subject must not be empty"));
    }
    if subject.chars().any(char::is_whitespace) {
        return Err(LoggerError::config(
            "bus writer",
            format!("subject '{}' contains whitespace", subject),
        ));
    }
    Ok(())
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

impl LogWriter for BusWriter {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        self.publisher.publish(&self.subject, trim_line_end(bytes))
    }

    fn flush(&self) -> Result<()> {
        self.publisher.flush()
    }

    fn name(&self) -> &str {
        "bus"
    }
}

/// `host:port` from a `nats://host[:port]` URL.
fn socket_address(url: &str) -> Result<String> {
    let rest = url.strip_prefix("nats://").unwrap_or(url);
    // Other schemes (tls://, ws://), credentials and paths are not supported.
    if rest.contains("://") {
        return Err(LoggerError::config("nats", format!("unsupported url '{}'", url)));
    }
    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() || host.contains('@') {
        return Err(LoggerError::config("nats", format!("unsupported url '{}'", url)));
    }
    if host.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        Ok(host.to_string())
    } else {
        Ok(format!("{}:{}", host, DEFAULT_PORT))
    }
}

struct Connection {
    stream: Arc<Mutex<TcpStream>>,
}

impl Connection {
    fn open(address: &str, client_name: &str) -> Result<Self> {
        let failed = |e: std::io::Error| LoggerError::connection(address, e.to_string());

        let stream = TcpStream::connect(address).map_err(failed)?;
        stream.set_write_timeout(Some(IO_TIMEOUT)).map_err(failed)?;
        stream.set_read_timeout(Some(IO_TIMEOUT)).map_err(failed)?;
        stream.set_nodelay(true).map_err(failed)?;

        let mut reader = BufReader::new(stream.try_clone().map_err(failed)?);
        let mut info = String::new();
        reader.read_line(&mut info).map_err(failed)?;
        if !info.starts_with("INFO") {
            return Err(LoggerError::connection(
                address,
                format!("unexpected greeting '{}'", info.trim_end()),
            ));
        }

        let connect = serde_json::json!({
            "verbose": false,
            "pedantic": false,
            "name": client_name,
        });
        let mut writer = stream.try_clone().map_err(failed)?;
        writer
            .write_all(format!("CONNECT {}\r\n", connect).as_bytes())
            .map_err(failed)?;

        reader.get_ref().set_read_timeout(None).map_err(failed)?;
        let stream = Arc::new(Mutex::new(writer));
        let ponger = Arc::clone(&stream);
        thread::spawn(move || answer_pings(reader, ponger));

        Ok(Self { stream })
    }

    fn send(&self, frame: &[u8]) -> std::io::Result<()> {
        let mut stream = self.stream.lock();
        stream.write_all(frame)?;
        stream.flush()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.stream.lock().shutdown(Shutdown::Both);
    }
}

/// Reply to server keep-alives until the connection closes.
fn answer_pings(mut reader: BufReader<TcpStream>, stream: Arc<Mutex<TcpStream>>) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {
                if line.trim_end() == "PING" && stream.lock().write_all(b"PONG\r\n").is_err() {
                    return;
                }
            }
        }
    }
}

/// Minimal NATS client that only publishes.
///
/// # Limitations
///
/// - Plain TCP only. Servers that require TLS are not supported, and `tls://`
///   urls are rejected.
/// - No authentication: urls carrying credentials are rejected, and servers
///   that require a user, token or nkey will close the connection.
/// - `-ERR` replies from the server are read and discarded; a rejected publish
///   is not reported to the caller.
/// - The server's `max_payload` is not checked. An oversized message makes the
///   server drop the connection; a later publish then fails or reconnects.
///
/// # Example
///
/// ```no_run
/// use fanlog::writers::{BusWriter, NatsPublisher};
/// use std::sync::Arc;
///
/// let publisher = NatsPublisher::connect("nats://127.0.0.1:4222").unwrap();
/// let writer = BusWriter::new("logs.app", Arc::new(publisher)).unwrap();
/// ```
pub struct NatsPublisher {
    address: String,
    client_name: String,
    connection: Mutex<Option<Connection>>,
    reconnect_on_error: bool,
}

impl NatsPublisher {
    /// # Errors
    ///
    /// Returns error if the server cannot be reached or does not greet with `INFO`
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_named(url, env!("CARGO_PKG_NAME"))
    }

    pub fn connect_named(url: &str, client_name: &str) -> Result<Self> {
        let address = socket_address(url)?;
        let connection = Connection::open(&address, client_name)?;
        Ok(Self {
            address,
            client_name: client_name.to_string(),
            connection: Mutex::new(Some(connection)),
            reconnect_on_error: true,
        })
    }

    /// Enable or disable one reconnect attempt after a failed publish.
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Publisher for NatsPublisher {
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<()> {
        let mut frame = format!("PUB {} {}\r\n", subject, payload.len()).into_bytes();
        frame.extend_from_slice(payload);
        frame.extend_from_slice(b"\r\n");

        let mut connection = self.connection.lock();
        let result = match connection.as_ref() {
            Some(open) => open.send(&frame),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "not connected",
            )),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                *connection = None;
                if !self.reconnect_on_error {
                    return Err(e.into());
                }

                let reopened = Connection::open(&self.address, &self.client_name).map_err(|reconnect_err| {
                    LoggerError::writer(format!(
                        "Failed to publish and reconnect: {} (reconnect: {})",
                        e, reconnect_err
                    ))
                })?;
                reopened.send(&frame)?;
                *connection = Some(reopened);
                Ok(())
            }
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(open) = self.connection.lock().as_ref() {
            open.stream.lock().flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Publisher for Recorder {
        fn publish(&self, subject: &str, payload: &[u8]) -> Result<()> {
            self.messages.lock().push((subject.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_bus_writer_strips_line_end() {
        let recorder = Arc::new(Recorder::default());
        let writer = BusWriter::new("logs", recorder.clone()).unwrap();
        writer.write(b"one\n").unwrap();
        writer.write(b"two\r\n").unwrap();
        writer.write(b"three").unwrap();

        let messages = recorder.messages.lock();
        let payloads: Vec<&[u8]> = messages.iter().map(|(_, p)| p.as_slice()).collect();
        assert_eq!(payloads, vec![&b"one"[..], b"two", b"three"]);
        assert!(messages.iter().all(|(s, _)| s == "logs"));
    }

    #[test]
    fn test_bus_writer_rejects_bad_subjects() {
        let recorder: Arc<dyn Publisher> = Arc::new(Recorder::default());
        assert!(BusWriter::new("", recorder.clone()).is_err());
        assert!(BusWriter::new("a b", recorder).is_err());
    }

    #[test]
    fn test_socket_address() {
        assert_eq!(socket_address("nats://localhost").unwrap(), "localhost:4222");
        assert_eq!(socket_address("nats://10.0.0.1:5222").unwrap(), "10.0.0.1:5222");
        assert_eq!(socket_address("127.0.0.1:4333").unwrap(), "127.0.0.1:4333");
        assert!(socket_address("nats://user:pw@host").is_err());
        assert!(socket_address("tls://host:4443").is_err());
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let result = NatsPublisher::connect(&format!("nats://{}", address));
        assert!(matches!(result, Err(LoggerError::Connection { .. })));
    }

    #[test]
    fn test_publish_speaks_nats_protocol() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .write_all(b"INFO {\"server_id\":\"test\"}\r\n")
                .unwrap();

            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut connect = String::new();
            reader.read_line(&mut connect).unwrap();

            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            let mut payload = vec![0u8; 5 + 2];
            reader.read_exact(&mut payload).unwrap();

            stream.write_all(b"PING\r\n").unwrap();
            let mut pong = String::new();
            reader.read_line(&mut pong).unwrap();

            (connect, header, payload, pong)
        });

        let publisher = NatsPublisher::connect_named(&format!("nats://{}", address), "tester").unwrap();
        let writer = BusWriter::new("logs.app", Arc::new(publisher)).unwrap();
        writer.write(b"hello\n").unwrap();

        let (connect, header, payload, pong) = server.join().unwrap();
        assert!(connect.starts_with("CONNECT {"));
        assert!(connect.contains("\"name\":\"tester\""));
        assert_eq!(header, "PUB logs.app 5\r\n");
        assert_eq!(payload, b"hello\r\n");
        assert_eq!(pong, "PONG\r\n");
    }
}

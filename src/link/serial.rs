//! Serial-style transport for alignment commands.

use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde::Deserialize;

use super::command::AlignmentCommand;

/// Something that accepts alignment commands.
pub trait CommandSink {
    fn send(&mut self, command: &AlignmentCommand) -> Result<()>;
}

/// Port parameters, passed through to whoever opens the port.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub baud_rate: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { baud_rate: 9600 }
    }
}

/// Byte-stream link that may be connected and disconnected at any time.
///
/// Shared between threads behind an `Arc`; the port is guarded by a mutex
/// so a write never interleaves with a reconnect.
pub struct SerialLink<W> {
    config: LinkConfig,
    port: Mutex<Option<W>>,
}

impl<W: Write> SerialLink<W> {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            port: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Attach an opened port, replacing (and closing) any previous one.
    pub fn connect(&self, port: W) {
        let previous = self.port.lock().replace(port);
        if previous.is_some() {
            tracing::info!("Serial link reconnected");
        } else {
            tracing::info!("Serial link connected at {} baud", self.config.baud_rate);
        }
    }

    /// Detach the port and hand it back.
    pub fn disconnect(&self) -> Option<W> {
        let port = self.port.lock().take();
        if port.is_some() {
            tracing::info!("Serial link closed");
        }
        port
    }

    pub fn is_connected(&self) -> bool {
        self.port.lock().is_some()
    }

    /// Write one encoded command. Returns `Ok(false)` when no port is
    /// attached; the command is dropped in that case.
    pub fn transmit(&self, command: &AlignmentCommand) -> Result<bool> {
        let mut guard = self.port.lock();
        let Some(port) = guard.as_mut() else {
            tracing::warn!("Cannot send {}: serial link not connected", command);
            return Ok(false);
        };
        port.write_all(command.encode().as_bytes())
            .and_then(|()| port.flush())
            .with_context(|| format!("writing {} to serial link", command))?;
        Ok(true)
    }
}

impl<W: Write> CommandSink for SerialLink<W> {
    fn send(&mut self, command: &AlignmentCommand) -> Result<()> {
        self.transmit(command).map(|_| ())
    }
}

/// Hands commands to a transmitter thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<AlignmentCommand>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AlignmentCommand>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn send(&mut self, command: &AlignmentCommand) -> Result<()> {
        self.tx
            .send(*command)
            .context("serial transmitter has shut down")
    }
}

/// Forward every command from `rx` to `link` until all senders are gone.
///
/// Write failures are logged and the loop keeps going; the controller may
/// come back after a reconnect.
pub fn spawn_transmitter<W>(
    rx: Receiver<AlignmentCommand>,
    link: Arc<SerialLink<W>>,
) -> JoinHandle<u64>
where
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        let mut sent = 0u64;
        for command in rx.iter() {
            match link.transmit(&command) {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("{:#}", e),
            }
        }
        tracing::info!("Serial transmitter exiting after {} commands", sent);
        sent
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io;

    /// Port whose writes always fail.
    struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_link_config_from_csv() {
        let mut reader = csv::Reader::from_reader("baud_rate\n115200\n".as_bytes());
        let config: LinkConfig = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(LinkConfig::default().baud_rate, 9600);
    }

    #[test]
    fn test_transmit_writes_encoded_line() {
        let link = SerialLink::new(LinkConfig::default());
        link.connect(Vec::<u8>::new());
        assert!(link.transmit(&AlignmentCommand::new(1.0, -2.5)).unwrap());
        assert!(link.transmit(&AlignmentCommand::new(0.126, 3.0)).unwrap());

        let written = link.disconnect().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "x:1.00,y:-2.50\nx:0.13,y:3.00\n");
    }

    #[test]
    fn test_disconnected_send_is_dropped() {
        let mut link = SerialLink::<Vec<u8>>::new(LinkConfig::default());
        assert!(!link.is_connected());
        assert!(!link.transmit(&AlignmentCommand::new(1.0, 1.0)).unwrap());
        assert!(link.send(&AlignmentCommand::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn test_write_error_reported() {
        let link = SerialLink::new(LinkConfig::default());
        link.connect(BrokenPort);
        assert!(link.transmit(&AlignmentCommand::new(1.0, 1.0)).is_err());
        assert!(link.is_connected());
    }

    #[test]
    fn test_channel_sink_feeds_transmitter() {
        let link = Arc::new(SerialLink::new(LinkConfig { baud_rate: 115_200 }));
        link.connect(Vec::<u8>::new());

        let (tx, rx) = unbounded();
        let handle = spawn_transmitter(rx, link.clone());
        let mut sink = ChannelSink::new(tx);
        sink.send(&AlignmentCommand::from_orientation(10.0, -5.0)).unwrap();
        sink.send(&AlignmentCommand::new(0.0, 0.0)).unwrap();
        drop(sink);

        assert_eq!(handle.join().unwrap(), 2);
        let written = link.disconnect().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "x:10.00,y:-5.00\nx:0.00,y:0.00\n");
    }

    #[test]
    fn test_channel_sink_errors_after_shutdown() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        assert!(sink.send(&AlignmentCommand::new(0.0, 0.0)).is_err());
    }
}

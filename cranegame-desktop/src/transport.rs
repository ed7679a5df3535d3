use cranegame_core::{Transport, TransportError};
use log::{info, warn};
use std::io;
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message, WebSocket};

/// Websocket client that never blocks the frame loop once connected.
pub struct SocketTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl SocketTransport {
    /// Blocks for the TCP and websocket handshakes only.
    pub fn connect(url: &str) -> Result<Self, TransportError> {
        let (socket, response) = tungstenite::connect(url)
            .map_err(|err| TransportError::new(format!("failed to connect to {url}: {err}")))?;
        info!("connected to {url} (HTTP {})", response.status());

        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream
                .set_nonblocking(true)
                .map_err(|err| TransportError::new(format!("set_nonblocking failed: {err}")))?,
            _ => warn!("{url} is not a plain TCP stream; reads may block"),
        }

        Ok(Self { socket })
    }
}

fn would_block(err: &WsError) -> bool {
    matches!(err, WsError::Io(io) if io.kind() == io::ErrorKind::WouldBlock)
}

impl Transport for SocketTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        match self.socket.send(Message::text(text)) {
            Ok(()) => Ok(()),
            // The frame is queued and goes out on a later flush.
            Err(err) if would_block(&err) => Ok(()),
            Err(err) => Err(TransportError::new(err.to_string())),
        }
    }

    fn receive(&mut self) -> Result<Option<String>, TransportError> {
        match self.socket.flush() {
            Ok(()) => {}
            Err(err) if would_block(&err) => {}
            Err(err) => return Err(TransportError::new(err.to_string())),
        }

        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|frame| frame.reason.into_owned())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by peer".to_string());
                    return Err(TransportError::new(reason));
                }
                // Pings are answered by tungstenite; binary frames are not part of the API.
                Ok(_) => continue,
                Err(err) if would_block(&err) => return Ok(None),
                Err(err) => return Err(TransportError::new(err.to_string())),
            }
        }
    }
}

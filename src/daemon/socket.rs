use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::error::DaemonError;
use super::frame::{Frame, LiveEvent};

/// Sending half of the live channel, handed to whoever issues requests.
#[derive(Debug, Clone)]
pub struct LiveHandle {
    tx: mpsc::UnboundedSender<Frame>,
}

impl LiveHandle {
    /// Returns the handle and the receiver the connection task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: &str, value: &str) -> Result<(), DaemonError> {
        let frame = Frame::new(event, &value)?;
        self.tx.send(frame).map_err(|_| DaemonError::Closed)
    }

    /// Remote search. Returns `Ok(false)` without sending for an empty query,
    /// in which case the caller clears its results.
    pub fn search(&self, query: &str) -> Result<bool, DaemonError> {
        if query.is_empty() {
            return Ok(false);
        }
        self.emit("search", query)?;
        Ok(true)
    }

    /// Search within the indexed library. Same empty-term rule as `search`.
    pub fn local_search(&self, term: &str) -> Result<bool, DaemonError> {
        if term.is_empty() {
            return Ok(false);
        }
        self.emit("localsearch", term)?;
        Ok(true)
    }
}

/// Hold the live connection at `uri` open, handing every pushed frame to
/// `on_event` and writing every frame queued on `outgoing`.
///
/// Returns once either side closes. Frames that fail to parse are skipped.
pub async fn run<F>(
    uri: &str,
    mut outgoing: mpsc::UnboundedReceiver<Frame>,
    mut on_event: F,
) -> Result<(), DaemonError>
where
    F: FnMut(LiveEvent) + Send,
{
    let (ws, _response) = connect_async(uri).await?;
    info!("live channel connected to {uri}");
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match Frame::parse(&text) {
                        Ok(frame) => {
                            debug!("live event {}", frame.event);
                            on_event(LiveEvent::from(frame));
                        }
                        Err(e) => warn!("dropping malformed live frame: {e}"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("live channel closed by daemon");
                        return Err(DaemonError::Closed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            request = outgoing.recv() => {
                match request {
                    Some(frame) => {
                        debug!("live request {}", frame.event);
                        sink.send(Message::Text(frame.encode())).await?;
                    }
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
            }
        }
    }
}

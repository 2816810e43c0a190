use crate::network::message::Message;
use tokio::sync::mpsc;

/// Everything a node surfaces to its application: delivered messages plus link status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// A message seen for the first time on an inbound link.
    Received(Message),
    Dialing(String),
    Connected(String),
    DialFailed { addr: String, reason: String },
    /// An outbound link went away (write failure, remote close or registry removal).
    Disconnected(String),
    /// An inbound connection ended.
    InboundClosed(String),
}

pub type EventSender = mpsc::UnboundedSender<NodeEvent>;

/// Receiving end of a node's event stream.
pub struct NodeEvents {
    rx: mpsc::UnboundedReceiver<NodeEvent>,
}

impl NodeEvents {
    pub(crate) fn channel() -> (EventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next event of any kind; `None` once every node handle is gone.
    pub async fn recv(&mut self) -> Option<NodeEvent> {
        self.rx.recv().await
    }

    /// Next delivered message, skipping status events.
    pub async fn next_message(&mut self) -> Option<Message> {
        while let Some(ev) = self.rx.recv().await {
            if let NodeEvent::Received(msg) = ev {
                return Some(msg);
            }
        }
        None
    }

    /// Whatever is already queued, without waiting.
    pub fn drain(&mut self) -> Vec<NodeEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
        out
    }
}

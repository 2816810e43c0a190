//! Inbound side: decode loop for one accepted connection.

use crate::network::codec::MessageCodec;
use crate::network::events::NodeEvent;
use crate::network::manager::FloodNode;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

/// Read messages off `stream` in wire order and feed each one through the node's relay
/// path until the peer closes or sends something undecodable. Either way the connection
/// just ends; neither case is an error for the node.
pub async fn serve_connection<S>(node: FloodNode, stream: S, peer: String)
where
    S: AsyncRead + Unpin,
{
    let mut reader = FramedRead::new(stream, MessageCodec::with_max_frame_len(node.max_frame_len()));

    while let Some(item) = reader.next().await {
        match item {
            Ok(msg) => {
                node.relay(msg);
            }
            Err(e) => {
                debug!("dropping connection from {}: {}", peer, e);
                break;
            }
        }
    }

    drop(reader);
    info!("closed connection to {}", peer);
    node.emit(NodeEvent::InboundClosed(peer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::codec::MessageCodec;
    use crate::network::manager::{FloodConfig, Relayed};
    use crate::network::message::Message;
    use bytes::BytesMut;
    use chrono::Utc;
    use tokio_util::codec::Encoder;

    fn frame(id: &str, origin: &str) -> Vec<u8> {
        let mut buf = BytesMut::new();
        MessageCodec::new()
            .encode(Message::from_parts(id, origin, "hi", Utc::now()), &mut buf)
            .unwrap();
        buf.to_vec()
    }

    #[tokio::test]
    async fn test_duplicates_surface_once() {
        let (node, mut events) = FloodNode::new(FloodConfig::new("127.0.0.1:1"));
        // origin is our own address so the connect-back is suppressed
        let mock = tokio_test::io::Builder::new()
            .read(&frame("m1", "127.0.0.1:1"))
            .read(&frame("m1", "127.0.0.1:1"))
            .read(&frame("m2", "127.0.0.1:1"))
            .build();

        serve_connection(node.clone(), mock, "peer".into()).await;

        let evs = events.drain();
        let ids: Vec<&str> = evs
            .iter()
            .filter_map(|e| match e {
                NodeEvent::Received(m) => Some(m.id()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(evs.last(), Some(&NodeEvent::InboundClosed("peer".into())));
        assert_eq!(node.relay(Message::from_parts("m1", "x:1", "hi", Utc::now())), Relayed::Duplicate);
    }

    #[tokio::test]
    async fn test_garbage_ends_connection() {
        let (node, mut events) = FloodNode::new(FloodConfig::new("127.0.0.1:1"));
        let mock = tokio_test::io::Builder::new()
            .read(&frame("m1", "127.0.0.1:1"))
            .read(b"not json at all\n")
            .build();

        serve_connection(node, mock, "peer".into()).await;

        let evs = events.drain();
        assert_eq!(evs.len(), 2);
        assert!(matches!(&evs[0], NodeEvent::Received(m) if m.id() == "m1"));
        assert_eq!(evs[1], NodeEvent::InboundClosed("peer".into()));
    }
}

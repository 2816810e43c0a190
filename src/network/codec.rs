use crate::network::message::Message;
use crate::utils::errors::NetError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Default upper bound for one encoded message on the wire.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Streaming JSON codec: the stream is a sequence of self-delimited `Message` objects.
///
/// Objects may be separated by any whitespace or by nothing at all, and may span lines.
/// The encoder writes one object per line. `max_frame_len` bounds how much of a single
/// unfinished object may sit in the buffer.
#[derive(Debug)]
pub struct MessageCodec {
    max_frame_len: usize,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max: usize) -> Self {
        Self { max_frame_len: max }
    }

    fn too_long(&self) -> NetError {
        NetError::Codec(format!("frame exceeds maximum length of {} bytes", self.max_frame_len))
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = NetError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let blank = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
        src.advance(blank);
        if src.is_empty() {
            return Ok(None);
        }

        let (next, used) = {
            let mut objects = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Message>();
            let next = objects.next();
            (next, objects.byte_offset())
        };

        match next {
            Some(Ok(msg)) => {
                if used > self.max_frame_len {
                    return Err(self.too_long());
                }
                src.advance(used);
                Ok(Some(msg))
            }
            // object not complete yet
            Some(Err(e)) if e.is_eof() => {
                if src.len() > self.max_frame_len {
                    return Err(self.too_long());
                }
                Ok(None)
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(msg) => Ok(Some(msg)),
            None if src.is_empty() => Ok(None),
            None => Err(NetError::Codec(format!("stream ended inside a message ({} bytes left)", src.len()))),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = NetError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(&item)?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.put_u8(b'\n');
        Ok(())
    }
}

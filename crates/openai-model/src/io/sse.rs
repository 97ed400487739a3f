use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. `event`, `id` and `retry` fields and
/// comment lines are skipped, and multiple `data` lines of one event are
/// joined with a line feed.
pub struct Sse {
    buf: String,
    // Trailing bytes of a UTF-8 sequence split across chunks.
    partial: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            partial: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events already buffered before reading more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
            if self.buf.contains('\r') {
                self.buf = self.buf.replace("\r\n", "\n");
            }
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.partial.extend_from_slice(bytes);
        let valid_up_to = match std::str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            // `error_len` is `None` when the input merely ends mid-sequence.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.partial.split_off(valid_up_to);
        let complete = std::mem::replace(&mut self.partial, rest);
        let Ok(s) = String::from_utf8(complete) else {
            return Err(Error::InvalidPayload);
        };
        self.buf.push_str(&s);
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            let Some(eol_idx) = self.buf.find("\n\n") else {
                return Ok(None);
            };
            let block: String = self.buf.drain(0..eol_idx + 2).collect();

            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let Some((field, value)) = line.split_once(':') else {
                    return Err(Error::InvalidPayload);
                };
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            // Comment-only blocks are keep-alives.
            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn test_normal_events() {
        let chunks = Chunks::from_vec(vec![
            Bytes::from_static(b"data: hello\n\n"),
            Bytes::from_static(b"data: bye\n\n"),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_across_chunks() {
        let chunks = Chunks::from_vec(vec![
            Bytes::from_static(b"data:"),
            Bytes::from_static(b" hello\r"),
            Bytes::from_static(b"\n\r\n"),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multibyte_split() {
        let text = "data: olá\n\n".as_bytes();
        // Split inside the two-byte encoding of `á`.
        let split = text.len() - 3;
        let chunks = Chunks::from_vec(vec![
            Bytes::copy_from_slice(&text[..split]),
            Bytes::copy_from_slice(&text[split..]),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "olá");
    }

    #[tokio::test]
    async fn test_comments_and_fields() {
        let chunks = Chunks::from_vec(vec![Bytes::from_static(
            b": keep-alive\n\nevent: message\nid: 7\ndata: a\ndata: b\n\n",
        )]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "a\nb");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let chunks = Chunks::from_vec(vec![Bytes::from_static(b"xxxxxx\n\n")]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        // An unterminated event is dropped at the end of the stream.
        let chunks = Chunks::from_vec(vec![
            Bytes::from_static(b"data: hello\n"),
            Bytes::from_static(b"data: bye\n"),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let chunks = Chunks::from_vec(vec![Bytes::from_static(&[0xff, 0xfe])]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);
    }

    #[tokio::test]
    async fn test_chunk_error() {
        let chunks = Chunks::from_results(vec![
            Ok(Bytes::from_static(b"data: hello\n\n")),
            Err(ChunksError("connection reset".to_owned())),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert!(matches!(
            sse.next_event().await.unwrap_err(),
            Error::ChunksError(_)
        ));
    }
}

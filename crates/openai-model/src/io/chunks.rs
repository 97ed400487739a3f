use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Response;

#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub String);

/// An adapter for streaming byte chunks out of a response body.
pub struct Chunks {
    inner: BoxStream<'static, Result<Bytes, Error>>,
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        let inner = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|err| Error(err.to_string())))
            .boxed();
        Self { inner }
    }

    #[cfg(test)]
    pub fn from_vec(chunks: Vec<Bytes>) -> Self {
        let inner = futures_util::stream::iter(chunks.into_iter().map(Ok)).boxed();
        Self { inner }
    }

    #[cfg(test)]
    pub fn from_results(chunks: Vec<Result<Bytes, Error>>) -> Self {
        let inner = futures_util::stream::iter(chunks).boxed();
        Self { inner }
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        self.inner.next().await.transpose()
    }
}

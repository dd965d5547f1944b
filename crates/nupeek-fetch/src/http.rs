use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line and streaming body of a GET request.
pub struct HttpResponse<E> {
    pub status: u16,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> HttpResponse<E> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects themselves and must not turn non-success
/// statuses into errors; callers inspect [`HttpResponse::status`] so that a 404
/// can mean "not present" rather than a failure.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

/// Drain a response body into memory.
pub async fn read_body<E>(
    mut body: BoxStream<'static, std::result::Result<Bytes, E>>,
    sink: &mut Vec<u8>,
) -> std::result::Result<(), E> {
    while let Some(chunk) = body.next().await {
        sink.extend_from_slice(&chunk?);
    }
    Ok(())
}

#[cfg(feature = "reqwest")]
pub(crate) mod reqwest_impl {
    use super::*;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> std::result::Result<HttpResponse<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            Ok(HttpResponse {
                status,
                body: Box::pin(response.bytes_stream()),
            })
        }
    }
}

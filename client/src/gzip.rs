use crate::{Error, Result};
use async_compression::futures::bufread::GzipEncoder;
use futures_lite::io::BufReader;
use std::sync::Arc;
use waymark_http::{AsyncSource, MediaType, Request, RequestBody};

/// Bytes the staging buffer holds between the delegate and the encoder.
const STAGING_BUFFER_LEN: usize = 8 * 1024;

/// A request body that streams the gzip-framed form of a delegate body.
///
/// The compressed length is unknowable up front, so
/// [`content_length`][RequestBody::content_length] is `-1`; one-shot-ness
/// follows the delegate. Reads pull staged chunks from the delegate
/// through the encoder, and end-of-stream is reported only once the gzip
/// trailer has been drained.
pub struct GzipRequestBody {
    delegate: Arc<dyn RequestBody>,
}

impl GzipRequestBody {
    /// Wrap `delegate`.
    pub fn new(delegate: Arc<dyn RequestBody>) -> Self {
        Self { delegate }
    }
}

impl std::fmt::Debug for GzipRequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipRequestBody")
            .field("delegate", &&*self.delegate)
            .finish()
    }
}

impl RequestBody for GzipRequestBody {
    fn content_type(&self) -> Option<MediaType> {
        self.delegate.content_type()
    }

    fn content_length(&self) -> i64 {
        -1
    }

    fn is_one_shot(&self) -> bool {
        self.delegate.is_one_shot()
    }

    fn open_read(&self) -> waymark_http::Result<AsyncSource> {
        let identity = self.delegate.open_read()?;
        let staged = BufReader::with_capacity(STAGING_BUFFER_LEN, identity);
        Ok(Box::pin(GzipEncoder::new(staged)))
    }
}

/// Rewrite `request` to send its body gzip-compressed.
///
/// Fails on a request with no body, and on one whose `Content-Encoding`
/// already says gzip.
pub fn gzip(request: Request) -> Result<Request> {
    let Some(body) = request.body().cloned() else {
        return Err(Error::GzipWithoutBody);
    };
    if request
        .header("Content-Encoding")
        .is_some_and(|encoding| encoding.eq_ignore_ascii_case("gzip"))
    {
        return Err(Error::AlreadyGzipped);
    }

    Ok(request
        .new_builder()
        .header("Content-Encoding", "gzip")?
        .remove_header("Content-Length")
        .body(Some(Arc::new(GzipRequestBody::new(body))))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use futures_lite::AsyncReadExt;
    use pretty_assertions::assert_eq;
    use waymark_http::StaticBody;

    fn request_with_body(content: &'static str) -> Request {
        Request::builder()
            .url_str("http://example.com/upload")
            .unwrap()
            .post(Arc::new(StaticBody::from(content)))
            .build()
            .unwrap()
    }

    async fn gunzip(source: &mut AsyncSource) -> Vec<u8> {
        let mut compressed = Vec::new();
        source.read_to_end(&mut compressed).await.unwrap();
        let mut decoder = async_compression::futures::bufread::GzipDecoder::new(
            futures_lite::io::Cursor::new(compressed),
        );
        let mut identity = Vec::new();
        decoder.read_to_end(&mut identity).await.unwrap();
        identity
    }

    #[test]
    fn round_trips_through_a_reference_decoder() {
        block_on(async {
            let request = gzip(request_with_body("hello hello hello hello")).unwrap();
            let body = request.body().unwrap();
            assert_eq!(body.content_length(), -1);
            assert_eq!(request.header("Content-Encoding"), Some("gzip"));
            assert_eq!(request.header("Content-Length"), None);

            let mut source = body.open_read().unwrap();
            assert_eq!(gunzip(&mut source).await, b"hello hello hello hello");
        });
    }

    #[test]
    fn eof_only_after_trailer() {
        block_on(async {
            let request = gzip(request_with_body("payload")).unwrap();
            let mut source = request.body().unwrap().open_read().unwrap();

            // drain in tiny reads; every byte up to and including the
            // trailer must arrive before the first zero-length read
            let mut compressed = Vec::new();
            let mut buf = [0u8; 3];
            loop {
                let n = source.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                compressed.extend_from_slice(&buf[..n]);
            }
            // gzip trailer: 4 bytes crc32 + 4 bytes input length
            let len = compressed.len();
            let input_len =
                u32::from_le_bytes(compressed[len - 4..].try_into().unwrap());
            assert_eq!(input_len, 7);
        });
    }

    #[test]
    fn inherits_one_shot_and_media_type() {
        let media_type: MediaType = "text/plain".parse().unwrap();
        let delegate = Arc::new(
            StaticBody::from("x")
                .with_media_type(media_type.clone())
                .one_shot(),
        );
        let body = GzipRequestBody::new(delegate);
        assert!(body.is_one_shot());
        assert_eq!(body.content_type(), Some(media_type));

        assert!(body.open_read().is_ok());
        assert!(body.open_read().is_err());
    }

    #[test]
    fn gzip_misuse() {
        let no_body = Request::builder()
            .url_str("http://example.com/")
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(gzip(no_body), Err(Error::GzipWithoutBody)));

        let once = gzip(request_with_body("x")).unwrap();
        assert!(matches!(gzip(once), Err(Error::AlreadyGzipped)));
    }
}

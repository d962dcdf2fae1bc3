use crate::{Error, MediaType, Result};
use futures_lite::{AsyncRead, AsyncReadExt};
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The streaming byte source both body types produce.
pub type AsyncSource = Pin<Box<dyn AsyncRead + Send + Sync + 'static>>;

/// The payload of an outgoing request.
///
/// A body is polymorphic over four capabilities: it can say what media type
/// it carries, how many bytes it will produce (`-1` when unknown), whether
/// it may only be transmitted once, and it can open the byte stream itself.
pub trait RequestBody: Send + Sync + 'static {
    /// The media type to announce in `Content-Type`, if known.
    fn content_type(&self) -> Option<MediaType> {
        None
    }

    /// The byte count this body will produce, or `-1` when unknown.
    fn content_length(&self) -> i64 {
        -1
    }

    /// A one-shot body may be transmitted at most once; redirects will not
    /// replay it.
    fn is_one_shot(&self) -> bool {
        false
    }

    /// Open the byte stream. A second open of a one-shot body fails with
    /// [`Error::BodyAlreadyRead`].
    fn open_read(&self) -> Result<AsyncSource>;
}

impl Debug for dyn RequestBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody")
            .field("content_type", &self.content_type())
            .field("content_length", &self.content_length())
            .field("one_shot", &self.is_one_shot())
            .finish()
    }
}

/// A request body over bytes already in memory.
pub struct StaticBody {
    content: Cow<'static, [u8]>,
    media_type: Option<MediaType>,
    one_shot: bool,
    opened: AtomicBool,
}

impl StaticBody {
    /// A body over string or byte content.
    pub fn new(content: impl Into<Cow<'static, [u8]>>) -> Self {
        Self {
            content: content.into(),
            media_type: None,
            one_shot: false,
            opened: AtomicBool::new(false),
        }
    }

    /// A body over utf-8 text.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(content.into().into_bytes())
    }

    /// Chainable setter for the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Chainable setter marking this body one-shot.
    #[must_use]
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }
}

impl Debug for StaticBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBody")
            .field("content_length", &self.content.len())
            .field("media_type", &self.media_type)
            .field("one_shot", &self.one_shot)
            .finish()
    }
}

impl RequestBody for StaticBody {
    fn content_type(&self) -> Option<MediaType> {
        self.media_type.clone()
    }

    fn content_length(&self) -> i64 {
        self.content.len() as i64
    }

    fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    fn open_read(&self) -> Result<AsyncSource> {
        if self.one_shot && self.opened.swap(true, Ordering::SeqCst) {
            return Err(Error::BodyAlreadyRead);
        }
        Ok(Box::pin(futures_lite::io::Cursor::new(
            self.content.clone().into_owned(),
        )))
    }
}

impl From<&'static str> for StaticBody {
    fn from(content: &'static str) -> Self {
        Self::new(content.as_bytes())
    }
}

impl From<String> for StaticBody {
    fn from(content: String) -> Self {
        Self::new(content.into_bytes())
    }
}

impl From<Vec<u8>> for StaticBody {
    fn from(content: Vec<u8>) -> Self {
        Self::new(content)
    }
}

impl From<&'static [u8]> for StaticBody {
    fn from(content: &'static [u8]) -> Self {
        Self::new(content)
    }
}

/// Read access to file content, kept abstract so the crate itself performs
/// no file system io.
pub trait FileSystem: Send + Sync + 'static {
    /// The length of the file at `path`.
    fn metadata_len(&self, path: &Path) -> io::Result<u64>;

    /// Open the file at `path` for reading.
    fn open_source(&self, path: &Path) -> io::Result<AsyncSource>;
}

/// A request body streamed out of a [`FileSystem`].
pub struct FileBody {
    file_system: Arc<dyn FileSystem>,
    path: PathBuf,
    media_type: Option<MediaType>,
}

impl FileBody {
    /// A body for the file at `path`.
    pub fn new(file_system: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_system,
            path: path.into(),
            media_type: None,
        }
    }

    /// Chainable setter for the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }
}

impl Debug for FileBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBody")
            .field("path", &self.path)
            .field("media_type", &self.media_type)
            .finish()
    }
}

impl RequestBody for FileBody {
    fn content_type(&self) -> Option<MediaType> {
        self.media_type.clone()
    }

    fn content_length(&self) -> i64 {
        self.file_system
            .metadata_len(&self.path)
            .map(|len| i64::try_from(len).unwrap_or(-1))
            .unwrap_or(-1)
    }

    fn open_read(&self) -> Result<AsyncSource> {
        Ok(self.file_system.open_source(&self.path)?)
    }
}

/// The payload of a received response.
///
/// The byte stream reads at most once; [`close`][ResponseBody::close]
/// releases the transport resource behind it and is idempotent. Dropping
/// the body closes it.
pub struct ResponseBody {
    media_type: Option<MediaType>,
    content_length: i64,
    source: Option<AsyncSource>,
    on_close: Option<Box<dyn FnOnce() + Send + Sync>>,
    unreadable: Option<&'static str>,
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("media_type", &self.media_type)
            .field("content_length", &self.content_length)
            .field("consumed", &self.source.is_none())
            .field("unreadable", &self.unreadable)
            .finish()
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl ResponseBody {
    /// A body streaming from `source`.
    pub fn new(media_type: Option<MediaType>, content_length: i64, source: AsyncSource) -> Self {
        Self {
            media_type,
            content_length,
            source: Some(source),
            on_close: None,
            unreadable: None,
        }
    }

    /// A body over bytes already in memory.
    pub fn from_bytes(media_type: Option<MediaType>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let content_length = content.len() as i64;
        Self::new(
            media_type,
            content_length,
            Box::pin(futures_lite::io::Cursor::new(content)),
        )
    }

    /// An empty body.
    pub fn empty() -> Self {
        Self::from_bytes(None, Vec::new())
    }

    /// A placeholder that reports `media_type` and `content_length` but
    /// fails every read; used for the stripped bodies of linked responses.
    pub fn unreadable(
        kind: &'static str,
        media_type: Option<MediaType>,
        content_length: i64,
    ) -> Self {
        Self {
            media_type,
            content_length,
            source: None,
            on_close: None,
            unreadable: Some(kind),
        }
    }

    /// Chainable setter for the hook that releases the transport resource
    /// on close.
    #[must_use]
    pub fn with_on_close(mut self, on_close: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(on_close));
        self
    }

    /// The media type announced by `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&MediaType> {
        self.media_type.as_ref()
    }

    /// The byte count promised by the response, or `-1` when unknown.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    /// Take the byte stream out of this body. Subsequent takes and reads
    /// fail.
    pub fn take_source(&mut self) -> Result<AsyncSource> {
        if let Some(kind) = self.unreadable {
            return Err(Error::UnreadableResponseBody(kind));
        }
        self.source.take().ok_or(Error::BodyAlreadyRead)
    }

    /// Read the whole body. Fails when the byte count does not match a
    /// non-negative declared content length.
    pub async fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let mut source = self.take_source()?;
        let mut content = match usize::try_from(self.content_length) {
            Ok(len) => Vec::with_capacity(len),
            Err(_) => Vec::new(),
        };
        let read = source.read_to_end(&mut content).await;
        self.close();
        read?;
        if self.content_length >= 0 && content.len() as u64 != self.content_length as u64 {
            return Err(Error::ContentLengthMismatch {
                expected: self.content_length as u64,
                received: content.len() as u64,
            });
        }
        Ok(content)
    }

    /// Read the whole body as text, honoring the content-type charset and
    /// falling back to utf-8. Malformed sequences decode lossily.
    pub async fn read_string(&mut self) -> Result<String> {
        let encoding = self
            .media_type
            .as_ref()
            .and_then(MediaType::charset)
            .unwrap_or(encoding_rs::UTF_8);
        let bytes = self.read_bytes().await?;
        let (text, _, _) = encoding.decode(&bytes);
        Ok(text.into_owned())
    }

    /// Release the transport resource. Safe to call any number of times.
    pub fn close(&mut self) {
        self.source = None;
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use pretty_assertions::assert_eq;

    #[test]
    fn static_bodies_reread_unless_one_shot() {
        block_on(async {
            let body = StaticBody::from("hello");
            for _ in 0..2 {
                let mut source = body.open_read().unwrap();
                let mut read = String::new();
                source.read_to_string(&mut read).await.unwrap();
                assert_eq!(read, "hello");
            }

            let one_shot = StaticBody::from("once").one_shot();
            assert!(one_shot.open_read().is_ok());
            assert!(matches!(
                one_shot.open_read(),
                Err(Error::BodyAlreadyRead)
            ));
        });
    }

    #[test]
    fn static_body_reports_length_and_type() {
        let body = StaticBody::from("hello")
            .with_media_type("text/plain; charset=utf-8".parse().unwrap());
        assert_eq!(body.content_length(), 5);
        assert_eq!(
            body.content_type().unwrap().to_string(),
            "text/plain; charset=utf-8"
        );
        assert!(!body.is_one_shot());
    }

    #[test]
    fn response_body_reads_once() {
        block_on(async {
            let mut body = ResponseBody::from_bytes(None, &b"payload"[..]);
            assert_eq!(body.read_bytes().await.unwrap(), b"payload");
            assert!(matches!(
                body.read_bytes().await,
                Err(Error::BodyAlreadyRead)
            ));
        });
    }

    #[test]
    fn response_body_checks_content_length() {
        block_on(async {
            let mut body = ResponseBody::new(
                None,
                3,
                Box::pin(futures_lite::io::Cursor::new(b"hello".to_vec())),
            );
            assert!(matches!(
                body.read_bytes().await,
                Err(Error::ContentLengthMismatch {
                    expected: 3,
                    received: 5
                })
            ));
        });
    }

    #[test]
    fn response_body_charset_decoding() {
        block_on(async {
            let mut latin = ResponseBody::from_bytes(
                Some("text/plain; charset=ISO-8859-1".parse().unwrap()),
                vec![0xe9],
            );
            assert_eq!(latin.read_string().await.unwrap(), "é");

            let mut utf8 = ResponseBody::from_bytes(None, "héllo".as_bytes().to_vec());
            assert_eq!(utf8.read_string().await.unwrap(), "héllo");
        });
    }

    #[test]
    fn close_is_idempotent_and_runs_the_hook_once() {
        let count = Arc::new(AtomicBool::new(false));
        let seen = count.clone();
        let mut body = ResponseBody::from_bytes(None, &b"x"[..])
            .with_on_close(move || assert!(!seen.swap(true, Ordering::SeqCst)));
        body.close();
        body.close();
        assert!(count.load(Ordering::SeqCst));
    }

    #[test]
    fn unreadable_bodies_report_metadata_but_refuse_reads() {
        block_on(async {
            let mut body = ResponseBody::unreadable(
                "prior",
                Some("text/html".parse().unwrap()),
                42,
            );
            assert_eq!(body.content_length(), 42);
            assert_eq!(body.content_type().unwrap().subtype(), "html");
            assert!(matches!(
                body.read_bytes().await,
                Err(Error::UnreadableResponseBody("prior"))
            ));
        });
    }
}

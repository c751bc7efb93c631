use anyhow::{Context, Result};
use async_imap::Session;
use async_native_tls::TlsStream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::draft::{Draft, DraftPart};
use super::provider::DraftStore;
use crate::config::EmailConfig;

use futures::io::{AsyncRead, AsyncWrite};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

/// Wrapper for either TLS or plain IMAP stream
enum StreamWrapper {
    Tls(TlsStream<Compat<TcpStream>>),
    Plain(Compat<TcpStream>),
}

impl AsyncRead for StreamWrapper {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            StreamWrapper::Tls(s) => Pin::new(s).poll_read(cx, buf),
            StreamWrapper::Plain(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for StreamWrapper {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            StreamWrapper::Tls(s) => Pin::new(s).poll_write(cx, buf),
            StreamWrapper::Plain(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            StreamWrapper::Tls(s) => Pin::new(s).poll_flush(cx),
            StreamWrapper::Plain(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            StreamWrapper::Tls(s) => Pin::new(s).poll_close(cx),
            StreamWrapper::Plain(s) => Pin::new(s).poll_close(cx),
        }
    }
}

impl std::fmt::Debug for StreamWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamWrapper::Tls(_) => write!(f, "StreamWrapper::Tls"),
            StreamWrapper::Plain(_) => write!(f, "StreamWrapper::Plain"),
        }
    }
}

unsafe impl Send for StreamWrapper {}
impl Unpin for StreamWrapper {}

/// IMAPS ports get a TLS handshake; anything else speaks plain IMAP
/// (local test servers).
fn is_tls_port(port: u16) -> bool {
    port == 993 || port == 3993
}

/// Gmail IMAP-backed draft store.
/// Uses App Passwords for authentication (no OAuth2 dance needed).
pub struct GmailStore {
    config: EmailConfig,
    session: Mutex<Option<Session<StreamWrapper>>>,
}

impl GmailStore {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Establish a new IMAP connection and log in
    async fn connect(&self) -> Result<Session<StreamWrapper>> {
        tracing::info!(
            "Connecting to IMAP {}:{}",
            self.config.imap_host,
            self.config.imap_port
        );

        let tcp = TcpStream::connect(format!(
            "{}:{}",
            self.config.imap_host, self.config.imap_port
        ))
        .await
        .context("Failed to connect to IMAP server")?;

        let stream = if is_tls_port(self.config.imap_port) {
            tracing::info!("Using IMAPS (TLS)");
            let tls = async_native_tls::TlsConnector::new();
            let tls_stream = tls
                .connect(&self.config.imap_host, tcp.compat())
                .await
                .context("TLS handshake failed")?;
            StreamWrapper::Tls(tls_stream)
        } else {
            tracing::info!("Using plain IMAP");
            StreamWrapper::Plain(tcp.compat())
        };

        let client = async_imap::Client::new(stream);

        let session = client
            .login(&self.config.address, &self.config.password)
            .await
            .map_err(|(err, _)| err)
            .context("IMAP login failed")?;

        tracing::info!("IMAP login successful for {}", self.config.address);
        Ok(session)
    }

    /// Reconnect if the session is stale
    async fn ensure_session(&self) -> Result<()> {
        let mut guard = self.session.lock().await;

        // Try a NOOP to see if connection is alive
        let needs_reconnect = if let Some(ref mut session) = *guard {
            session.noop().await.is_err()
        } else {
            true
        };

        if needs_reconnect {
            tracing::info!("Reconnecting IMAP session...");
            let session = self.connect().await?;
            *guard = Some(session);
        }

        Ok(())
    }
}

#[async_trait]
impl DraftStore for GmailStore {
    async fn list_drafts(&self) -> Result<Vec<Draft>> {
        self.ensure_session().await?;
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().context("No IMAP session")?;

        session
            .select(&self.config.drafts_folder)
            .await
            .context("Failed to SELECT drafts folder")?;

        let mut uids: Vec<u32> = session
            .uid_search("ALL")
            .await
            .context("IMAP UID SEARCH failed")?
            .into_iter()
            .collect();
        uids.sort_unstable();

        let mut drafts = Vec::with_capacity(uids.len());
        for uid in uids {
            // A draft that fails to fetch or parse is skipped; the rest of
            // the listing still goes through.
            match fetch_draft(session, uid).await {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => tracing::warn!("Draft UID {} has no message body, skipping", uid),
                Err(err) => tracing::warn!("Error fetching draft {}: {:#}", uid, err),
            }
        }

        tracing::debug!(
            "Listed {} draft(s) from {}",
            drafts.len(),
            self.config.drafts_folder
        );
        Ok(drafts)
    }

    async fn delete_draft(&self, id: u32) -> Result<()> {
        self.ensure_session().await?;
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().context("No IMAP session")?;

        session
            .select(&self.config.drafts_folder)
            .await
            .context("Failed to SELECT drafts folder")?;

        // Mark as deleted
        {
            let store_stream = session
                .uid_store(id.to_string(), "+FLAGS (\\Deleted)")
                .await
                .context("IMAP UID STORE failed")?;
            tokio::pin!(store_stream);
            while let Some(_) = store_stream.next().await {}
        }

        // Expunge to permanently remove
        {
            let expunge_stream = session.expunge().await.context("IMAP EXPUNGE failed")?;
            tokio::pin!(expunge_stream);
            while let Some(_) = expunge_stream.next().await {}
        }

        tracing::info!("Draft UID {} deleted", id);
        Ok(())
    }
}

/// Fetch one draft by UID and build its snapshot: Subject/To/Message-ID
/// headers, INTERNALDATE, and the MIME content-part tree. A message the
/// server never assigned an internal date to lands on the Unix epoch.
async fn fetch_draft(session: &mut Session<StreamWrapper>, uid: u32) -> Result<Option<Draft>> {
    let mut fetch_stream = session
        .uid_fetch(uid.to_string(), "(INTERNALDATE BODY.PEEK[])")
        .await
        .context("IMAP UID FETCH failed")?;

    let mut raw_message: Option<Vec<u8>> = None;
    let mut internal_date: Option<DateTime<Utc>> = None;
    while let Some(result) = fetch_stream.next().await {
        let fetch = result.context("Error reading FETCH response")?;
        if let Some(date) = fetch.internal_date() {
            internal_date = Some(date.with_timezone(&Utc));
        }
        if let Some(body) = fetch.body() {
            raw_message = Some(body.to_vec());
        }
    }
    drop(fetch_stream);

    let raw_message = match raw_message {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let parsed = mailparse::parse_mail(&raw_message).context("Failed to parse MIME message")?;

    let mut subject = String::new();
    let mut recipient = String::new();
    let mut message_id = String::new();
    for header in &parsed.headers {
        match header.get_key().to_lowercase().as_str() {
            "subject" => subject = header.get_value(),
            "to" => recipient = header.get_value(),
            "message-id" => message_id = header.get_value(),
            _ => {}
        }
    }

    Ok(Some(Draft {
        id: uid,
        message_id,
        subject,
        recipient,
        created_at: internal_date.unwrap_or(DateTime::UNIX_EPOCH),
        body: Some(part_tree(&parsed)?),
    }))
}

/// Build the content-part tree from a parsed MIME message. Container parts
/// carry size 0 and their children; leaf parts carry their decoded body
/// length.
fn part_tree(mail: &mailparse::ParsedMail) -> Result<DraftPart> {
    if mail.subparts.is_empty() {
        let body = mail.get_body_raw().context("Failed to read part body")?;
        return Ok(DraftPart {
            size: body.len() as u64,
            parts: Vec::new(),
        });
    }

    let mut parts = Vec::with_capacity(mail.subparts.len());
    for sub in &mail.subparts {
        parts.push(part_tree(sub)?);
    }
    Ok(DraftPart { size: 0, parts })
}

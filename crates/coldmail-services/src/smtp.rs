//! Minimal SMTP client: STARTTLS or implicit TLS, AUTH LOGIN, one message.

use base64::Engine;
use chrono::{DateTime, Utc};
use coldmail_config::SmtpSettings;
use rustls::ClientConfig;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Port on which the server expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Timeout for connecting, the TLS handshake and each server reply.
const TIMEOUT_SECS: u64 = 30;

/// Name announced in EHLO.
const EHLO_DOMAIN: &str = "coldmail.local";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by server")]
    Closed,

    #[error("Expected {expected}xx reply, got {code}: {text}")]
    Rejected { expected: u16, code: u16, text: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Command builders
// ─────────────────────────────────────────────────────────────────────────────

pub fn ehlo_command(domain: &str) -> String {
    format!("EHLO {domain}\r\n")
}

pub fn starttls_command() -> String {
    "STARTTLS\r\n".to_string()
}

pub fn auth_login_command() -> String {
    "AUTH LOGIN\r\n".to_string()
}

pub fn base64_line(input: &str) -> String {
    format!(
        "{}\r\n",
        base64::engine::general_purpose::STANDARD.encode(input)
    )
}

pub fn mail_from_command(from: &str) -> String {
    format!("MAIL FROM:<{from}>\r\n")
}

pub fn rcpt_to_command(to: &str) -> String {
    format!("RCPT TO:<{to}>\r\n")
}

pub fn data_command() -> String {
    "DATA\r\n".to_string()
}

pub fn quit_command() -> String {
    "QUIT\r\n".to_string()
}

/// RFC 2047 encode a header value when it is not plain ASCII.
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            base64::engine::general_purpose::STANDARD.encode(value)
        )
    }
}

/// Encoded body line length, per RFC 2045.
const BODY_LINE_WIDTH: usize = 76;

/// One outgoing message.
#[derive(Debug, Clone)]
pub struct Mail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub is_html: bool,
}

impl Mail<'_> {
    /// Headers and a base64 body ready for the DATA phase, terminated by the
    /// lone-dot line. Body lines are CRLF-normalized before encoding.
    pub fn to_data(&self, date: DateTime<Utc>) -> String {
        let content_type = if self.is_html { "text/html" } else { "text/plain" };

        let mut data = format!(
            "From: {}\r\n\
             To: {}\r\n\
             Subject: {}\r\n\
             Date: {}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: {}; charset=UTF-8\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n",
            self.from,
            self.to,
            encode_header(self.subject),
            date.to_rfc2822(),
            content_type,
        );

        let body = self.body.lines().collect::<Vec<_>>().join("\r\n");
        let encoded = base64::engine::general_purpose::STANDARD.encode(body);
        let mut rest = encoded.as_str();
        while !rest.is_empty() {
            let (line, tail) = rest.split_at(rest.len().min(BODY_LINE_WIDTH));
            data.push_str(line);
            data.push_str("\r\n");
            rest = tail;
        }
        data.push_str(".\r\n");
        data
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TLS
// ─────────────────────────────────────────────────────────────────────────────

/// Client TLS config trusting Mozilla's roots plus an optional PEM bundle.
pub fn tls_client_config(extra_ca: Option<&Path>) -> Result<Arc<ClientConfig>, SmtpError> {
    let mut roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    if let Some(path) = extra_ca {
        let certs = CertificateDer::pem_file_iter(path)
            .map_err(|e| SmtpError::Tls(format!("cannot read {}: {e}", path.display())))?;
        for cert in certs {
            let cert = cert.map_err(|e| SmtpError::Tls(e.to_string()))?;
            roots
                .add(cert)
                .map_err(|e| SmtpError::Tls(e.to_string()))?;
        }
        tracing::debug!(path = %path.display(), "Added extra CA certificates");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| SmtpError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

async fn upgrade<S>(
    config: Arc<ClientConfig>,
    host: &str,
    stream: S,
) -> Result<tokio_rustls::client::TlsStream<S>, SmtpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|e| SmtpError::Tls(format!("invalid server name '{host}': {e}")))?;

    tokio::time::timeout(
        Duration::from_secs(TIMEOUT_SECS),
        TlsConnector::from(config).connect(server_name, stream),
    )
    .await
    .map_err(|_| SmtpError::Timeout("TLS handshake"))?
    .map_err(|e| SmtpError::Tls(format!("handshake with {host} failed: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// A server reply: status code plus every line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn text(&self) -> String {
        self.lines.join("; ")
    }
}

/// Line-oriented SMTP dialogue over any byte stream.
pub struct SmtpConnection<S> {
    stream: BufReader<S>,
}

impl<S> SmtpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    /// Read a reply, following `NNN-` continuation lines to the final `NNN `.
    pub async fn read_reply(&mut self) -> Result<Reply, SmtpError> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(TIMEOUT_SECS);
        let mut lines = Vec::new();

        loop {
            let mut line = String::new();
            let read = tokio::time::timeout_at(deadline, self.stream.read_line(&mut line))
                .await
                .map_err(|_| SmtpError::Timeout("SMTP reply"))??;
            if read == 0 {
                if lines.is_empty() {
                    return Err(SmtpError::Closed);
                }
                break;
            }

            let trimmed = line.trim_end().to_string();
            tracing::trace!(smtp_line = %trimmed, "SMTP reply line");
            let last = trimmed.as_bytes().get(3) != Some(&b'-');
            lines.push(trimmed);
            if last {
                break;
            }
        }

        let code = lines
            .first()
            .and_then(|l| l.get(..3))
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(0);
        Ok(Reply { code, lines })
    }

    /// Read a reply and require its class (2xx, 3xx) to match `expected`.
    pub async fn expect(&mut self, expected: u16) -> Result<Reply, SmtpError> {
        let reply = self.read_reply().await?;
        if reply.code / 100 != expected / 100 {
            return Err(SmtpError::Rejected {
                expected: expected / 100,
                code: reply.code,
                text: reply.text(),
            });
        }
        Ok(reply)
    }

    /// Send raw command text and check the reply class.
    pub async fn command(&mut self, cmd: &str, expected: u16) -> Result<Reply, SmtpError> {
        self.stream.write_all(cmd.as_bytes()).await?;
        self.stream.flush().await?;
        self.expect(expected).await
    }

    /// Release the underlying stream, e.g. for a TLS upgrade.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

/// Authenticate and deliver one message on an established, greeted,
/// EHLO'd session, then QUIT.
pub async fn deliver<S>(
    conn: &mut SmtpConnection<S>,
    username: &str,
    password: &str,
    mail: &Mail<'_>,
) -> Result<(), SmtpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !password.is_empty() {
        conn.command(&auth_login_command(), 334).await?;
        conn.command(&base64_line(username), 334).await?;
        conn.command(&base64_line(password), 235).await?;
    }

    conn.command(&mail_from_command(mail.from), 250).await?;
    conn.command(&rcpt_to_command(mail.to), 250).await?;
    conn.command(&data_command(), 354).await?;
    conn.command(&mail.to_data(Utc::now()), 250).await?;

    if let Err(e) = conn.command(&quit_command(), 221).await {
        tracing::debug!(error = %e, "QUIT not acknowledged");
    }
    Ok(())
}

/// Connect to the relay and send one message.
pub async fn send(
    settings: &SmtpSettings,
    tls: Arc<ClientConfig>,
    mail: &Mail<'_>,
) -> Result<(), SmtpError> {
    let addr = format!("{}:{}", settings.server, settings.port);
    tracing::debug!(%addr, "Connecting to SMTP relay");

    let tcp = tokio::time::timeout(
        Duration::from_secs(TIMEOUT_SECS),
        TcpStream::connect(&addr),
    )
    .await
    .map_err(|_| SmtpError::Timeout("SMTP connect"))?
    .map_err(|source| SmtpError::Connect {
        addr: addr.clone(),
        source,
    })?;

    if settings.port == IMPLICIT_TLS_PORT {
        let stream = upgrade(tls, &settings.server, tcp).await?;
        let mut conn = SmtpConnection::new(stream);
        conn.expect(220).await?;
        conn.command(&ehlo_command(EHLO_DOMAIN), 250).await?;
        return deliver(&mut conn, &settings.username, &settings.password, mail).await;
    }

    let mut plain = SmtpConnection::new(tcp);
    plain.expect(220).await?;
    plain.command(&ehlo_command(EHLO_DOMAIN), 250).await?;
    plain.command(&starttls_command(), 220).await?;

    let stream = upgrade(tls, &settings.server, plain.into_inner()).await?;
    let mut conn = SmtpConnection::new(stream);
    conn.command(&ehlo_command(EHLO_DOMAIN), 250).await?;
    deliver(&mut conn, &settings.username, &settings.password, mail).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Scripted relay on the far side of a duplex pipe. Returns every line it
    /// received.
    async fn fake_relay(
        stream: tokio::io::DuplexStream,
        reject_rcpt: bool,
    ) -> Vec<String> {
        let mut stream = BufReader::new(stream);
        let mut received = Vec::new();
        let mut in_data = false;

        stream.write_all(b"220 relay ready\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            received.push(line.clone());

            let reply: &[u8] = if in_data {
                if line == "." {
                    in_data = false;
                    b"250 queued\r\n"
                } else {
                    continue;
                }
            } else if line.starts_with("EHLO") {
                b"250-relay\r\n250 AUTH LOGIN\r\n"
            } else if line == "AUTH LOGIN" {
                b"334 VXNlcm5hbWU6\r\n"
            } else if line == base64_line("user").trim_end() {
                b"334 UGFzc3dvcmQ6\r\n"
            } else if line == base64_line("secret").trim_end() {
                b"235 ok\r\n"
            } else if line.starts_with("RCPT") && reject_rcpt {
                b"550 no such user\r\n"
            } else if line == "DATA" {
                in_data = true;
                b"354 go ahead\r\n"
            } else if line == "QUIT" {
                stream.write_all(b"221 bye\r\n").await.unwrap();
                break;
            } else {
                b"250 ok\r\n"
            };
            stream.write_all(reply).await.unwrap();
        }
        received
    }

    fn mail() -> Mail<'static> {
        Mail {
            from: "sales@complai.io",
            to: "cto@acme.com",
            subject: "Audit prep",
            body: "<p>Hi</p>\n.hidden line",
            is_html: true,
        }
    }

    #[tokio::test]
    async fn test_full_dialogue() {
        let (client, server) = tokio::io::duplex(4096);
        let relay = tokio::spawn(fake_relay(server, false));

        let mut conn = SmtpConnection::new(client);
        conn.expect(220).await.unwrap();
        let ehlo = conn.command(&ehlo_command("test"), 250).await.unwrap();
        assert_eq!(ehlo.lines, vec!["250-relay", "250 AUTH LOGIN"]);
        deliver(&mut conn, "user", "secret", &mail()).await.unwrap();
        drop(conn);

        let received = relay.await.unwrap();
        assert!(received.contains(&"AUTH LOGIN".to_string()));
        assert!(received.contains(&"MAIL FROM:<sales@complai.io>".to_string()));
        assert!(received.contains(&"RCPT TO:<cto@acme.com>".to_string()));
        assert!(received.contains(&"Content-Type: text/html; charset=UTF-8".to_string()));
        assert!(received.contains(&"Content-Transfer-Encoding: base64".to_string()));
        assert!(!received.iter().any(|line| line.contains("hidden line")));
        assert_eq!(received.last().map(String::as_str), Some("QUIT"));
    }

    #[tokio::test]
    async fn test_rejected_recipient() {
        let (client, server) = tokio::io::duplex(4096);
        tokio::spawn(fake_relay(server, true));

        let mut conn = SmtpConnection::new(client);
        conn.expect(220).await.unwrap();
        conn.command(&ehlo_command("test"), 250).await.unwrap();
        let err = deliver(&mut conn, "user", "secret", &mail())
            .await
            .unwrap_err();

        assert!(matches!(err, SmtpError::Rejected { code: 550, .. }));
        assert_eq!(err.to_string(), "Expected 2xx reply, got 550: 550 no such user");
    }

    #[tokio::test]
    async fn test_no_password_skips_auth() {
        let (client, server) = tokio::io::duplex(4096);
        let relay = tokio::spawn(fake_relay(server, false));

        let mut conn = SmtpConnection::new(client);
        conn.expect(220).await.unwrap();
        deliver(&mut conn, "user", "", &mail()).await.unwrap();
        drop(conn);

        let received = relay.await.unwrap();
        assert!(!received.contains(&"AUTH LOGIN".to_string()));
    }

    #[test]
    fn test_message_data() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let data = Mail {
            is_html: false,
            subject: "Grüße",
            ..mail()
        }
        .to_data(date);

        assert!(data.contains("Subject: =?UTF-8?B?R3LDvMOfZQ==?=\r\n"));
        assert!(data.contains("May 2024 12:00:00 +0000\r\n"));
        assert!(data.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
        assert!(data.contains("Content-Transfer-Encoding: base64\r\n\r\n"));
        assert!(data.ends_with("\r\n.\r\n"));

        let (_, body) = data.split_once("\r\n\r\n").unwrap();
        let encoded: String = body
            .trim_end_matches("\r\n.\r\n")
            .split("\r\n")
            .collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "<p>Hi</p>\r\n.hidden line");
    }

    #[test]
    fn test_long_body_is_wrapped() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let paragraph = "Audit evidence, collected without spreadsheets. ".repeat(60);
        let data = Mail {
            body: &paragraph,
            ..mail()
        }
        .to_data(date);

        let (_, body) = data.split_once("\r\n\r\n").unwrap();
        let lines: Vec<&str> = body.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.len() <= BODY_LINE_WIDTH));
        assert!(data.split("\r\n").all(|line| line.len() <= 998));
        assert_eq!(lines.last(), Some(&"."));
    }

    #[test]
    fn test_base64_line() {
        assert_eq!(base64_line("user"), "dXNlcg==\r\n");
    }

    #[test]
    fn test_tls_config_missing_ca_file() {
        let err = tls_client_config(Some(Path::new("/nonexistent/ca.pem"))).unwrap_err();
        assert!(matches!(err, SmtpError::Tls(_)));
    }
}

//! SMTP delivery through the local mail relay.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::{SmtpTransport, Transport};

use super::{Notifier, Recipients};
use crate::core::config::{GlobalConfig, relay_address};
use crate::core::errors::{MonitorError, Result};

/// Upper bound on a single relay session.
const RELAY_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends notifications as plain-text mail through an SMTP relay.
///
/// Every call opens its own connection and closes it once the attempt ends,
/// successful or not.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    mail_domain: String,
}

impl SmtpNotifier {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, mail_domain: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            mail_domain: mail_domain.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(&config.smtp_host, config.smtp_port, &config.mail_domain)
    }

    fn relay(&self) -> String {
        relay_address(&self.host, self.port)
    }

    /// Build the RFC 5322 message for one notification.
    pub fn build_message(
        &self,
        sender: &str,
        recipients: &Recipients,
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        let addresses = recipients.to_vec();
        if addresses.iter().all(|address| address.trim().is_empty()) {
            return Err(MonitorError::MailBuild {
                details: "no recipients".to_string(),
            });
        }

        let mut builder = Message::builder()
            .from(self.mailbox(sender)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for address in addresses.iter().filter(|a| !a.trim().is_empty()) {
            builder = builder.to(self.mailbox(address)?);
        }
        Ok(builder.body(body.to_string())?)
    }

    fn mailbox(&self, address: &str) -> Result<Mailbox> {
        let qualified = qualify_address(address, &self.mail_domain);
        qualified
            .parse::<Mailbox>()
            .map_err(|err| MonitorError::MailAddress {
                address: address.to_string(),
                details: err.to_string(),
            })
    }
}

impl Notifier for SmtpNotifier {
    fn notify(
        &self,
        sender: &str,
        recipients: &Recipients,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let message = self.build_message(sender, recipients, subject, body)?;
        let relay = self.relay();
        tracing::debug!("opening mail session to {relay}");

        // No pooling: the connection lives only for this send.
        let transport = SmtpTransport::builder_dangerous(self.host.as_str())
            .port(self.port)
            .timeout(Some(RELAY_TIMEOUT))
            .build();
        let sent = transport.send(&message);
        drop(transport);

        sent.map(|_| ()).map_err(|err| MonitorError::MailTransport {
            relay,
            details: err.to_string(),
        })
    }
}

/// Append `@domain` to bare local names such as `root`.
#[must_use]
pub fn qualify_address(address: &str, domain: &str) -> String {
    let address = address.trim();
    if address.contains('@') || domain.is_empty() {
        address.to_string()
    } else {
        format!("{address}@{domain}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;
    use crate::core::config::LogLevel;
    use crate::logger::{LogCapture, MonitorLogger};

    fn notifier() -> SmtpNotifier {
        SmtpNotifier::new("localhost", 25, "localhost")
    }

    fn render(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    /// Minimal relay on loopback that accepts exactly one session.
    fn fake_relay() -> (u16, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            stream
                .set_read_timeout(Some(Duration::from_secs(10)))
                .expect("read timeout");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut writer = stream;
            writer.write_all(b"220 localhost ESMTP\r\n").expect("greet");
            let mut in_data = false;
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let command = line.trim_end();
                if in_data {
                    if command == "." {
                        in_data = false;
                        writer.write_all(b"250 queued\r\n").expect("reply");
                    }
                    continue;
                }
                let verb = command.get(..4).unwrap_or(command).to_ascii_uppercase();
                let reply: &[u8] = match verb.as_str() {
                    "EHLO" | "HELO" => b"250 localhost\r\n",
                    "DATA" => {
                        in_data = true;
                        b"354 go\r\n"
                    }
                    "QUIT" => {
                        writer.write_all(b"221 bye\r\n").expect("reply");
                        break;
                    }
                    _ => b"250 ok\r\n",
                };
                writer.write_all(reply).expect("reply");
            }
        });
        (port, handle)
    }

    #[test]
    fn session_trace_is_logged_at_debug() {
        let (port, relay) = fake_relay();
        let notifier = SmtpNotifier::new("127.0.0.1", port, "localhost");
        let capture = LogCapture::default();
        let logger = MonitorLogger::with_writer(LogLevel::Debug, capture.clone());

        logger
            .in_scope(|| notifier.notify("root", &Recipients::from("ops@example.com"), "s", "b"))
            .expect("relay accepts message");
        relay.join().expect("relay thread");

        let text = capture.contents();
        assert!(text.contains("opening mail session to 127.0.0.1:"), "{text}");
        assert!(text.contains("Wrote: EHLO"), "{text}");
        assert!(text.contains("MAIL FROM:<root@localhost>"), "{text}");
        // Session is closed after the single send.
        assert!(text.contains("Wrote: QUIT"), "{text}");
        assert!(text.contains("221 bye"), "{text}");
    }

    #[test]
    fn session_trace_is_hidden_above_debug() {
        let (port, relay) = fake_relay();
        let notifier = SmtpNotifier::new("127.0.0.1", port, "localhost");
        let capture = LogCapture::default();
        let logger = MonitorLogger::with_writer(LogLevel::Info, capture.clone());

        logger
            .in_scope(|| notifier.notify("root", &Recipients::from("ops@example.com"), "s", "b"))
            .expect("relay accepts message");
        relay.join().expect("relay thread");

        assert_eq!(capture.contents(), "");
    }

    #[test]
    fn bare_names_are_qualified() {
        assert_eq!(qualify_address("root", "localhost"), "root@localhost");
        assert_eq!(qualify_address("ops@example.com", "localhost"), "ops@example.com");
        assert_eq!(
            qualify_address("Ops <ops@example.com>", "localhost"),
            "Ops <ops@example.com>"
        );
    }

    #[test]
    fn message_joins_recipients_into_one_header() {
        let recipients = Recipients::from(vec![
            "a@example.com".to_string(),
            "b@example.com".to_string(),
        ]);
        let message = notifier()
            .build_message("root", &recipients, "Ping to web failed", "body")
            .expect("message builds");
        let text = render(&message);
        assert!(text.contains("From: root@localhost"), "{text}");
        assert!(text.contains("To: a@example.com, b@example.com"), "{text}");
        assert!(text.contains("Subject: Ping to web failed"), "{text}");
    }

    #[test]
    fn message_is_plain_utf8_with_encoded_subject() {
        let message = notifier()
            .build_message(
                "root",
                &Recipients::from("ops@example.com"),
                "Ping to büro failed",
                "ping to büro failed.",
            )
            .expect("message builds");
        let text = render(&message);
        assert!(
            text.to_ascii_lowercase()
                .contains("content-type: text/plain; charset=utf-8"),
            "{text}"
        );
        // Non-ASCII words are encoded one by one; ASCII words stay readable.
        let subject = text
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("subject:"))
            .expect("subject header present");
        assert!(subject.to_ascii_lowercase().contains("=?utf-8?b?"), "{subject}");
        assert!(!subject.contains("büro"), "{subject}");
        assert!(subject.contains("Ping to"), "{subject}");
    }

    #[test]
    fn single_and_list_recipient_build_same_header() {
        let single = notifier()
            .build_message("root", &Recipients::from("ops@example.com"), "s", "b")
            .expect("message builds");
        let list = notifier()
            .build_message(
                "root",
                &Recipients::from(vec!["ops@example.com".to_string()]),
                "s",
                "b",
            )
            .expect("message builds");
        let header = |m: &Message| {
            render(m)
                .lines()
                .find(|line| line.starts_with("To: "))
                .map(str::to_string)
        };
        assert_eq!(header(&single), header(&list));
    }

    #[test]
    fn empty_recipient_list_is_a_build_error() {
        let err = notifier()
            .build_message("root", &Recipients::Many(Vec::new()), "s", "b")
            .unwrap_err();
        assert_eq!(err.code(), "PM-3002");
    }

    #[test]
    fn malformed_address_is_reported() {
        let err = notifier()
            .build_message("root", &Recipients::from("not an address@"), "s", "b")
            .unwrap_err();
        assert_eq!(err.code(), "PM-3001");
    }

    #[test]
    fn unreachable_relay_surfaces_transport_error() {
        // Port 1 on loopback refuses connections on any sane test host.
        let notifier = SmtpNotifier::new("127.0.0.1", 1, "localhost");
        let err = notifier
            .notify("root", &Recipients::from("ops@example.com"), "s", "b")
            .unwrap_err();
        assert_eq!(err.code(), "PM-3003");
        assert!(err.to_string().contains("127.0.0.1:1"));
    }
}

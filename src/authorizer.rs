use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::Result;

/// Outcome of asking the user to approve a request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// The user approved. OAuth 1.0a services hand out a verifier code.
    Granted { verifier: Option<String> },
    Denied,
}

/// The human step of the handshake: show `url`, wait for a decision.
///
/// Only consulted when the client runs in debug mode.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, url: &str) -> Result<Approval>;
}

/// Prints the authorization URL and waits on stdin.
///
/// An empty line approves and `n` or `no` declines. Anything else is taken
/// as the verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinAuthorizer;

#[async_trait]
impl Authorizer for StdinAuthorizer {
    async fn authorize(&self, url: &str) -> Result<Approval> {
        let mut stdout = tokio::io::stdout();
        let prompt = format!(
            "Authorize this: {}\nverifier (empty to continue, n to decline): ",
            url
        );
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        Ok(parse_answer(&line))
    }
}

fn parse_answer(line: &str) -> Approval {
    match line.trim() {
        "" => Approval::Granted { verifier: None },
        answer if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no") => {
            Approval::Denied
        }
        verifier => Approval::Granted {
            verifier: Some(verifier.to_string()),
        },
    }
}

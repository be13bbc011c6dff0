//! Terminal chat client for a running convo-rag server
//!
//! Run with: cargo run -p convo-rag --features cli --bin convo-rag-chat

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use convo_rag::types::{AskRequest, AskResponse, Role, Turn};

/// Shown for every failure; details go to the debug log only
const ERROR_MESSAGE: &str = "I encountered an error. Please try again.";

/// Chat with a document from the terminal
#[derive(Parser, Debug)]
#[command(name = "convo-rag-chat", version, about)]
struct ChatArgs {
    /// Base URL of the chat server
    #[arg(short = 'u', long = "url", env = "CONVO_RAG_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Continue an existing session
    #[arg(short = 's', long = "session")]
    session: Option<String>,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 120)]
    timeout_secs: u64,
}

struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    session_id: Option<String>,
    /// Display-only transcript; the server keeps the authoritative log
    transcript: Vec<Turn>,
}

impl ChatClient {
    fn new(args: &ChatArgs) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(args.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: args.url.trim_end_matches('/').to_string(),
            session_id: args.session.clone(),
            transcript: Vec::new(),
        })
    }

    async fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        let mut request = AskRequest::new(question);
        if let Some(ref id) = self.session_id {
            request = request.with_session(id.clone());
        }

        let response: AskResponse = self
            .http
            .post(format!("{}/ask", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        self.session_id = Some(response.session_id);
        self.transcript.push(Turn::user(question));
        self.transcript.push(Turn::model(response.answer.clone()));
        Ok(response.answer)
    }

    async fn reset(&mut self) -> anyhow::Result<()> {
        self.transcript.clear();
        if let Some(id) = self.session_id.take() {
            let response = self
                .http
                .delete(format!("{}/sessions/{}", self.base_url, id))
                .send()
                .await?;
            // An expired session is already gone
            if response.status() != reqwest::StatusCode::NOT_FOUND {
                response.error_for_status()?;
            }
        }
        Ok(())
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_history(term: &Term, transcript: &[Turn]) -> std::io::Result<()> {
    if transcript.is_empty() {
        return term.write_line(&style("No messages yet.").dim().to_string());
    }
    for turn in transcript {
        let label = match turn.role {
            Role::User => style("You").green().bold(),
            Role::Model => style("Bot").cyan().bold(),
        };
        term.write_line(&format!("{}: {}", label, turn.text))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convo_rag=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ChatArgs::parse();
    let mut client = ChatClient::new(&args)?;
    let term = Term::stdout();

    term.write_line(&format!(
        "{} connected to {}",
        style("convo-rag").bold(),
        client.base_url
    ))?;
    term.write_line(&style("Commands: /history, /reset, /quit").dim().to_string())?;

    loop {
        term.write_str(&format!("\n{} ", style("You:").green().bold()))?;
        term.flush()?;
        let mut line = String::new();
        // Zero bytes means stdin closed
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => print_history(&term, &client.transcript)?,
            "/reset" => match client.reset().await {
                Ok(()) => term.write_line(&style("Conversation cleared.").dim().to_string())?,
                Err(e) => {
                    tracing::debug!("Reset failed: {:#}", e);
                    term.write_line(&style(ERROR_MESSAGE).red().to_string())?;
                }
            },
            question => {
                let spinner = spinner();
                let outcome = client.ask(question).await;
                spinner.finish_and_clear();

                match outcome {
                    Ok(answer) => {
                        term.write_line(&format!("{} {}", style("Bot:").cyan().bold(), answer))?
                    }
                    Err(e) => {
                        tracing::debug!("Ask failed: {:#}", e);
                        term.write_line(&style(ERROR_MESSAGE).red().to_string())?;
                    }
                }
            }
        }
    }

    if let Some(ref id) = client.session_id {
        term.write_line(&style(format!("Session: {}", id)).dim().to_string())?;
    }
    Ok(())
}

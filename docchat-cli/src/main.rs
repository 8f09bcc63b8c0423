use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use docchat_rag::{ChunkConfig, EmbeddingProvider, OllamaEmbeddingProvider, OpenAIEmbeddingProvider};
use docchat_session::ollama::{DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_URL, OllamaChatModel};
use docchat_session::openai::{OPENAI_API_BASE, OpenAIChatModel};
use docchat_session::{
    Answer, AskError, LanguageModel, SessionConfig, SessionController, SessionId, Upload,
    content_type_for,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Ollama,
    Openai,
}

/// Ask questions about a PDF or text file.
#[derive(Parser, Debug)]
#[command(name = "docchat", version, about, long_about = None)]
struct Args {
    /// Document to load (.pdf, .md or plain text)
    file: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long, env = "DOCCHAT_CHUNK_SIZE", default_value_t = 1000)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "DOCCHAT_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Passages retrieved per question
    #[arg(long, env = "DOCCHAT_TOP_K", default_value_t = 4)]
    top_k: usize,

    /// Rewrite follow-up questions into standalone ones before retrieval
    #[arg(long, env = "DOCCHAT_CONDENSE")]
    condense: bool,

    /// Chat model backend
    #[arg(long, value_enum, env = "DOCCHAT_PROVIDER", default_value = "ollama")]
    provider: Provider,

    /// Embedding backend
    #[arg(long, value_enum, env = "DOCCHAT_EMBEDDER", default_value = "ollama")]
    embedder: Provider,

    /// Chat model name (defaults per provider)
    #[arg(long, env = "DOCCHAT_MODEL")]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long, env = "DOCCHAT_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// OpenAI-compatible API base, e.g. https://api.groq.com/openai/v1
    #[arg(long, env = "DOCCHAT_OPENAI_API_BASE", default_value = OPENAI_API_BASE)]
    openai_api_base: String,

    /// API key for the OpenAI-compatible backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
}

impl Args {
    fn api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().context("OPENAI_API_KEY is required for the openai provider")
    }

    fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(match self.embedder {
            Provider::Ollama => {
                Arc::new(OllamaEmbeddingProvider::new().with_base_url(&self.ollama_url))
            }
            Provider::Openai => Arc::new(
                OpenAIEmbeddingProvider::new(self.api_key()?)?.with_api_base(&self.openai_api_base),
            ),
        })
    }

    fn chat_model(&self) -> Result<Arc<dyn LanguageModel>> {
        Ok(match self.provider {
            Provider::Ollama => {
                let name = self.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL);
                Arc::new(OllamaChatModel::new(name).with_base_url(&self.ollama_url))
            }
            Provider::Openai => {
                let name = self.model.as_deref().unwrap_or("gpt-4o-mini");
                Arc::new(
                    OpenAIChatModel::new(self.api_key()?, name)?
                        .with_api_base(&self.openai_api_base),
                )
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let chunk_config = ChunkConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .build()?;
    let config = SessionConfig::builder()
        .top_k(args.top_k)
        .condense_follow_ups(args.condense)
        .build();
    let controller = SessionController::new(args.embedding_provider()?, args.chat_model()?, config);

    let upload = read_upload(&args.file)?;
    let session_id = controller.start_session().await;
    let result = chat(&controller, session_id, &upload, &chunk_config).await;
    controller.end_session(session_id).await;
    result
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content_type = content_type_for(&name);
    debug!(file = %name, content_type, size = bytes.len(), "read upload");
    Ok(Upload::new(name, content_type, bytes))
}

async fn chat(
    controller: &SessionController,
    session_id: SessionId,
    upload: &Upload,
    chunk_config: &ChunkConfig,
) -> Result<()> {
    println!("Processing `{}`...", upload.name);
    let ready = controller.ingest_upload(session_id, upload, chunk_config).await?;
    println!(
        "Processing `{}` done ({} chunks). You can now ask questions!",
        ready.document_name, ready.chunk_count
    );
    info!(%session_id, chunk_count = ready.chunk_count, "ready for questions");

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => bail!(e),
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        editor.add_history_entry(question)?;

        match controller.ask(session_id, question).await {
            Ok(answer) => print_answer(&answer),
            Err(e @ (AskError::AnswerGeneration(_) | AskError::Retrieval(_))) => {
                let hint = if e.is_retryable() { " (try again)" } else { "" };
                eprintln!("error: {e}{hint}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.rendered());
    for source in &answer.sources {
        println!("\n[{}] chunk {} (score {:.3})", source.label, source.chunk_label, source.score);
        println!("{}", source.text);
    }
    println!();
}

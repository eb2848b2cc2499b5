use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use lurker_core::cognition::ResponseRequester;
use lurker_core::config::{BotIdentity, LurkerCfg};
use lurker_core::emotes::{BuiltinCatalog, EmoteCatalog, HttpCatalog};
use lurker_core::entropy::ThreadEntropy;
use lurker_core::io::{ConsoleTransport, InboundLine, OutboundLine, parse_line};
use lurker_core::memory::{EphemeralStore, Persistence, PgStore};
use lurker_core::runtime::{Runtime, Services};
use lurker_llm::provider::LlmProvider;
use rustyline::error::ReadlineError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DB_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_CHANNEL: &str = "#lurker";
const LOG_FILE: &str = "/tmp/lurker.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing goes to a file when RUST_LOG is set; stdout belongs to the console.
    if std::env::var("RUST_LOG").is_ok() {
        let file = std::fs::File::create(LOG_FILE)?;
        let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
        if std::env::var("LURKER_LOG_JSON").is_ok() {
            registry
                .with(fmt::layer().json().with_target(true).with_writer(file))
                .init();
        } else {
            registry
                .with(fmt::layer().with_ansi(false).with_writer(file))
                .init();
        }
    }

    let mut notices: Vec<String> = Vec::new();
    let pool = match std::env::var("DATABASE_URL") {
        Ok(url) => match connect(&url).await {
            Ok(pool) => Some(pool),
            Err(reason) => {
                notices.push(format!(
                    "note: {reason}; running in ephemeral mode, nothing from this session will be kept"
                ));
                None
            }
        },
        Err(_) => None,
    };

    let cfg = match &pool {
        Some(pool) => LurkerCfg::load(pool).await?,
        None => LurkerCfg::default(),
    };
    let cfg = Arc::new(cfg);

    let persistence: Arc<dyn Persistence> = match pool {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => Arc::new(EphemeralStore::with_message_cap(
            (cfg.trend_scan.max(0) as usize).max(cfg.history_cap),
        )),
    };

    let llm: Option<Arc<dyn LlmProvider>> = lurker_llm::http::from_env().map(|p| Arc::new(p) as _);
    if llm.is_none() {
        notices.push("note: LURKER_LLM_MODEL / LURKER_LLM_API_KEY not set; lurker will listen but never speak".into());
    }
    let requester = llm.map(|p| ResponseRequester::new(p, &cfg));

    let catalog: Arc<dyn EmoteCatalog> = if std::env::var("LURKER_FETCH_EMOTES").is_ok() {
        Arc::new(HttpCatalog::new())
    } else {
        Arc::new(BuiltinCatalog)
    };

    let mut identity = BotIdentity::from_env();
    if identity.channels.is_empty() {
        identity.channels.push(DEFAULT_CHANNEL.to_owned());
    }
    let default_channel = identity.channels[0].clone();
    let nick = identity.nick.clone();

    let (transport, outbound_rx) = ConsoleTransport::new(64);
    let services = Services::new(
        Arc::clone(&cfg),
        identity,
        persistence,
        requester,
        catalog,
        Arc::new(transport),
        Box::new(ThreadEntropy::new()),
    );

    let (mut runtime, inbound_tx) = Runtime::new(services);
    let token = runtime.token();

    let runtime_fut = runtime.run();
    let repl_fut = run_repl(inbound_tx, outbound_rx, token.clone(), default_channel, nick, notices);
    tokio::pin!(runtime_fut);
    tokio::pin!(repl_fut);

    tokio::select! {
        _ = &mut runtime_fut => {
            token.cancel();
            (&mut repl_fut).await
        }
        result = &mut repl_fut => {
            token.cancel();
            (&mut runtime_fut).await;
            result
        }
    }
}

/// Connect and migrate, giving up after a short timeout.
async fn connect(url: &str) -> Result<PgPool, String> {
    let attempt = PgPoolOptions::new().max_connections(8).connect(url);
    let pool = match tokio::time::timeout(Duration::from_secs(DB_CONNECT_TIMEOUT_SECS), attempt).await {
        Ok(Ok(pool)) => pool,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "database connection failed");
            return Err("could not connect to DATABASE_URL".into());
        }
        Err(_) => {
            tracing::warn!("database connection timed out");
            return Err(format!("database connection timed out ({DB_CONNECT_TIMEOUT_SECS}s)"));
        }
    };
    sqlx::migrate!("../../migrations").run(&pool).await.map_err(|e| {
        tracing::warn!(error = %e, "database migration failed");
        "database migration failed".to_owned()
    })?;
    tracing::info!("database ready");
    Ok(pool)
}

async fn run_repl(
    inbound_tx: mpsc::Sender<InboundLine>,
    mut outbound_rx: mpsc::Receiver<OutboundLine>,
    token: CancellationToken,
    default_channel: String,
    nick: String,
    notices: Vec<String>,
) -> anyhow::Result<()> {
    for notice in notices {
        println!("{notice}");
    }
    println!("type chat lines as `[#channel] [author:] text`; /q to quit");

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<InputEvent>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
    spawn_input_thread(line_tx, ready_rx, format!("{default_channel}> "));
    request_next_prompt(&ready_tx);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            line = line_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match line {
                    InputEvent::Line(line) => {
                        let text = line.trim();
                        if matches!(text, "/q" | "/exit" | "/quit") {
                            break;
                        }
                        if let Some(inbound) = parse_line(text, &default_channel) {
                            if inbound_tx.send(inbound).await.is_err() {
                                break;
                            }
                        }
                        request_next_prompt(&ready_tx);
                    }
                    InputEvent::Interrupted => {
                        token.cancel();
                        break;
                    }
                    InputEvent::Eof => break,
                    InputEvent::Error(err) => {
                        eprintln!("input error: {err}");
                        break;
                    }
                }
            }
            msg = outbound_rx.recv() => {
                let Some(msg) = msg else {
                    break;
                };
                println!("\r\x1b[2K{} <{nick}> {}", msg.channel, msg.text);
                io::stdout().flush()?;
            }
        }
    }
    drop(ready_tx);
    println!();
    Ok(())
}

fn request_next_prompt(ready_tx: &std::sync::mpsc::Sender<()>) {
    let _ = ready_tx.send(());
}

fn spawn_input_thread(
    line_tx: mpsc::UnboundedSender<InputEvent>,
    ready_rx: std::sync::mpsc::Receiver<()>,
    prompt: String,
) {
    std::thread::spawn(move || {
        let mut editor = match rustyline::DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = line_tx.send(InputEvent::Error(e.to_string()));
                return;
            }
        };

        while ready_rx.recv().is_ok() {
            match editor.readline(&prompt) {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.send(InputEvent::Line(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    let _ = line_tx.send(InputEvent::Interrupted);
                    break;
                }
                Err(ReadlineError::Eof) => {
                    let _ = line_tx.send(InputEvent::Eof);
                    break;
                }
                Err(e) => {
                    let _ = line_tx.send(InputEvent::Error(e.to_string()));
                    break;
                }
            }
        }
    });
}

enum InputEvent {
    Line(String),
    Interrupted,
    Eof,
    Error(String),
}

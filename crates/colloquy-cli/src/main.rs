//! colloquy - streaming chat Q&A CLI

mod config;

use clap::Parser;
use std::sync::Arc;

use colloquy_api::{HistoryClient, QnaClient, StreamingUpdate};
use colloquy_chat::{ChatEvent, ChatSession, ServiceTransport};

/// colloquy - chat with a streaming Q&A service
#[derive(Parser, Debug)]
#[command(name = "colloquy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Answer service base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// History service base URL (defaults to the answer endpoint)
    #[arg(long)]
    history_endpoint: Option<String>,

    /// Bearer token forwarded to both services
    #[arg(long)]
    token: Option<String>,

    /// Ask a single question and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Open a saved chat by id
    #[arg(long)]
    open: Option<String>,

    /// List saved chats
    #[arg(long)]
    chats: bool,

    /// Delete a saved chat by id
    #[arg(long)]
    delete: Option<String>,

    /// Rename a saved chat by id (requires --name)
    #[arg(long)]
    rename: Option<String>,

    /// New name for --rename
    #[arg(long)]
    name: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("colloquy=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file and merge with CLI args (CLI takes precedence)
    let cfg = config::Config::load();

    let endpoint = match args.endpoint.or(cfg.endpoint.clone()) {
        Some(endpoint) => endpoint,
        None => {
            eprintln!("Error: no answer endpoint configured");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  1. Pass it on the command line: colloquy --endpoint <url>");
            eprintln!("  2. Add it to the config file: colloquy --init-config");
            std::process::exit(1);
        }
    };
    let history_endpoint = args
        .history_endpoint
        .or(cfg.history_endpoint.clone())
        .unwrap_or_else(|| endpoint.clone());
    let token = args.token.or(cfg.token.clone());

    let build_history = || {
        let mut history = HistoryClient::new(&history_endpoint);
        if let Some(ref token) = token {
            history = history.with_bearer_token(token);
        }
        history
    };

    // History management commands
    if args.chats {
        return list_chats(&build_history()).await;
    }
    if let Some(ref id) = args.delete {
        build_history().delete_chat(id).await?;
        println!("Deleted chat {}", id);
        return Ok(());
    }
    if let Some(ref id) = args.rename {
        let Some(ref name) = args.name else {
            anyhow::bail!("--rename requires --name");
        };
        build_history().rename_chat(id, name).await?;
        println!("Renamed chat {} to \"{}\"", id, name);
        return Ok(());
    }

    let mut qna = QnaClient::new(&endpoint);
    if let Some(ref token) = token {
        qna = qna.with_bearer_token(token);
    }

    let transport = Arc::new(ServiceTransport::new(qna));
    let session = ChatSession::new(transport).with_history(build_history());

    // Resume a saved chat if specified
    if let Some(ref id) = args.open {
        if let Err(e) = session.load_chat(id).await {
            eprintln!("Error loading chat: {}", e);
            std::process::exit(1);
        }
        print_history(&session);
    }

    // Non-interactive mode
    if let Some(ref question) = args.question {
        return ask_and_print(&session, question).await;
    }

    run_interactive(&session).await
}

async fn list_chats(history: &HistoryClient) -> anyhow::Result<()> {
    let chats = history.list_chats().await?;
    if chats.is_empty() {
        println!("No saved chats.");
        return Ok(());
    }
    for chat in chats {
        println!("{}  {}", chat.id, chat.history_name);
    }
    Ok(())
}

/// Print the restored turns of a loaded chat
fn print_history(session: &ChatSession) {
    for turn in session.turns() {
        println!("> {}", turn.question);
        if let Some(answer) = turn.answer_text() {
            println!("{}", answer);
        }
        println!();
    }
}

/// Ask one question, printing answer chunks as they stream in.
/// Ctrl-C aborts the request and keeps the partial answer.
async fn ask_and_print(session: &ChatSession, question: &str) -> anyhow::Result<()> {
    use std::io::Write;

    let mut rx = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut sources = 0usize;
        while let Ok(event) = rx.recv().await {
            match &event {
                ChatEvent::TurnStarted { .. } => {}
                ChatEvent::TurnUpdated { update, .. } => match update {
                    StreamingUpdate::Fragment { text } => {
                        print!("{}", text);
                        let _ = std::io::stdout().flush();
                    }
                    StreamingUpdate::Replace { payload } => {
                        if let Some(text) = payload.get("text").and_then(|t| t.as_str()) {
                            print!("{}", text);
                            let _ = std::io::stdout().flush();
                        }
                    }
                    StreamingUpdate::Sources { documents } => {
                        sources = documents.len();
                    }
                },
                ChatEvent::TurnCompleted { .. } => {
                    println!();
                    if sources > 0 {
                        println!("[{} source{}]", sources, if sources == 1 { "" } else { "s" });
                    }
                }
                ChatEvent::TurnFailed { kind, .. } => {
                    println!();
                    eprintln!("Error: {}", kind.message());
                }
                ChatEvent::TurnCancelled { .. } => {
                    println!();
                    eprintln!("(cancelled)");
                }
            }
            if event.is_terminal() {
                break;
            }
        }
    });

    let ask = session.ask(question);
    tokio::pin!(ask);
    loop {
        tokio::select! {
            _ = &mut ask => break,
            _ = tokio::signal::ctrl_c() => session.abort(),
        }
    }

    let _ = printer.await;
    Ok(())
}

/// Interactive mode (simple stdin/stdout)
async fn run_interactive(session: &ChatSession) -> anyhow::Result<()> {
    use std::io::{self, IsTerminal, Write};

    // Show minimal startup info (only if TTY)
    if io::stderr().is_terminal() {
        match session.chat_id() {
            Some(id) => eprintln!("colloquy (chat {})", id),
            None => eprintln!("colloquy"),
        }
        eprintln!("Type a question, or /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(command) = input.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next().unwrap_or("") {
                "exit" | "quit" => break,
                "new" => {
                    session.new_chat();
                    println!("Started a new chat.");
                }
                "open" => match parts.next() {
                    Some(id) => match session.load_chat(id).await {
                        Ok(()) => print_history(session),
                        Err(e) => println!("Failed to open chat: {}", e),
                    },
                    None => println!("Usage: /open <chat-id>"),
                },
                "chats" => match session.list_chats().await {
                    Ok(chats) if chats.is_empty() => println!("No saved chats."),
                    Ok(chats) => {
                        for chat in chats {
                            println!("{}  {}", chat.id, chat.history_name);
                        }
                    }
                    Err(e) => println!("Failed to list chats: {}", e),
                },
                "help" => {
                    println!("/new          start a new chat");
                    println!("/open <id>    open a saved chat");
                    println!("/chats        list saved chats");
                    println!("/exit         quit");
                }
                other => {
                    println!("Unknown command: /{}", other);
                    println!("Type /help for available commands.");
                }
            }
            continue;
        }

        ask_and_print(session, input).await?;
    }

    Ok(())
}

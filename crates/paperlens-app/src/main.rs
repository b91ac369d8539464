use std::path::Path;
use std::{env, fs};

use anyhow::{bail, Context as _};
use config::{AppConfig, DEFAULT_AI_PROVIDER};
use core_types::{AppRoute, Document, MessageRole};
use paperlens_api::AiConfigRequest;
use paperlens_services::{AppServices, AppServicesBuilder, SendOutcome};
use pulldown_cmark::{Event, Parser};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        std::process::exit(2);
    };
    let rest: Vec<String> = args.collect();

    let config = AppConfig::from_env();
    let services = AppServicesBuilder::new(config).build()?;

    let runtime = Runtime::new().context("tokio runtime")?;
    runtime.block_on(run(&services, &command, &rest))
}

async fn run(services: &AppServices, command: &str, args: &[String]) -> anyhow::Result<()> {
    match command {
        "status" => status(services).await,
        "connect" => connect(services, args).await,
        "configure" => configure(services, args).await,
        "list" => list(services).await,
        "upload" => upload(services, args).await,
        "ask" => ask(services, args).await,
        "analyze" => analyze(services, args).await,
        "history" => history(services, args).await,
        "clear-history" => clear_history(services).await,
        _ => {
            print_usage();
            std::process::exit(2);
        }
    }
}

async fn status(services: &AppServices) -> anyhow::Result<()> {
    let state = services.startup().await;
    println!("Session: {}", state.label());
    match services.health().await {
        Ok(health) => println!(
            "Backend: {} (platform connected: {})",
            health.status, health.databricks_connected
        ),
        Err(error) => println!("Backend unreachable: {}", error.detail()),
    }
    println!("Documents cached: {}", services.documents().len());
    Ok(())
}

async fn connect(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let [host, token] = args else {
        bail!("usage: paperlens connect <host> <token>");
    };
    let outcome = services.gate().connect(host, token).await?;
    println!("{}", outcome.message);
    if let Some(user) = outcome.user {
        println!("Signed in as {user}");
    }
    if let Some(url) = outcome.workspace_url {
        println!("Workspace: {url}");
    }
    Ok(())
}

async fn configure(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let (model, provider) = match args {
        [model] => (model.clone(), DEFAULT_AI_PROVIDER.to_owned()),
        [model, provider] => (model.clone(), provider.clone()),
        _ => bail!("usage: paperlens configure <model> [provider]"),
    };
    services.gate().refresh().await;
    let outcome = services
        .gate()
        .configure_ai(&AiConfigRequest::new(provider, model))
        .await?;
    println!("{} ({} / {})", outcome.message, outcome.provider, outcome.model);
    println!("Session: {}", services.gate().state().label());
    Ok(())
}

async fn list(services: &AppServices) -> anyhow::Result<()> {
    services.startup().await;
    let count = services.refresh_documents().await?;
    if count == 0 {
        println!("No documents uploaded yet.");
        return Ok(());
    }
    println!("{count} document(s):");
    for document in services.documents() {
        println!("  {}", describe_document(&document));
    }
    Ok(())
}

async fn upload(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let (path, create_notebook) = match args {
        [path] => (path, false),
        [path, flag] if flag.as_str() == "--notebook" => (path, true),
        _ => bail!("usage: paperlens upload <file.pdf> [--notebook]"),
    };

    let state = services.startup().await;
    if services.gate().resolve_route(AppRoute::Upload) != AppRoute::Upload {
        bail!(
            "uploads need a platform connection (session is {}); run `paperlens connect` first",
            state.label()
        );
    }

    let filename = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("cannot derive a file name from {path}"))?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {path}"))?;

    let receipt = services
        .upload_pdf(filename, bytes, create_notebook)
        .await?;
    println!("Uploaded to {}", receipt.workspace_path);
    if let Some(notebook) = receipt.notebook_path {
        println!("Analysis notebook: {notebook}");
    }
    Ok(())
}

async fn ask(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let [document, question @ ..] = args else {
        bail!("usage: paperlens ask <document> <question...>");
    };
    if question.is_empty() {
        bail!("usage: paperlens ask <document> <question...>");
    }
    let question = question.join(" ");

    let state = services.startup().await;
    if services.gate().resolve_route(AppRoute::Chat) != AppRoute::Chat {
        bail!(
            "chat needs a connected platform and a configured AI model (session is {}); \
             run `paperlens connect` and `paperlens configure` first",
            state.label()
        );
    }

    let document = resolve_document(services, document)?;
    services.conversation().select_document(&document.workspace_path);

    match services.conversation().send(&question).await? {
        SendOutcome::Replied(message) => {
            if let Some(model) = &message.model_used {
                println!("[{model}]");
            }
            println!("{}", render_markdown(&message.content));
            if let Some(detail) = &message.error_detail {
                println!("(query failed: {detail})");
            }
            print_transcript(services);
        }
        SendOutcome::Busy => println!("A question is already in flight; try again shortly."),
        SendOutcome::Superseded => println!("The conversation was cleared before the reply landed."),
    }
    Ok(())
}

async fn analyze(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let (document, template) = match args {
        [document] => (document, None),
        [document, template] => (document, Some(template.as_str())),
        _ => bail!("usage: paperlens analyze <document> [template]"),
    };

    let state = services.startup().await;
    if services.gate().resolve_route(AppRoute::Analysis) != AppRoute::Analysis {
        bail!(
            "analysis needs a connected platform and a configured AI model (session is {}); \
             run `paperlens connect` and `paperlens configure` first",
            state.label()
        );
    }

    let document = resolve_document(services, document)?;
    let runner = services.analysis();

    match template {
        Some(template_id) => {
            let result = runner.run_one(template_id, &document.workspace_path).await?;
            println!("## {}", result.question);
            println!("{}", render_markdown(&result.answer));
        }
        None => {
            for (template_id, outcome) in runner.run_all(&document.workspace_path).await {
                match outcome {
                    Ok(result) => {
                        println!("## {} ({template_id})", result.question);
                        println!("{}\n", render_markdown(&result.answer));
                    }
                    Err(error) => println!("## {template_id}\n(failed: {})\n", error.detail()),
                }
            }
        }
    }
    Ok(())
}

async fn history(services: &AppServices, args: &[String]) -> anyhow::Result<()> {
    let conversation_id = match args {
        [] => services.conversation().conversation_id(),
        [id] => id.clone(),
        _ => bail!("usage: paperlens history [conversation-id]"),
    };
    let reply = services.fetch_history(&conversation_id).await?;
    println!("Conversation {}:", reply.conversation_id);
    println!("{}", serde_pretty(&reply.history));
    Ok(())
}

async fn clear_history(services: &AppServices) -> anyhow::Result<()> {
    let message = services.clear_conversation().await?;
    println!("{message}");
    Ok(())
}

fn resolve_document(services: &AppServices, name_or_path: &str) -> anyhow::Result<Document> {
    if let Some(document) = services.find_document(name_or_path) {
        return Ok(document);
    }
    // Workspace paths are usable even when the listing has not loaded.
    if name_or_path.starts_with('/') {
        return Ok(Document::new(name_or_path));
    }
    bail!("no uploaded document matches {name_or_path}; run `paperlens list`")
}

fn print_transcript(services: &AppServices) {
    let messages = services.conversation().messages();
    println!("--- transcript ({} messages) ---", messages.len());
    for message in messages {
        let speaker = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
        };
        let first_line = message.content.lines().next().unwrap_or_default();
        println!("  {speaker}: {first_line}");
    }
}

fn describe_document(document: &Document) -> String {
    let uploaded = document
        .uploaded_at
        .map(|at| at.format(" uploaded %Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{} ({}, {}){}",
        document.display_name,
        document.workspace_path,
        format_size(document.size_bytes),
        uploaded
    )
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// Flattens assistant markdown to terminal-friendly text.
fn render_markdown(markdown: &str) -> String {
    let mut output = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => output.push_str(&text),
            Event::SoftBreak | Event::HardBreak => output.push('\n'),
            Event::End(_) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            _ => {}
        }
    }
    output.trim_end().to_owned()
}

fn serde_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn print_usage() {
    eprintln!(
        "Usage: paperlens <command>\n\
         \n\
         Commands:\n\
         \x20 status                          probe the backend and session state\n\
         \x20 connect <host> <token>          connect to the Databricks workspace\n\
         \x20 configure <model> [provider]    configure the AI provider (default: databricks)\n\
         \x20 list                            list uploaded documents\n\
         \x20 upload <file.pdf> [--notebook]  upload a PDF, optionally with an analysis notebook\n\
         \x20 ask <document> <question...>    ask a question about a document\n\
         \x20 analyze <document> [template]   run analysis templates against a document\n\
         \x20 history [conversation-id]       fetch server-side conversation history\n\
         \x20 clear-history                   reset the conversation locally and remotely"
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

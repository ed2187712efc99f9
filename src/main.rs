use ipl_stats_chat::config::Config;
use ipl_stats_chat::execution::StatsDb;
use ipl_stats_chat::llm::LlmClient;
use ipl_stats_chat::observability::init_logging;
use ipl_stats_chat::pipeline::Chatbot;
use ipl_stats_chat::presenter::{Rendered, Tone};
use ipl_stats_chat::prompt::PromptTemplate;
use ipl_stats_chat::schema::IPL_SCHEMA;
use ipl_stats_chat::translator::QueryTranslator;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const FALLBACK_EXAMPLE: &str = "How many runs did Dhoni score in 2018?";

#[derive(Parser)]
#[command(name = "ipl-chat")]
#[command(about = "Ask questions about IPL statistics in plain language")]
#[command(version)]
struct Args {
    /// Path to the IPL statistics database (or set IPL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Diagnostic log file (or set IPL_LOG_FILE)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// LLM provider: gemini or openai (or set LLM_PROVIDER)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model identifier (or set LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// API key (or set GEMINI_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Prompt template with a {question} placeholder (or set IPL_PROMPT_FILE)
    #[arg(long, global = true)]
    prompt_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question in plain language
        question: String,

        /// Print the full answer (SQL, table, rendering) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the SQL the model generates for a question, without running it
    Sql {
        question: String,
    },
    /// Print the prompt that would be sent for a question
    Prompt {
        question: String,
    },
    /// Ask questions interactively, one per line
    Chat,
    /// Check the database against the tables and columns the prompt advertises
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    init_logging(&config.log_file)
        .map_err(|e| anyhow!("Failed to open log file {:?}: {}", config.log_file, e))?;

    let template = PromptTemplate::load(config.prompt_file.as_deref())?;

    match args.command {
        Commands::Prompt { question } => {
            println!("{}", template.build(&question));
            Ok(())
        }
        Commands::Sql { question } => {
            let translator = build_translator(&config, template);
            let sql = translator
                .translate(&question)
                .await
                .map_err(|e| anyhow!("Translation failed: {}", e))?;
            println!("{}", sql);
            Ok(())
        }
        Commands::Check => check_schema(&config),
        Commands::Ask { question, json } => {
            let bot = build_chatbot(&config, template)?;
            let answer = bot.answer(&question).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_rendered(&answer.rendered);
            }
            Ok(())
        }
        Commands::Chat => {
            let bot = build_chatbot(&config, template)?;
            run_chat(&bot).await
        }
    }
}

/// Environment first, then CLI flags on top.
fn resolve_config(args: &Args) -> Result<Config> {
    let env = |key: &str| std::env::var(key).ok();

    let mut config = Config::from_env()?;
    if let Some(provider) = &args.provider {
        config = config.with_provider(provider.parse()?, env);
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.llm.api_key = api_key.clone();
    }
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = log_file.clone();
    }
    if let Some(prompt_file) = &args.prompt_file {
        config.prompt_file = Some(prompt_file.clone());
    }

    Ok(config)
}

fn build_translator(config: &Config, template: PromptTemplate) -> QueryTranslator {
    let llm = LlmClient::new(&config.llm);
    info!(provider = ?config.llm.provider, model = %config.llm.model, "LLM client ready");
    QueryTranslator::new(Arc::new(llm), template)
}

fn build_chatbot(config: &Config, template: PromptTemplate) -> Result<Chatbot> {
    let db = StatsDb::open_read_only(&config.db_path)
        .map_err(|e| anyhow!("Failed to open stats database: {}", e))?;
    Ok(Chatbot::new(build_translator(config, template), db))
}

fn check_schema(config: &Config) -> Result<()> {
    let db = StatsDb::open_read_only(&config.db_path)
        .map_err(|e| anyhow!("Failed to open stats database: {}", e))?;
    let issues = db.check_schema(IPL_SCHEMA)?;

    if issues.is_empty() {
        println!(
            "{:?}: all {} tables match the prompt schema",
            config.db_path,
            IPL_SCHEMA.len()
        );
        return Ok(());
    }

    for issue in &issues {
        println!("- {}", issue);
    }
    Err(anyhow!("{} schema issue(s) in {:?}", issues.len(), config.db_path))
}

fn print_rendered(rendered: &Rendered) {
    match rendered.tone {
        Tone::Error => eprintln!("{}", rendered.text),
        Tone::Success | Tone::Warning => println!("{}", rendered.text),
    }
}

async fn run_chat(bot: &Chatbot) -> Result<()> {
    let example = bot
        .translator()
        .template()
        .worked_examples()
        .into_iter()
        .next()
        .map(|e| e.question)
        .unwrap_or_else(|| FALLBACK_EXAMPLE.to_string());

    println!("IPL Stats Chatbot");
    println!("Ask me anything about IPL stats (e.g., {})", example);
    println!("Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let answer = bot.answer(question).await;
        print_rendered(&answer.rendered);
    }

    Ok(())
}

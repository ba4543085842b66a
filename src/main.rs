use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sia_screening::{
    load_phase_table, AnthropicClient, AnthropicConfig, Classifier, FallbackClassifier, FileSink,
    Interview, InterviewConfig, ModelBackedClassifier, PhaseTable, RecordSink,
    RuleBasedClassifier,
};

#[derive(Parser)]
#[command(name = "sia")]
#[command(author, version, about = "Volunteer screening interview assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a screening interview on the terminal
    Interview {
        /// Directory for session transcripts and records
        #[arg(long, default_value = "records")]
        records_dir: PathBuf,

        /// Phase table override (JSON array of phase specs)
        #[arg(long)]
        phases: Option<PathBuf>,

        /// Model name (overrides SIA_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Skip the language model and classify with rules only
        #[arg(long)]
        offline: bool,

        /// Model call timeout in seconds
        #[arg(long, default_value = "20")]
        timeout_secs: u64,

        /// Number of recent messages given to the classifier
        #[arg(long, default_value = "6")]
        history_window: usize,

        /// Session-wide turn cap
        #[arg(long, default_value = "30")]
        max_turns: u32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the phase table
    Phases {
        /// Phase table override (JSON array of phase specs)
        #[arg(long)]
        phases: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Interview {
            records_dir,
            phases,
            model,
            offline,
            timeout_secs,
            history_window,
            max_turns,
            verbose,
        } => {
            setup_logging(verbose);
            let table = Arc::new(load_table(phases.as_deref())?);
            let sink = FileSink::new(records_dir);
            let config = InterviewConfig {
                history_window,
                max_total_turns: max_turns,
                model_timeout: Duration::from_secs(timeout_secs),
                ..Default::default()
            };

            if offline {
                info!("Offline mode: rule-based classification only");
                let interview = Interview::new(table, RuleBasedClassifier::default(), sink, config);
                run_session(&interview).await
            } else {
                let mut api_config = AnthropicConfig::from_env()?;
                if let Some(model) = model {
                    api_config.model = model;
                }
                let client = Arc::new(AnthropicClient::new(api_config));
                info!("Using model {}", client.model());

                let classifier = FallbackClassifier::new(
                    ModelBackedClassifier::new(client.clone()),
                    RuleBasedClassifier::default(),
                    Duration::from_secs(timeout_secs),
                );
                let interview = Interview::new(table, classifier, sink, config).with_evaluator(client);
                run_session(&interview).await
            }
        }
        Commands::Phases { phases, verbose } => {
            setup_logging(verbose);
            print_phases(&load_table(phases.as_deref())?);
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_table(path: Option<&Path>) -> Result<PhaseTable> {
    match path {
        Some(path) => {
            info!("Loading phase table from {:?}", path);
            load_phase_table(path)
        }
        None => Ok(PhaseTable::default()),
    }
}

async fn run_session<C: Classifier, S: RecordSink>(interview: &Interview<C, S>) -> Result<()> {
    let mut state = interview.start()?;
    for message in &state.messages {
        say(&message.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !state.is_finished() {
        prompt()?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            info!("Input closed; session {} left unfinished", state.session_id);
            interview.checkpoint(&mut state);
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = interview.handle_message(&mut state, line).await?;
        for message in &reply.messages {
            say(message);
        }
    }

    if let Some(recommendation) = &state.recommendation {
        println!();
        println!("Recommendation: {:?}", recommendation.label);
        println!("Reason: {}", recommendation.reason);
        for score in &state.phase_scores {
            println!("  {:?}: {:.1} {}", score.phase, score.score, score.notes);
        }
        if let Some(summary) = &recommendation.summary {
            println!("{}", summary);
        }
    }

    Ok(())
}

fn say(message: &str) {
    println!("Shiksha Mitra: {}", message);
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

fn print_phases(table: &PhaseTable) {
    println!("Interview Phases");
    println!("================");
    for spec in table.specs() {
        let labels: Vec<String> = spec.allowed_intents.iter().map(|i| i.label()).collect();
        println!(
            "{}. {} ({:?}){}",
            spec.phase.index() + 1,
            spec.name,
            spec.phase,
            if spec.phase.is_final() { " [final]" } else { "" }
        );
        println!(
            "   turns {}-{}, profile signals needed: {}",
            spec.min_turns, spec.max_turns, spec.required_signals
        );
        println!("   intents: {}", labels.join(", "));
        println!("   opening: {}", spec.opening_prompt);
        if !spec.rubric.is_empty() {
            println!("   rubric: {}", spec.rubric);
        }
        println!();
    }
}

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use survey_flow::config::FlowConfig;
use survey_flow::error::SessionError;
use survey_flow::graph::{Block, BlockKind, Graph};
use survey_flow::interpreter::{Interpreter, Session};
use survey_flow::value::Value;

/// An answers file: either answers in the order they will be asked, or
/// answers keyed by block id.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerScript {
    Sequence(Vec<serde_json::Value>),
    ByBlock(serde_json::Map<String, serde_json::Value>),
}

/// Validate and run conversational survey graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the validation report of a graph; exits non-zero if it has errors
    Validate {
        /// Path to the survey graph JSON file
        graph_path: String,
    },
    /// Walk a graph from its start block to a final block
    Run {
        /// Path to the survey graph JSON file
        graph_path: String,

        /// JSON file with the answers to submit
        #[arg(short, long, conflicts_with = "interactive")]
        answers: Option<String>,

        /// Prompt for each answer on stdin
        #[arg(short, long)]
        interactive: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FlowConfig::from_file(path).unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => FlowConfig::default(),
    };

    match cli.command {
        Command::Validate { graph_path } => run_validate(&config, &graph_path),
        Command::Run {
            graph_path,
            answers,
            interactive,
        } => run_session(&config, &graph_path, answers.as_deref(), interactive),
    }
}

fn load_graph(config: &FlowConfig, path: &str) -> Graph {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read graph file '{}': {}", path, e)));
    config
        .normalizer()
        .normalize_str(&json)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn run_validate(config: &FlowConfig, graph_path: &str) {
    let graph = load_graph(config, graph_path);
    let report = config.validator().validate(&graph);
    let rendered = serde_json::to_string_pretty(&report.to_json())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render report: {}", e)));
    println!("{}", rendered);
    if !report.is_valid() {
        std::process::exit(1);
    }
}

fn run_session(config: &FlowConfig, graph_path: &str, answers_path: Option<&str>, interactive: bool) {
    let graph = Arc::new(load_graph(config, graph_path));
    let interpreter = config.interpreter();
    let script = answers_path.map(load_script);
    if script.is_none() && !interactive {
        exit_with_error("Either --answers or --interactive is required to run a session.");
    }

    let mut session = interpreter
        .start_session(graph)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let mut position = 0;

    while !interpreter.is_complete(&session) {
        let block = interpreter
            .current_block(&session)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()))
            .clone();
        print_block(&block);

        let answer = match &script {
            Some(script) => scripted_answer(script, &block, &mut position),
            None => prompt_for_answer(&block),
        };

        match interpreter.submit_answer(&session, &answer) {
            Ok(next) => session = next,
            Err(e @ SessionError::InvalidAnswer { .. }) if interactive => {
                println!("  !! {}", e);
            }
            Err(e) => exit_with_error(&e.to_string()),
        }
    }

    if let Ok(block) = interpreter.current_block(&session) {
        print_block(block);
    }
    print_summary(&interpreter, &session);
}

fn load_script(path: &str) -> AnswerScript {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read answers file '{}': {}", path, e)));
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse answers JSON: {}", e)))
}

fn scripted_answer(script: &AnswerScript, block: &Block, position: &mut usize) -> Value {
    // Messages only need an acknowledgement and never consume a scripted answer.
    if matches!(block.kind, BlockKind::Message) {
        return Value::Null;
    }
    let answer = match script {
        AnswerScript::Sequence(answers) => {
            let answer = answers.get(*position);
            *position += 1;
            answer
        }
        AnswerScript::ByBlock(answers) => answers.get(&block.id),
    };
    match answer {
        Some(answer) => {
            println!("  <- {}", answer);
            Value::from(answer.clone())
        }
        None => exit_with_error(&format!("No scripted answer for block '{}'", block.id)),
    }
}

fn print_block(block: &Block) {
    println!("\n[{}] ({})", block.id, block.kind);
    if let Some(prompt) = &block.prompt {
        println!("  {}", prompt);
    }
    if let Some(options) = block.kind.options() {
        for option in options {
            println!("    - {}: {}", option.id, option.label);
        }
    }
}

fn print_summary(interpreter: &Interpreter, session: &Session) {
    let variables: serde_json::Map<String, serde_json::Value> = session
        .variables()
        .iter()
        .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
        .collect();

    println!("\n--- Session Summary ---");
    println!("Session:   {}", session.session_id());
    println!("Path:      {}", session.history().join(" -> "));
    println!("Progress:  {:.0}%", interpreter.progress(session) * 100.0);
    println!(
        "Variables: {}",
        serde_json::to_string_pretty(&variables).unwrap_or_default()
    );
}

/// Reads one answer from stdin, shaped for the block kind.
fn prompt_for_answer(block: &Block) -> Value {
    match &block.kind {
        BlockKind::Message => {
            prompt_for_input("Press enter to continue", None);
            Value::Null
        }
        BlockKind::MultiChoice { .. } => {
            let line = prompt_for_input("Choose options (comma separated)", None);
            Value::List(
                line.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Value::from)
                    .collect(),
            )
        }
        BlockKind::ContactForm { .. } | BlockKind::Demographics { .. } => {
            let line = prompt_for_input("Enter the form as a JSON object", Some("{}"));
            serde_json::from_str::<serde_json::Value>(&line)
                .map(Value::from)
                .unwrap_or(Value::Text(line))
        }
        _ => Value::Text(prompt_for_input("Answer", None)),
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().expect("Failed to flush stdout");

    let read = io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    if read == 0 {
        exit_with_error("Input closed before the survey was completed.");
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

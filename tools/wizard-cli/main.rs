use clap::{Parser, Subcommand};
use sentaku::error::display_path;
use sentaku::logging::init_logging;
use sentaku::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Walk, inspect and debug wizard decision trees and sessions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "sentaku.toml")]
    config: PathBuf,

    /// Tree source to use instead of the configured one
    #[arg(short, long)]
    tree: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate the tree, then list every profile it reaches
    Validate,
    /// Show the options offered at a path
    Options { path: Vec<String> },
    /// Resolve a path to its profile, following default continuations
    Resolve { path: Vec<String> },
    /// Write the compiled tree cache
    Cache {
        /// Output file (defaults to the configured cache path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Work with stored sessions
    #[command(subcommand)]
    Session(SessionCommand),
    /// Walk a new session interactively
    #[command(short_flag = 'i')]
    Walk,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a new session
    New,
    /// Show a session
    Show { id: SessionId },
    /// Choose an option
    Choose { id: SessionId, key: String },
    /// Undo the last choice
    Back { id: SessionId },
    /// Merge inputs, given as KEY=VALUE (VALUE is parsed as JSON when it can be)
    Set {
        id: SessionId,
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Submit a complete session to the configured run directory
    Submit { id: SessionId },
}

fn main() {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(&cli.config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e)));
    if let Some(tree) = &cli.tree {
        config.tree_path = tree.clone();
    }
    init_logging(&config.logging);

    match cli.command {
        Command::Validate => run_validate(&config, cli.json),
        Command::Options { path } => run_options(&config, &path, cli.json),
        Command::Resolve { path } => run_resolve(&config, &path, cli.json),
        Command::Cache { out } => run_cache(&config, out),
        Command::Session(command) => run_session(&config, command, cli.json),
        Command::Walk => run_interactive(&config),
    }
}

fn load_tree(config: &WizardConfig) -> DecisionTree {
    config.load_tree().unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load tree '{}': {}",
            config.tree_path.display(),
            e
        ))
    })
}

fn build_service(config: &WizardConfig) -> WizardSessionService<Box<dyn SessionStore>> {
    let tree = Arc::new(load_tree(config));
    let store = open_store(config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to open session store: {}", e)));
    WizardSessionService::new(tree, store)
}

fn run_validate(config: &WizardConfig, json: bool) {
    let tree = load_tree(config);
    let profiles = tree.profiles();

    if json {
        let listing: Vec<_> = profiles
            .iter()
            .map(|(path, profile)| serde_json::json!({ "path": path, "profile": profile }))
            .collect();
        print_json(&serde_json::json!({ "nodes": tree.len(), "profiles": listing }));
        return;
    }

    println!(
        "Tree '{}' is valid: {} nodes, {} profiles",
        config.tree_path.display(),
        tree.len(),
        profiles.len()
    );
    for (path, profile) in &profiles {
        println!("  {:<32} -> {}", display_path(path), profile);
    }
}

fn run_options(config: &WizardConfig, path: &[String], json: bool) {
    let tree = load_tree(config);
    let options = tree
        .options_at(path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let specializations = tree
        .specializations_at(path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "options": options,
            "specializations": specializations,
        }));
        return;
    }

    println!("Options at {}:", display_path(path));
    if options.is_empty() && specializations.is_empty() {
        println!("  (none)");
    }
    for option in &options {
        println!("  {}", option);
    }
    for specialization in &specializations {
        println!("  {} (specialization)", specialization);
    }
}

fn run_resolve(config: &WizardConfig, path: &[String], json: bool) {
    let tree = load_tree(config);
    let resolution = tree
        .resolve_profile(path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if json {
        print_json(&resolution);
        return;
    }

    println!("Path:    {}", display_path(&resolution.path));
    match &resolution.profile {
        Some(profile) => println!("Profile: {}", profile),
        None => println!("Profile: (none resolved)"),
    }
}

fn run_cache(config: &WizardConfig, out: Option<PathBuf>) {
    let out = out
        .or_else(|| config.tree_cache_path.clone())
        .unwrap_or_else(|| exit_with_error("No output path given and no tree_cache_path configured."));
    let tree = DecisionTree::compile_cache(&config.tree_path, &out)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write cache: {}", e)));
    println!("Wrote compiled tree ({} nodes) to '{}'", tree.len(), out.display());
}

fn run_session(config: &WizardConfig, command: SessionCommand, json: bool) {
    let service = build_service(config);

    let session = match command {
        SessionCommand::New => service.create(),
        SessionCommand::Show { id } => service.get(id),
        SessionCommand::Choose { id, key } => service.choose(id, &key),
        SessionCommand::Back { id } => service.back(id),
        SessionCommand::Set { id, inputs } => service.set_inputs(id, parse_inputs(&inputs)),
        SessionCommand::Submit { id } => {
            let sink = RunDirectorySink::from_config(&config.jobs);
            let receipt = service
                .submit(id, &sink)
                .unwrap_or_else(|e| exit_with_wizard_error(&e, json));
            if json {
                print_json(&receipt);
            } else {
                println!("Submitted session {} as job {}", receipt.session_id, receipt.job.id);
                if let Some(location) = &receipt.job.location {
                    println!("  -> Run directory: {}", location.display());
                }
            }
            return;
        }
    };

    let session = session.unwrap_or_else(|e| exit_with_wizard_error(&e, json));
    print_view(&service, &session, json);
}

fn print_view<S: SessionStore>(service: &WizardSessionService<S>, session: &WizardSession, json: bool) {
    let view = service
        .describe(session)
        .unwrap_or_else(|e| exit_with_wizard_error(&e, json));
    if json {
        print_json(&view);
    } else {
        println!("{}", ViewFormatter::format_view(&view));
    }
}

/// Parses `KEY=VALUE` pairs. Values that are valid JSON keep their type.
fn parse_inputs(pairs: &[String]) -> Inputs {
    let mut inputs = Inputs::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .unwrap_or_else(|| exit_with_error(&format!("Expected KEY=VALUE, got '{}'", pair)));
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        inputs.insert(key.trim().to_string(), value);
    }
    inputs
}

/// Runs a session from the root with prompts until it is submitted or abandoned.
fn run_interactive(config: &WizardConfig) {
    println!("--- Sentaku Interactive Mode ---");
    println!("Type an option to choose it, '<' to go back, 'set KEY=VALUE' to add inputs,");
    println!("'submit' to submit and 'quit' to leave. The session is kept in the store.\n");

    let service = build_service(config);
    let mut session = service
        .create()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    loop {
        print_view(&service, &session, false);
        println!();

        let line = prompt_for_input("Next", None);
        let result = match line.as_str() {
            "" => continue,
            "quit" | "q" => {
                println!("Session {} left as {}.", session.id(), session.status());
                return;
            }
            "<" | "back" => service.back(session.id()),
            "submit" => {
                let sink = RunDirectorySink::from_config(&config.jobs);
                match service.submit(session.id(), &sink) {
                    Ok(receipt) => {
                        println!("\nSubmitted as job {}.", receipt.job.id);
                        if let Some(location) = &receipt.job.location {
                            println!("  -> Run directory: {}", location.display());
                        }
                        return;
                    }
                    Err(e) => Err(e),
                }
            }
            other => match other.strip_prefix("set ") {
                Some(pairs) => {
                    let pairs: Vec<String> = pairs.split_whitespace().map(str::to_string).collect();
                    service.set_inputs(session.id(), parse_inputs(&pairs))
                }
                None => service.choose(session.id(), other),
            },
        };

        match result {
            Ok(updated) => session = updated,
            Err(e) => println!("\n{}\n", e),
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize output: {}", e)));
    println!("{}", json);
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if let Err(e) = io::stdout().flush() {
        exit_with_error(&format!("Failed to write prompt: {}", e));
    }

    let read = io::stdin()
        .read_line(&mut line)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read line: {}", e)));
    if read == 0 {
        exit_with_error("Input closed.");
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_wizard_error(error: &WizardError, json: bool) -> ! {
    if json {
        if let Ok(body) = serde_json::to_string_pretty(&error.body()) {
            println!("{}", body);
        }
        std::process::exit(1);
    }
    exit_with_error(&error.to_string())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tinylang::config::EngineConfig;
use tinylang::error::Error;
use tinylang::lang::{Language, Output};
use tinylang::task::{TaskError, TaskSuite};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file; defaults apply when the file does not exist
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and execute a program
    Run(RunArgs),

    /// Run a benchmark task suite and report accuracy
    Tasks(TasksArgs),

    /// List the available languages
    Langs,
}

#[derive(Parser)]
struct RunArgs {
    /// Language to interpret the source as
    language: String,

    /// Path to the source file; use --code for inline source
    file: Option<PathBuf>,

    /// Inline source code
    #[arg(short = 'e', long)]
    code: Option<String>,

    /// Emit shapes and text as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct TasksArgs {
    /// Language the task codes are written in
    language: String,

    /// Path to the tasks JSON file
    tasks: PathBuf,

    /// Evaluate a single task by id
    #[arg(short, long)]
    task: Option<String>,

    /// Fuzzy matching instead of exact comparison
    #[arg(long)]
    fuzzy: bool,

    /// Similarity threshold for fuzzy matching
    #[arg(long, default_value_t = 0.9)]
    threshold: f64,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Error> {
    if cli.config.exists() {
        EngineConfig::from_file(&cli.config)
    } else {
        Ok(EngineConfig::default())
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Commands::Run(args) => run_program(cli, args),
        Commands::Tasks(args) => run_tasks(cli, args),
        Commands::Langs => {
            for language in Language::iter() {
                println!("{}", language);
            }
            Ok(())
        }
    }
}

fn run_program(cli: &Cli, args: &RunArgs) -> Result<(), Error> {
    let source = match (&args.code, &args.file) {
        (Some(code), _) => code.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|err| Error::config(format!("cannot read {}: {}", path.display(), err)))?,
        (None, None) => return Err(Error::config("either a source file or --code is required")),
    };

    let language = Language::parse(&args.language)?;
    let mut engine = load_config(cli)?.engine()?;
    let output = engine.run(language, &source)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .map_err(|err| Error::config(err.to_string()))?
        );
        return Ok(());
    }

    match output {
        Output::Text(text) => println!("{}", text),
        Output::Shapes(shapes) => {
            for shape in shapes {
                println!("{}", shape);
            }
        }
    }
    Ok(())
}

fn run_tasks(cli: &Cli, args: &TasksArgs) -> Result<(), Error> {
    let language = Language::parse(&args.language)?;
    let config = load_config(cli)?;
    let mut engine = config.engine()?;

    let mut suite = TaskSuite::from_file(&args.tasks)?;
    if let Some(id) = &args.task {
        let task = suite
            .get(id)
            .cloned()
            .ok_or_else(|| TaskError::UnknownTask(id.clone()))?;
        suite = TaskSuite::new(vec![task]);
    }

    let matcher = if args.fuzzy {
        tinylang::task::Matcher::Fuzzy {
            threshold: args.threshold,
        }
    } else {
        config.matcher()
    };

    let report = suite.evaluate(&mut engine, language, matcher);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).map_err(|err| Error::config(err.to_string()))?
    );
    Ok(())
}

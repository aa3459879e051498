use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand};
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use wick::ast_printer::AstPrinter;
use wick::diagnostics::ErrorReporter;
use wick::interpreter::Options;
use wick::parser::Parser;
use wick::scanner::{scan_tokens, Scanner};
use wick::session::Session;

/// Interpreter threads get a generous stack: evaluation recurses per call.
const STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Wick language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to wick.log (level from RUST_LOG, default debug)
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the statements as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a file holding a single expression and prints the result
    Evaluate(RunArgs),

    /// Runs a file as a Wick program
    Run(RunArgs),

    /// Reads and runs programs line by line from stdin
    Repl {
        #[command(flatten)]
        limits: Limits,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    filename: PathBuf,

    #[command(flatten)]
    limits: Limits,
}

#[derive(Args, Debug, Clone, Copy)]
struct Limits {
    /// Deepest allowed call nesting
    #[arg(long, default_value_t = Options::default().max_call_depth)]
    max_call_depth: usize,
}

impl From<Limits> for Options {
    fn from(limits: Limits) -> Self {
        Options {
            max_call_depth: limits.max_call_depth,
        }
    }
}

/// Maps a source file and decodes it as UTF-8.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename)
        .with_context(|| format!("Failed to open file {:?}", filename))?;

    // SAFETY: the map is read once, immediately copied, and dropped.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let source: String = std::str::from_utf8(&map)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("wick.log").context("Failed to create wick.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'wick::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("wick::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to wick.log");

    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source: String = read_source(filename)?;

    if json {
        let mut reporter = ErrorReporter::stderr();
        let tokens = scan_tokens(&source, 1, &mut reporter);

        println!("{}", serde_json::to_string_pretty(&tokens)?);

        return Ok(if reporter.had_static_errors() { 65 } else { 0 });
    }

    let mut tokenized: bool = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { 65 })
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    let source: String = read_source(filename)?;

    let mut reporter = ErrorReporter::stderr();
    let tokens = scan_tokens(&source, 1, &mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else if !statements.is_empty() {
        println!("{}", AstPrinter::print_program(&statements));
    }

    Ok(if reporter.had_static_errors() { 65 } else { 0 })
}

fn evaluate(args: &RunArgs) -> Result<i32> {
    let source: String = read_source(&args.filename)?;

    let mut session = Session::new(args.limits.into());
    let (value, report) = session.evaluate(&source);

    if let Some(value) = value {
        debug!("Evaluated to: {}", value);

        println!("{}", value);
    }

    Ok(report.exit_code())
}

fn run(args: &RunArgs) -> Result<i32> {
    let source: String = read_source(&args.filename)?;

    info!("Provided input:\n {}", source);

    let mut session = Session::new(args.limits.into());

    Ok(session.run(&source).exit_code())
}

fn repl(limits: Limits) -> Result<i32> {
    let mut session = Session::new(limits.into());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };

        let report = session.run(&line?);
        debug!("REPL line finished: {:?}", report);
    }

    Ok(0)
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),

        Commands::Parse { filename, json } => parse(&filename, json),

        Commands::Evaluate(args) => evaluate(&args),

        Commands::Run(args) => run(&args),

        Commands::Repl { limits } => repl(limits),
    }
}

fn main() -> Result<()> {
    let cli: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if cli.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", cli);

    let code: i32 = std::thread::Builder::new()
        .name("wick".into())
        .stack_size(STACK_SIZE)
        .spawn(move || dispatch(cli))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    if code != 0 {
        debug!("Exiting with code {}", code);

        std::process::exit(code);
    }

    Ok(())
}

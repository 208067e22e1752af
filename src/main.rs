// Stepwise: step-through interpreter for a small teaching language

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use stepwise::interpreter::{self, Limits};
use stepwise::parser;
use stepwise::snapshot::{prepare, Navigator, Outcome, Phase, StdConsole, Trace};
use stepwise::ui::App;

#[derive(Parser, Debug)]
#[command(
    name = "stepwise",
    version,
    about = "Record a program's evaluation and step through it"
)]
struct Cli {
    /// Source file to run
    file: PathBuf,

    /// Iteration ceiling for each loop
    #[arg(long = "max-iterations", default_value_t = interpreter::constants::DEFAULT_MAX_LOOP_ITERATIONS)]
    max_iterations: usize,

    /// Maximum user function call depth
    #[arg(long = "max-depth", default_value_t = interpreter::constants::DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Maximum number of node visits in one pass
    #[arg(long = "max-steps", default_value_t = interpreter::constants::DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Print the recorded trace instead of opening the viewer
    #[arg(long, conflicts_with = "run")]
    dump: bool,

    /// Evaluate without recording and print the program's output
    #[arg(long)]
    run: bool,
}

/// Install a stderr subscriber, only when RUST_LOG asks for one
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.file)
        .map_err(|err| format!("cannot read '{}': {}", cli.file.display(), err))?;
    let limits = Limits::default()
        .with_max_loop_iterations(cli.max_iterations)
        .with_max_call_depth(cli.max_depth)
        .with_max_steps(cli.max_steps);

    if cli.run {
        return run_headless(&source, &limits);
    }

    let trace = match prepare(&source, &limits) {
        Ok(trace) => trace,
        Err(err) => {
            eprintln!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.dump {
        dump_trace(&trace);
        return Ok(exit_code(trace.outcome()));
    }

    let code = exit_code(trace.outcome());
    run_viewer(Navigator::new(trace), source)?;
    Ok(code)
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    match outcome {
        Outcome::Completed(_) => ExitCode::SUCCESS,
        Outcome::Halted(_) => ExitCode::FAILURE,
    }
}

fn run_headless(source: &str, limits: &Limits) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(errors) => {
            for err in errors {
                eprintln!("{}", err);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut console = StdConsole;
    match interpreter::run(&program, &mut console, limits) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("Runtime error: {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn dump_trace(trace: &Trace) {
    for record in trace.records() {
        let indent = "  ".repeat(record.depth);
        let marker = match record.phase {
            Phase::Before => ">",
            Phase::After => "<",
        };
        let detail = match (&record.error, &record.result) {
            (Some(err), _) => format!(" !! {}", err),
            (None, Some(value)) => format!(" = {}", value.repr()),
            (None, None) => String::new(),
        };
        println!(
            "{:>6} {}{} {} @{}{}",
            record.seq, indent, marker, record.node.kind, record.node.span.start, detail
        );
    }

    if !trace.console().is_empty() {
        println!("--- console ---");
        for line in trace.console() {
            println!("[{}] {}", line.level, line.text);
        }
    }
    match trace.outcome() {
        Outcome::Completed(value) => println!("--- completed: {} ---", value.repr()),
        Outcome::Halted(err) => println!("--- halted: {} ---", err),
    }
}

fn run_viewer(navigator: Navigator, source: String) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(navigator, source);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }
    Ok(())
}

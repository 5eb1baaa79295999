use clap::{Parser as ClapParser, Subcommand};
use filtrate::cli::{self, CliError, CompileFormat, CompileOptions, EvalOptions, EvalResult};
use filtrate::logging::{self, LogLevel};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "filtrate")]
#[command(about = "filtrate - compile and evaluate filter expressions against JSON records")]
#[command(version)]
struct Cli {
    /// Diagnostics written to stderr
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a JSON record
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON record (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only check that the expression compiles
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the compiled program for an expression
    Compile {
        /// The expression to compile
        expression: String,

        /// Print the serialized program instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// List the built-in functions
    Functions,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            pretty,
            syntax_only,
        } => run_eval(expression, input, pretty, syntax_only),
        Commands::Compile { expression, json } => {
            let format = if json { CompileFormat::Json } else { CompileFormat::Listing };
            cli::execute_compile(&CompileOptions { expression, format }).map(|out| print!("{}", out))
        }
        Commands::Functions => {
            print!("{}", cli::list_functions());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    expression: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        input,
        pretty,
        syntax_only,
    };

    match cli::execute_eval(&options)? {
        EvalResult::SyntaxValid => println!("Syntax is valid"),
        EvalResult::Success(output) => println!("{}", output),
    }
    Ok(())
}

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;
use pgex_script::{DEFAULT_MAX_DEPTH, Interpreter, Lexer, ScriptError};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Deepest nesting of signs and parentheses the parser accepts
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Echo each script to stderr before processing it
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every token of the script
    Tokenize(Input),
    /// Print the syntax tree of the script
    Parse(Input),
    /// Print the value of the script
    Evaluate(Input),
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    filename: Option<PathBuf>,

    /// Script given inline instead of a file
    #[arg(short, long)]
    expression: Option<String>,
}

impl Input {
    fn load(self, verbose: bool) -> miette::Result<(String, String)> {
        let (name, script) = match (self.filename, self.expression) {
            (_, Some(expression)) => ("<expression>".to_string(), expression),
            (Some(filename), None) => {
                let file_contents = fs::read_to_string(&filename)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;
                let script = file_contents.trim_end_matches(['\r', '\n']).to_string();
                (filename.display().to_string(), script)
            }
            (None, None) => return Err(miette::miette!("no script given")),
        };
        if verbose {
            eprintln!("Loaded Script: {script}");
        }
        Ok((name, script))
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Tokenize(input) => {
            let (name, script) = input.load(args.verbose)?;
            for token in Lexer::new(Some(&name), &script) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => fail(e),
                }
            }
            println!("EOF  null");
        }
        Commands::Parse(input) => {
            let (name, script) = input.load(args.verbose)?;
            let lexer = Lexer::new(Some(&name), &script);
            match pgex_script::Parser::with_max_depth(lexer, args.max_depth).parse() {
                Ok(tree) => println!("{tree}"),
                Err(e) => fail(e),
            }
        }
        Commands::Evaluate(input) => {
            let (name, script) = input.load(args.verbose)?;
            let lexer = Lexer::new(Some(&name), &script);
            let parser = pgex_script::Parser::with_max_depth(lexer, args.max_depth);
            match Interpreter::from(parser).run() {
                Ok(value) => println!("{value}"),
                Err(e) => fail(e),
            }
        }
    }
    Ok(())
}

fn fail(error: ScriptError) -> ! {
    let code = if error.is_runtime() { 70 } else { 65 };
    eprintln!("{:?}", miette::Report::new(error));
    std::process::exit(code);
}

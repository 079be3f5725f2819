use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use ktjc::ast::DeclPrinter;
use ktjc::parser::{parse_file, TokenCursor};
use ktjc::session::{DirectorySink, Session};
use ktjc::Config;

#[derive(Parser)]
#[command(name = "ktjc")]
#[command(about = "ktj Language Compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .ktj file to .class files
    Compile {
        /// Input .ktj file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Source root; the path below it gives the package
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Output directory for .class files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Emit the SourceFile attribute
        #[arg(short = 'g', long)]
        debug: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a .ktj file and show its declarations
    Parse {
        /// Input .ktj file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show the full declaration structures
        #[arg(short, long)]
        detailed: bool,
    },

    /// Tokenize a .ktj file
    Lex {
        /// Input .ktj file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::Compile { verbose: true, .. });
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if verbose { "info" } else { "warn" }))
        .init();

    match &cli.command {
        Commands::Compile { input, root, output, debug, .. } => {
            compile_file(input, root.as_deref(), output.as_deref(), *debug)?;
        }
        Commands::Parse { input, detailed } => {
            show_declarations(input, *detailed)?;
        }
        Commands::Lex { input } => {
            lex_file(input)?;
        }
    }

    Ok(())
}

fn read_source(input: &Path) -> Result<String> {
    if input.extension().and_then(|e| e.to_str()) != Some("ktj") {
        bail!("{} is not a .ktj file", input.display());
    }
    fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))
}

/// Path of `input` relative to the source root, which defaults to its directory.
fn relative_path(input: &Path, root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => input
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .with_context(|| format!("{} is not below source root {}", input.display(), root.display())),
        None => input.file_name().map(PathBuf::from).context("input has no file name"),
    }
}

fn compile_file(input: &Path, root: Option<&Path>, output: Option<&Path>, debug: bool) -> Result<()> {
    let source = read_source(input)?;
    let relative = relative_path(input, root)?;
    let output_dir = output.unwrap_or_else(|| Path::new("."));

    let mut session = Session::new(Config::default().with_debug(debug));
    let mut sink = DirectorySink::new(output_dir);
    let count = session.compile_into(&relative, &source, &mut sink)?;
    log::info!("{} class file(s) written to {}", count, output_dir.display());
    Ok(())
}

fn show_declarations(input: &Path, detailed: bool) -> Result<()> {
    let source = read_source(input)?;
    let relative = relative_path(input, None)?;
    let parsed = parse_file(&relative, &source)?;

    let mut printer = DeclPrinter::new();
    for decl in &parsed.declarations {
        if detailed {
            println!("{:#?}", decl);
        } else {
            print!("{}", printer.print(decl));
        }
    }
    Ok(())
}

fn lex_file(input: &Path) -> Result<()> {
    let source = read_source(input)?;
    let mut cursor = TokenCursor::new(input, &source)?;
    while let Some(line) = cursor.take_line() {
        for token in &line.tokens {
            println!("{}:{} {:?} '{}'", line.number, token.column, token.kind, token.text);
        }
    }
    Ok(())
}

//! Quarry - read data out of self-describing products.
//!
//! # Usage
//!
//! ```bash
//! quarry fetch product.json records -1 x
//! quarry size product.json matrix
//! quarry eval 'numelements(temps)' product.json
//! quarry --option SwapDimensions=0 fetch product.json cube 1,-1,2
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use common_config::QuarryConfig;
use common_error::QuarryResult;
use quarry_core::HostValue;
use quarry_engine::Engine;

use quarry_cli::{parse_option, parse_selectors, product_info, render};

/// Quarry CLI.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Resolve paths in self-describing products and print the data as JSON")]
#[command(version)]
struct Args {
    /// JSON file with engine and storage options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Option assignment such as SwapDimensions=0 (repeatable)
    #[arg(short, long = "option", global = true)]
    options: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the data item named by the selectors
    Fetch {
        /// Product file
        file: PathBuf,

        /// Field names, indices (-1 for all) and index vectors such as 1,-1
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        selectors: Vec<String>,
    },

    /// List the field names of a record
    Fields {
        file: PathBuf,

        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        selectors: Vec<String>,
    },

    /// Print the dimensions of an array
    Size {
        file: PathBuf,

        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        selectors: Vec<String>,
    },

    /// Evaluate an expression at a position in a product
    Eval {
        /// Expression source
        expression: String,

        /// Product file
        file: PathBuf,

        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        selectors: Vec<String>,
    },

    /// Print product class, type, version and top-level fields
    Info {
        file: PathBuf,
    },
}

fn main() -> QuarryResult<()> {
    let args = Args::parse();
    let mut engine = build_engine(args.config.as_deref(), &args.options)?;

    let value = match &args.command {
        Commands::Fetch { file, selectors } => {
            let call = open_with(&mut engine, file, selectors)?;
            engine.fetch(&call)?
        }
        Commands::Fields { file, selectors } => {
            let call = open_with(&mut engine, file, selectors)?;
            engine.field_names(&call)?
        }
        Commands::Size { file, selectors } => {
            let call = open_with(&mut engine, file, selectors)?;
            engine.size(&call)?
        }
        Commands::Eval {
            expression,
            file,
            selectors,
        } => {
            let call = open_with(&mut engine, file, selectors)?;
            engine.eval(expression, &call)?
        }
        Commands::Info { file } => {
            let handle = engine.open(file)?;
            let info = product_info(&engine, handle.0 as i64)?;
            let text = if args.pretty {
                serde_json::to_string_pretty(&info)?
            } else {
                serde_json::to_string(&info)?
            };
            println!("{text}");
            return Ok(());
        }
    };

    println!("{}", render(&value, args.pretty)?);
    Ok(())
}

fn build_engine(config: Option<&Path>, options: &[String]) -> QuarryResult<Engine> {
    let config = match config {
        Some(path) => QuarryConfig::from_json_file(path)?,
        None => QuarryConfig::default(),
    };
    let mut engine = Engine::with_config(config);
    for assignment in options {
        let (name, value) = parse_option(assignment)?;
        engine.setopt(&name, value)?;
    }
    log::debug!("engine configured: {:?}", engine.config());
    Ok(engine)
}

/// Open `file` and build the argument list `[product, selectors...]`.
fn open_with(engine: &mut Engine, file: &Path, selectors: &[String]) -> QuarryResult<Vec<HostValue>> {
    let handle = engine.open(file)?;
    let mut call = vec![HostValue::from(handle.0 as i64)];
    call.extend(parse_selectors(selectors));
    Ok(call)
}

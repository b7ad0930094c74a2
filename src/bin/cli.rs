//! flatstore CLI
//!
//! Command-line interface for poking at a flatstore database: insert
//! documents, run filtered queries, count and delete.

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use flatstore::{Config, GetOptions, Record, Store};

/// flatstore CLI
#[derive(Parser, Debug)]
#[command(name = "flatstore-cli")]
#[command(about = "CLI for the flatstore document store")]
struct Args {
    /// Database root directory
    #[arg(short, long, default_value = "./flatstore_data")]
    root: String,

    /// Table to operate on
    #[arg(short, long, default_value = "default")]
    table: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert one document (JSON object) or many (JSON array of objects)
    Insert {
        /// The document(s) as a JSON string
        json: String,
    },

    /// Fetch documents, optionally filtered by field=value
    Get {
        /// Filter, e.g. name=alice or age=30
        #[arg(short, long)]
        filter: Option<String>,

        /// Field to sort by
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        reverse: bool,

        /// Skip this many matches
        #[arg(long)]
        from: Option<usize>,

        /// Return at most this many matches
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Count documents matching field=value (or all)
    Count {
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Delete documents matching field=value
    Delete {
        filter: String,
    },

    /// Fetch documents uniformly at random, without replacement
    Random {
        /// Number of documents to draw
        #[arg(short, long, default_value_t = 1)]
        limit: usize,

        #[arg(short, long)]
        filter: Option<String>,
    },
}

/// Parse a `field=value` filter; the value side is parsed as JSON when
/// possible, and falls back to a plain string.
fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{}', expected field=value", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

/// Build a match-all or field=value predicate from an optional filter
fn predicate(filter: Option<&str>) -> Result<impl Fn(&Record, &Value) -> bool, String> {
    let parsed = filter.map(parse_filter).transpose()?;
    Ok(move |record: &Record, _aux: &Value| match &parsed {
        Some((field, value)) => record.get(field) == Some(value),
        None => true,
    })
}

fn print_records(records: &[Record]) -> serde_json::Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().root_dir(args.root).table(args.table).build();
    let store = Store::open(config)?;

    match args.command {
        Commands::Insert { json } => {
            let parsed: Value = serde_json::from_str(&json)?;
            let records: Vec<Record> = match parsed {
                Value::Object(map) => vec![map],
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map),
                        other => Err(format!("not a JSON object: {}", other)),
                    })
                    .collect::<Result<_, _>>()?,
                other => return Err(format!("not a JSON object or array: {}", other).into()),
            };
            let count = records.len();
            store.insert(&records)?;
            println!("inserted {} document(s)", count);
        }

        Commands::Get {
            filter,
            sort,
            reverse,
            from,
            limit,
        } => {
            let mut options = GetOptions {
                sort_field: sort,
                reverse,
                from,
                limit,
                query_data: None,
            };
            if options.sort_field.is_none() {
                options.reverse = false;
            }
            let results = store.get(predicate(filter.as_deref())?, options)?;
            print_records(&results)?;
        }

        Commands::Count { filter } => {
            let count = store.count(predicate(filter.as_deref())?, None)?;
            println!("{}", count);
        }

        Commands::Delete { filter } => {
            let removed = store.delete(predicate(Some(&filter))?, None)?;
            println!("{}", if removed { "deleted" } else { "no match" });
        }

        Commands::Random { limit, filter } => {
            let results = store.get_random(predicate(filter.as_deref())?, None, limit)?;
            print_records(&results)?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

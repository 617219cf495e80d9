use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use md77_reader::md77::dump::write_outline;
use md77_reader::md77::text::decode_cp1251;
use md77_reader::{MdReader, MetadataTree, Node, ReaderOptions, StorageEntry, DEFAULT_METADATA_STREAM};

/// Inspect 1C:Enterprise 7.7 metadata containers.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to the container file (usually 1Cv7.md).
    file: PathBuf,

    /// Path of the metadata stream inside the container.
    #[arg(long, default_value = DEFAULT_METADATA_STREAM)]
    metadata_stream: String,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the streams and storages of the container.
    Tree,
    /// Print the decoded text of one stream.
    Cat {
        /// Backslash-separated stream path, e.g. "Metadata\Main MetaData Stream".
        stream: String,
    },
    /// Dump the annotated metadata tree.
    Dump {
        /// Only dump the object with this id.
        #[arg(long)]
        object: Option<String>,
    },
    /// Print the metadata tree as captions, the way a tree view shows it.
    Outline {
        /// Stop descending below this depth.
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
    /// Print the object type and field reference indices.
    Index,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> md77_reader::Result<()> {
    let options = ReaderOptions {
        metadata_stream: cli.metadata_stream,
    };
    let mut reader = MdReader::open(&cli.file, options)?;

    match cli.command {
        Command::Tree => print_entries(reader.entries(), 0),
        Command::Cat { stream } => println!("{}", reader.read_stream_text(&stream)?),
        Command::Dump { object } => {
            let tree = reader.load_metadata()?;
            match object {
                Some(id) => match tree.dump_object(id.as_bytes()) {
                    Some(text) => print!("{}", text),
                    None => {
                        eprintln!("No object with id {}", id);
                        process::exit(2);
                    }
                },
                None => print!("{}", tree.dump()),
            }
        }
        Command::Outline { depth } => print_outline(reader.load_metadata()?.root(), depth),
        Command::Index => print_indices(reader.load_metadata()?),
    }
    Ok(())
}

fn print_entries(entries: &[StorageEntry], depth: usize) {
    for entry in entries {
        let indent = "  ".repeat(depth);
        if entry.is_container {
            println!("{}[{}]", indent, entry.name);
            print_entries(&entry.children, depth + 1);
        } else {
            println!("{}{} ({} bytes)", indent, entry.name, entry.size);
        }
    }
}

fn print_outline(root: &Node, max_depth: usize) {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_outline(root, max_depth, &mut out);
    print!("{}", out);
}

fn print_indices(tree: &MetadataTree) {
    let indices = tree.indices();

    println!("Objects: {}", indices.types.len());
    println!("{}", "=".repeat(60));
    for (id, tag) in &indices.types {
        let name = tree
            .object(id)
            .and_then(|object| object.child(1))
            .map(|name| decode_cp1251(name.value()).into_owned())
            .unwrap_or_default();
        println!("  {} {} {}", tag, decode_cp1251(id), name);
    }

    println!("\nField references: {}", indices.references.len());
    println!("{}", "=".repeat(60));
    for (field, target) in &indices.references {
        let target_type = indices
            .type_of(target)
            .map(|tag| format!(" ({})", tag))
            .unwrap_or_default();
        println!(
            "  {} -> {}{}",
            decode_cp1251(field),
            decode_cp1251(target),
            target_type
        );
    }
}

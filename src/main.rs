use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

use plsql2pg::semantic::TransformationContext;
use plsql2pg::{decompose_containers, transform_select, ContainerArtifacts, TransformError};

#[derive(Parser)]
#[command(name = "plsql2pg")]
#[command(author, version, about = "Oracle to PostgreSQL schema and code transformation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose package/type bodies into unit stubs and reduced skeletons
    Segment {
        /// A container source file, or a directory of .pkb/.tpb/.sql files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for stub/reduced artifacts (report-only when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Transform a SELECT fragment into PostgreSQL text (reads stdin when no file given)
    Transform {
        /// File holding the SQL fragment
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Schema context for name resolution
        #[arg(short, long, default_value = "public")]
        schema: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            input,
            output,
            verbose,
        } => run_segment(&input, output.as_deref(), verbose),
        Commands::Transform { input, schema } => run_transform(input.as_deref(), &schema),
    }
}

/// Extensions treated as container sources when scanning a directory.
const CONTAINER_EXTENSIONS: [&str; 3] = ["pkb", "tpb", "sql"];

fn run_segment(input: &Path, output: Option<&Path>, verbose: bool) -> Result<()> {
    let files = collect_container_files(input)?;
    if files.is_empty() {
        anyhow::bail!("no container sources found under {}", input.display());
    }
    if verbose {
        println!("Found {} container file(s)", files.len());
    }

    let containers: Vec<(String, String)> = files
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("container")
                .to_string();
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((name, source))
        })
        .collect::<Result<Vec<_>>>()?;

    let results = decompose_containers(&containers);

    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(artifacts) => {
                report_container(&artifacts, verbose);
                if let Some(dir) = output {
                    write_artifacts(dir, &artifacts)?;
                }
            }
            Err(TransformError::StructuralScan {
                container,
                position,
                message,
            }) => {
                // Structural failures skip the container, the batch continues
                eprintln!("skipping {container}: scan failed at offset {position}: {message}");
                failures += 1;
            }
            Err(err) => {
                eprintln!("error: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} container(s) failed");
    }
    Ok(())
}

fn collect_container_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|ext| CONTAINER_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn report_container(artifacts: &ContainerArtifacts, verbose: bool) {
    println!(
        "{}: {} unit(s), reduced {:.1}%",
        artifacts.container,
        artifacts.segments.unit_count(),
        artifacts.reduction_percentage()
    );
    if verbose {
        for segment in artifacts.segments.iter() {
            println!(
                "  {} {} [{}..{})",
                segment.kind, segment.name, segment.start_offset, segment.end_offset
            );
        }
    }
}

fn write_artifacts(dir: &Path, artifacts: &ContainerArtifacts) -> Result<()> {
    let container_dir = dir.join(&artifacts.container);
    fs::create_dir_all(&container_dir)
        .with_context(|| format!("failed to create {}", container_dir.display()))?;

    for (index, stub) in artifacts.stubs.iter().enumerate() {
        // Index prefix keeps overloaded unit names from colliding
        let stub_path = container_dir.join(format!("{:03}_{}.stub.sql", index + 1, stub.name));
        fs::write(&stub_path, &stub.source)
            .with_context(|| format!("failed to write {}", stub_path.display()))?;
    }

    let reduced_path = container_dir.join("reduced.sql");
    fs::write(&reduced_path, &artifacts.reduced)
        .with_context(|| format!("failed to write {}", reduced_path.display()))?;

    Ok(())
}

fn run_transform(input: Option<&Path>, schema: &str) -> Result<()> {
    let sql = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let ctx = TransformationContext::bare(schema);
    let transformed = transform_select(&sql, &ctx)?;
    println!("{transformed}");
    Ok(())
}

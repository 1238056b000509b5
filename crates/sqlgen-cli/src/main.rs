use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlgen_codegen::{EmitError, FormatError, Generator, Gofmt, ImportTable, Verbatim};
use sqlgen_core::{parse_file, Config, Queries, SchemaError, CONFIG_FILE};

/// File name of the generated library scaffold
const LIBRARY_FILE: &str = "db.go";

/// sqlgen - Go database/sql accessors from YAML query documents
#[derive(Parser)]
#[command(name = "sqlgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlgen.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `generate` in the current directory
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Go library from query documents
    Generate {
        /// Query documents, or directories holding *.yaml / *.yml files
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Library package name or import path
        #[arg(short, long)]
        name: Option<String>,

        /// Extra import, as prefix:path or path (repeatable)
        #[arg(short, long = "import")]
        imports: Vec<String>,
    },

    /// Validate query documents without generating code
    Check {
        /// Query documents, or directories holding *.yaml / *.yml files
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print query documents in canonical form
    Fmt {
        /// Query documents, or directories holding *.yaml / *.yml files
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Rewrite the documents in place
        #[arg(short, long)]
        write: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Generate {
            paths: vec![PathBuf::from(".")],
            out: None,
            name: None,
            imports: Vec::new(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command.unwrap_or_default() {
        Commands::Generate {
            paths,
            out,
            name,
            imports,
        } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            generate_command(&config, &paths, out, name, imports, cli.verbose)
        }
        Commands::Check { paths, json } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            check_command(&config, &paths, json)
        }
        Commands::Fmt { paths, write } => fmt_command(&paths, write),
        Commands::Init { force } => {
            let path = cli.config.as_deref().unwrap_or(Path::new(CONFIG_FILE));
            init_command(path, force)
        }
    }
}

/// Load the config file given on the command line, else `sqlgen.toml` when present
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(config_path) = path {
        return Config::from_file(config_path).with_context(|| format!("load config {}", config_path.display()));
    }

    let default_path = Path::new(CONFIG_FILE);
    if default_path.exists() {
        return Config::from_file(default_path).with_context(|| format!("load config {}", CONFIG_FILE));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

/// Generate command - write one accessor file per document plus the scaffold
fn generate_command(
    config: &Config,
    paths: &[PathBuf],
    out: Option<PathBuf>,
    name: Option<String>,
    imports: Vec<String>,
    verbose: bool,
) -> Result<()> {
    let documents = find_documents(paths)?;

    let out = out.or_else(|| config.out_dir()).unwrap_or_else(|| PathBuf::from("."));
    if !out.exists() {
        tracing::info!(path = %out.display(), "creating output directory");
        std::fs::create_dir_all(&out).with_context(|| format!("create output directory {}", out.display()))?;
    }

    // Package name: flag, config, output directory, then working directory
    let name = match name.or_else(|| config.package.clone()) {
        Some(name) => name,
        None if out != Path::new(".") => out.display().to_string(),
        None => std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default(),
    };

    let imports: Vec<String> = config.imports.iter().cloned().chain(imports).collect();
    let generator = Generator::new(&name, &imports).context("create generator")?;
    let generator = if config.format.enabled {
        generator.with_formatter(Gofmt::new(config.format.command.clone()))
    } else {
        generator.with_formatter(Verbatim)
    };

    if verbose {
        eprintln!("{} package {}", "Generating".cyan(), generator.package());
    }

    let mut total = 0;
    for document in &documents {
        let queries = read_document(document)?;
        total += queries.len();

        let source = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.display().to_string());
        let stem = document
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());

        let target = out.join(format!("{}.sql.go", stem));
        write_generated(&target, generator.queries(&source, &queries))
            .with_context(|| format!("generate {}", document.display()))?;

        if verbose {
            eprintln!("  {} {} ({} queries)", "Wrote".cyan(), target.display(), queries.len());
        }
    }

    let library = out.join(LIBRARY_FILE);
    write_generated(&library, generator.library()).context("generate library")?;

    eprintln!(
        "{} {} queries from {} documents into {}",
        "✓ Generated".green().bold(),
        total,
        documents.len(),
        out.display()
    );

    Ok(())
}

/// Write generated code; unformatted code is still written when the
/// formatter is missing or refuses it
fn write_generated(path: &Path, generated: Result<String, EmitError>) -> Result<()> {
    match generated {
        Ok(code) => write_file(path, &code),
        Err(EmitError::Format {
            raw,
            source: FormatError::Unavailable { command, source },
        }) => {
            tracing::warn!(%command, error = %source, "formatter unavailable, writing unformatted code");
            write_file(path, &raw)
        }
        Err(EmitError::Format { raw, source }) => {
            write_file(path, &raw)?;
            Err(anyhow::anyhow!("format {}: {}", path.display(), source))
        }
        Err(err) => Err(err.into()),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Check command - parse every document and resolve its imports
fn check_command(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let documents = find_documents(paths)?;
    let imports = ImportTable::new(&config.imports);

    let results: Vec<(PathBuf, Result<Queries, SchemaError>)> = documents
        .into_iter()
        .map(|document| {
            let result = parse_file(&document)
                .and_then(|queries| imports.resolve(queries.as_slice()).map(|_| queries));
            (document, result)
        })
        .collect();

    if json {
        let report: Vec<_> = results
            .iter()
            .map(|(document, result)| match result {
                Ok(queries) => serde_json::json!({
                    "file": document.display().to_string(),
                    "ok": true,
                    "queries": queries.names().collect::<Vec<_>>(),
                }),
                Err(err) => serde_json::json!({
                    "file": document.display().to_string(),
                    "ok": false,
                    "error": {
                        "kind": err.kind,
                        "query": err.query,
                        "line": err.position.line,
                        "column": err.position.column,
                        "message": err.to_string(),
                    },
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (document, result) in &results {
            match result {
                Ok(queries) => println!("{} {} ({} queries)", "✓".green(), document.display(), queries.len()),
                Err(err) => println!("{} {}: {}", "✗".red().bold(), document.display(), err),
            }
        }
    }

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} documents failed", failed, results.len());
    }

    Ok(())
}

/// Fmt command - print or rewrite documents in canonical form
fn fmt_command(paths: &[PathBuf], write: bool) -> Result<()> {
    let documents = find_documents(paths)?;

    for document in &documents {
        let canonical = read_document(document)?.to_yaml();
        if write {
            write_file(document, &canonical)?;
            eprintln!("{} {}", "Formatted".cyan(), document.display());
        } else {
            if documents.len() > 1 {
                println!("# {}", document.display());
            }
            print!("{}", canonical);
        }
    }

    Ok(())
}

/// Init command - write the default configuration
fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default()
        .save_to_file(path)
        .with_context(|| format!("write {}", path.display()))?;

    eprintln!("{} {}", "✓ Created".green().bold(), path.display());
    Ok(())
}

fn read_document(path: &Path) -> Result<Queries> {
    parse_file(path).with_context(|| format!("parse {}", path.display()))
}

/// Expand paths into query documents: files as given, directories to the
/// YAML files directly inside them
fn find_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = BTreeSet::new();

    for path in paths {
        if !path.is_dir() {
            documents.insert(path.clone());
            continue;
        }

        for entry in walkdir::WalkDir::new(path).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("read directory {}", path.display()))?;
            let is_yaml = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");

            if entry.file_type().is_file() && is_yaml {
                documents.insert(entry.into_path());
            }
        }
    }

    if documents.is_empty() {
        anyhow::bail!("no query documents found");
    }

    Ok(documents.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_invocation_generates() {
        let cli = Cli::try_parse_from(["sqlgen", "--verbose"]).unwrap();
        assert!(cli.verbose);

        match cli.command.unwrap_or_default() {
            Commands::Generate {
                paths,
                out,
                name,
                imports,
            } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert_eq!(out, None);
                assert_eq!(name, None);
                assert!(imports.is_empty());
            }
            _ => panic!("expected the generate command"),
        }

        let cli = Cli::try_parse_from(["sqlgen", "check", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check { json: true, .. })));
    }

    #[test]
    fn directories_expand_to_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.yaml"), "").unwrap();

        let documents = find_documents(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(documents, vec![dir.path().join("a.yml"), dir.path().join("b.yaml")]);
    }

    #[test]
    fn no_documents_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_documents(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn unavailable_formatter_writes_raw_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.go");

        let generator = Generator::new("db", Vec::<String>::new())
            .unwrap()
            .with_formatter(Gofmt::new("sqlgen-no-such-formatter-command"));
        write_generated(&path, generator.library()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("package db"));
    }

    #[test]
    fn generate_writes_package_files() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("users.yaml");
        std::fs::write(
            &document,
            "get_user:\n  type: one\n  sql: select id from users where id = ?\n  params:\n    id: int64\n  out:\n    id: int64\n",
        )
        .unwrap();

        let out = dir.path().join("gen/store");
        let config = Config {
            format: sqlgen_core::FormatConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        generate_command(&config, &[document], Some(out.clone()), None, Vec::new(), false).unwrap();

        let queries = std::fs::read_to_string(out.join("users.sql.go")).unwrap();
        assert!(queries.contains("package store\n"));
        assert!(queries.contains("func (q Queries) GetUser(ctx context.Context, id int64) (GetUserRow, error) {"));
        assert!(out.join(LIBRARY_FILE).exists());
    }
}

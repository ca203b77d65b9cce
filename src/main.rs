use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gridfilter::{ColumnRegistry, EngineConfig, FilterEngine};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Load a JSONL file (one object per row) and index its columns
    Load {
        path: String,
        /// Columns to index; defaults to every key of the first row
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Columns whose distinct values sort by typed value
        #[arg(long)]
        natural: Vec<String>,
        /// Start interactive REPL after loading
        #[arg(long)]
        repl: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Load {
            path,
            columns,
            natural,
            repl,
        } => run_load(path, columns, natural, repl)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_rows(path: &str) -> anyhow::Result<Vec<Value>> {
    let f = File::open(path).with_context(|| format!("open {path}"))?;
    let mut rows = Vec::new();
    for (n, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let v: Value =
            serde_json::from_str(&line).with_context(|| format!("{path}:{}", n + 1))?;
        rows.push(v);
    }
    Ok(rows)
}

fn run_load(
    path: String,
    mut columns: Vec<String>,
    natural: Vec<String>,
    repl: bool,
) -> anyhow::Result<()> {
    let rows = read_rows(&path)?;
    if columns.is_empty() {
        columns = rows
            .first()
            .and_then(Value::as_object)
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
    }
    if columns.is_empty() {
        bail!("no columns to index in {path}");
    }

    let registry = ColumnRegistry::json_fields(&columns, &natural);
    let mut engine = FilterEngine::with_config(rows, registry, EngineConfig::from_env())?;
    engine.build_all_indexes_parallel(&columns)?;
    eprintln!(
        "loaded {} rows, indexed {} columns",
        engine.row_count(),
        columns.len()
    );
    for c in engine.registry().names() {
        let n = engine.distinct_values(&c, false)?.len();
        eprintln!("  {c}: {n} distinct");
    }

    if repl {
        run_repl(&mut engine)?;
    }
    Ok(())
}

fn run_repl(engine: &mut FilterEngine<Value>) -> anyhow::Result<()> {
    use std::io::{stdin, stdout, Write};
    let mut input = String::new();
    loop {
        input.clear();
        print!("filter> ");
        stdout().flush().ok();
        if stdin().read_line(&mut input).is_err() {
            break;
        }
        let s = input.trim();
        if s.is_empty() || s == ":q" || s == ":quit" {
            break;
        }
        if let Err(e) = run_command(engine, s) {
            println!("error: {e}");
        }
    }
    Ok(())
}

fn run_command(engine: &mut FilterEngine<Value>, line: &str) -> anyhow::Result<()> {
    let mut parts = line.splitn(3, ' ');
    let cmd = parts.next().unwrap_or_default();
    let col = parts.next();
    let rest = parts.next().map(str::trim);

    match (cmd, col) {
        ("filter", Some(col)) => {
            let values: Vec<&str> = rest
                .map(|r| r.split('|').collect())
                .unwrap_or_default();
            engine.set_filter_display(col, values.as_slice())?;
            println!("{} / {} rows visible", engine.visible_count(), engine.row_count());
        }
        ("unfilter", Some(col)) => {
            engine.remove_filter(col)?;
            println!("{} / {} rows visible", engine.visible_count(), engine.row_count());
        }
        ("clear", _) => {
            engine.clear_all_filters();
            println!("{} rows visible", engine.visible_count());
        }
        ("distinct", Some(col)) => {
            let only_visible = match rest {
                Some("all") => false,
                _ => engine.config().cascade_distinct,
            };
            for d in engine.distinct_values(col, only_visible)? {
                println!("{}\t{}", d.display, d.row_count);
            }
        }
        ("sort", Some(col)) => {
            engine.sort_by(col, rest != Some("desc"))?;
            println!("sorted by {col}");
        }
        ("show", _) => {
            let limit = col.and_then(|n| n.parse().ok()).unwrap_or(10);
            for (pos, row) in engine
                .filtered_positions()
                .iter()
                .zip(engine.filtered_data())
                .take(limit)
            {
                println!("{pos}\t{row}");
            }
        }
        _ => println!("commands: filter <col> <a|b>, unfilter <col>, clear, distinct <col> [all], sort <col> [desc], show [n], :q"),
    }
    Ok(())
}

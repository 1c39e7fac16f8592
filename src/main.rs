// SPDX-License-Identifier: Apache-2.0 OR MIT
use anyhow::{Context, Result};
use clap::Parser;
use rotalog::{Level, Logger, Options};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read lines from stdin and write them to leveled, rotating log files.
///
/// Each line is `<level> <message>`; lines without a recognised level are
/// logged at info.
#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON5 options file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root log directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Most verbose level to write (panic, fatal, error, warning, info, debug, trace)
    #[arg(long)]
    level: Option<Level>,

    /// Rotate a level's file once it reaches this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Writer threads
    #[arg(long)]
    workers: Option<usize>,

    /// Source tag attached to every record
    #[arg(long, default_value = "stdin")]
    source: String,
}

impl Args {
    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Options::default(),
        };
        if let Some(dir) = &self.dir {
            options.directory = dir.clone();
        }
        if let Some(level) = self.level {
            options.level = level;
        }
        if let Some(size) = self.max_file_size {
            options.max_file_size = size;
        }
        if let Some(workers) = self.workers {
            options.workers = Some(workers);
        }
        Ok(options)
    }
}

/// Split `<level> <message>`; anything else is an info message.
fn parse_line(line: &str) -> (Level, &str) {
    if let Some((head, rest)) = line.split_once(' ') {
        if let Ok(level) = head.parse::<Level>() {
            return (level, rest.trim_start());
        }
    }
    (Level::Info, line)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let options = args.options()?;
    let logger = Arc::new(Logger::new(options).context("starting logger")?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("reading stdin")? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        let (level, message) = parse_line(&line);
                        logger.log(level, message, &args.source)?;
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // close_all blocks on worker threads
    let closer = Arc::clone(&logger);
    tokio::task::spawn_blocking(move || closer.close_all())
        .await
        .context("joining shutdown task")??;

    let stats = logger.stats();
    eprintln!(
        "{}",
        serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "message": "rotalogd stopped",
            "stats": stats,
        })
    );
    Ok(())
}

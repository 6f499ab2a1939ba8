use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use lookalike::api::{RebuildBody, RecognizeBody, Reply};
use lookalike::{config, Lookalike, Pipeline, QueryPolicy};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "lookalike")]
#[command(
    version,
    about = "Find which celebrity a face looks most like"
)]
struct Cli {
    /// Config file (defaults to the system config path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the celebrity database from a directory and report on it
    Rebuild {
        /// Directory holding one subdirectory per celebrity
        dir: PathBuf,
    },
    /// Build the database, then find the closest celebrities for each photo
    Recognize {
        /// Directory holding one subdirectory per celebrity
        #[arg(short, long)]
        root: PathBuf,
        /// Number of matches to report (defaults to the config value)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Photos to recognize
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Build the database, then answer commands from stdin, one JSON line each
    Shell {
        /// Directory holding one subdirectory per celebrity
        dir: PathBuf,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let load = || config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Rebuild { dir } => {
            let cfg = load()?;
            let engine = engine(&cfg, QueryPolicy::from(&cfg))?;
            rebuild(&engine, &dir)?;
            emit(&engine.database_status())
        }
        Commands::Recognize {
            root,
            top_k,
            images,
        } => {
            let cfg = load()?;
            let mut policy = QueryPolicy::from(&cfg);
            if let Some(top_k) = top_k {
                policy.top_k = top_k;
            }
            let engine = engine(&cfg, policy)?;
            rebuild(&engine, &root)?;

            let mut failed = 0;
            for image in &images {
                info!("Recognizing {}", image.display());
                let reply: Reply<RecognizeBody> = engine.recognize_file(image).into();
                failed += usize::from(!reply.success);
                emit(&reply)?;
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} photo(s) could not be recognized", images.len());
            }
            Ok(())
        }
        Commands::Shell { dir } => {
            let cfg = load()?;
            let engine = engine(&cfg, QueryPolicy::from(&cfg))?;
            rebuild(&engine, &dir)?;
            shell(&engine)
        }
        // opened without parsing
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn engine(cfg: &config::Config, policy: QueryPolicy) -> Result<Lookalike<Pipeline>> {
    let pipeline = Pipeline::new(&cfg.models(), cfg.score_threshold, cfg.nms_threshold)
        .context("Failed to initialize face recognition pipeline")?;
    Ok(Lookalike::new(pipeline, policy))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

fn rebuild(engine: &Lookalike<Pipeline>, dir: &Path) -> Result<()> {
    let reply: Reply<RebuildBody> = engine.rebuild(dir).into();
    let success = reply.success;
    emit(&reply)?;
    if !success {
        anyhow::bail!("Failed to build the celebrity database from {}", dir.display());
    }
    Ok(())
}

fn shell(engine: &Lookalike<Pipeline>) -> Result<()> {
    info!("Ready. Commands: recognize <image>, rebuild <dir>, status, database, image <file>, quit");

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let (command, arg) = match line.trim().split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "status" => emit(&engine.status())?,
            "database" => emit(&engine.database_status())?,
            "rebuild" => {
                let reply: Reply<RebuildBody> = engine.rebuild(Path::new(arg)).into();
                emit(&reply)?
            }
            "recognize" => {
                let reply: Reply<RecognizeBody> = engine.recognize_file(Path::new(arg)).into();
                emit(&reply)?
            }
            "image" => match engine.celebrity_image(Path::new(arg)) {
                Some(path) => emit(&Reply::ok(ImageBody { image_path: path }))?,
                None => emit(&Reply::<ImageBody>::err("Image not found"))?,
            },
            other => emit(&Reply::<()>::err(format!("unknown command: {other}")))?,
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ImageBody {
    image_path: PathBuf,
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {}", config_path.display());

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}

//! Applies declarative directives to an HTML document and prints the result.

use anyhow::{Context, Result, bail};
use clap::Parser;
use dom_host::{MemoryHost, SettleOptions, outline, settle};
use mutate::Engine;
use std::path::PathBuf;

mod directives;

use directives::DirectiveFile;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "mutator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTML document (body content)
    html: PathBuf,

    /// TOML file with `[[directive]]` tables
    directives: PathBuf,

    /// Revert every directive afterwards and print the restored document
    #[arg(long)]
    revert: bool,

    /// Print an indented node outline instead of markup
    #[arg(long)]
    outline: bool,

    /// Upper bound on settle rounds
    #[arg(long, default_value = "32")]
    max_rounds: usize,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let markup = std::fs::read_to_string(&cli.html)
        .with_context(|| format!("reading {}", cli.html.display()))?;
    let file = DirectiveFile::load(&cli.directives)?;
    let options = SettleOptions {
        max_rounds: cli.max_rounds,
    };

    let mut engine = Engine::with_config(MemoryHost::new(&markup), file.engine);
    let mut controllers = Vec::with_capacity(file.directives.len());
    for (index, directive) in file.directives.iter().enumerate() {
        match engine.try_apply_declarative(directive) {
            Ok(controller) => controllers.push(controller),
            Err(err) => log::warn!("directive #{index} ({}) skipped: {err}", directive.selector),
        }
    }

    let report = settle(&mut engine, options);
    log::info!(
        "applied {} directive(s): {} write(s) in {} round(s)",
        controllers.len(),
        report.writes,
        report.rounds
    );
    if !report.converged {
        bail!("document did not settle within {} rounds", cli.max_rounds);
    }
    print_document(engine.host(), cli.outline);

    if cli.revert {
        for controller in &mut controllers {
            controller.revert(&mut engine);
        }
        let report = settle(&mut engine, options);
        if !report.converged {
            bail!("document did not settle after revert");
        }
        println!();
        print_document(engine.host(), cli.outline);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_document(host: &MemoryHost, as_outline: bool) {
    match host.document() {
        Some(doc) if as_outline => {
            for line in outline(doc, doc.body()) {
                println!("{line}");
            }
        }
        _ => println!("{}", host.body_html()),
    }
}

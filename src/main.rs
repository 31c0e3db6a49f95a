use anyhow::{Context, Result};
use artwork_provenance::{sources, CertificateStatus, MetadataDocument, Resolver};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{ArtworksArgs, CheckArgs, Command, ResolveArgs, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.command.input().verbose);

    let resolver = Resolver::new();
    match args.command {
        Command::Resolve(args) => cmd_resolve(&resolver, args),
        Command::Artworks(args) => cmd_artworks(&resolver, args),
        Command::Check(args) => cmd_check(&resolver, args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve(resolver: &Resolver, input: &cli::SourceArgs) -> Result<std::sync::Arc<MetadataDocument>> {
    let sources = sources::discover(&input.sources).context("collect metadata sources")?;
    resolver.load(&sources).context("resolve metadata")
}

fn cmd_resolve(resolver: &Resolver, args: ResolveArgs) -> Result<()> {
    let doc = resolve(resolver, &args.input)?;
    let text = if args.flatten {
        to_json(&doc.flattened())?
    } else {
        to_json(doc.as_ref())?
    };
    match &args.out {
        Some(path) => write_text(path, &text),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn cmd_artworks(resolver: &Resolver, args: ArtworksArgs) -> Result<()> {
    let doc = resolve(resolver, &args.input)?;
    let cwd = std::env::current_dir().ok();
    for id in doc.artwork_ids() {
        let shown = artwork_provenance::util::display_path(id.path(), cwd.as_deref());
        match doc.previews(&id).first() {
            Some(preview) => println!(
                "{shown}\tpreview={}",
                artwork_provenance::util::display_path(preview.path(), cwd.as_deref())
            ),
            None => println!("{shown}"),
        }
    }
    Ok(())
}

fn cmd_check(resolver: &Resolver, args: CheckArgs) -> Result<()> {
    let doc = resolve(resolver, &args.input)?;
    let rows: Vec<_> = doc
        .artwork_ids()
        .into_iter()
        .map(|id| {
            let license = doc.license(&id).map(|reference| reference.target());
            let certificate = match doc.certificate(&id) {
                CertificateStatus::Present { path, .. } => json!(path.display().to_string()),
                CertificateStatus::Absent => json!("absent"),
                CertificateStatus::Unresolved => json!("unresolved"),
            };
            json!({
                "artwork": id.uri(),
                "license": license,
                "certificate": certificate,
            })
        })
        .collect();

    if args.json {
        let report = json!({ "artworks": rows, "warnings": doc.warnings() });
        println!("{}", to_json(&report)?);
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}\n  license: {}\n  certificate: {}",
            row["artwork"].as_str().unwrap_or_default(),
            row["license"].as_str().unwrap_or("none"),
            row["certificate"].as_str().unwrap_or_default()
        );
    }
    for warning in doc.warnings() {
        println!("warning: {warning}");
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize JSON")
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))
}

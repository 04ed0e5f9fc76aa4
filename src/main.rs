mod cli;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use ks_core::config::Config;
use ks_core::{MediaKind, MimeTable, StorageRoot};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "keepsake.json";

/// Load config from file (strict when a path is given) and apply env overrides.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => Config::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => Config::load_or_default(Some(Path::new(DEFAULT_CONFIG_FILE))),
    };
    config.apply_env();
    Ok(config)
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    // CLI flags win over file and environment.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Keepsake server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    ks_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "keepsake=trace,ks_server=trace,ks_core=trace,tower_http=debug".to_string()
        } else {
            "keepsake=debug,ks_server=debug,ks_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CheckStorage => check_storage(cli.config.as_deref()),
        Commands::GenerateToken => {
            println!("{}", ks_server::middleware::access::generate_event_token());
            Ok(())
        }
        Commands::Version => {
            println!("keepsake {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => println!("Validating config: {:?}", p),
        None => println!("No config file specified, using {DEFAULT_CONFIG_FILE} or defaults"),
    }
    let config = load_config(path)?;

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Upload dir: {}", config.storage.upload_dir.display());
    println!(
        "  Event token: {}",
        if config.access.event_token.is_some() {
            "required"
        } else {
            "not required"
        }
    );
    println!("  Verify signatures: {}", config.media.verify_signatures);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  ! {warning}");
        }
    }

    Ok(())
}

fn check_storage(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let root = StorageRoot::new(&config.storage.upload_dir)?;
    let mime = MimeTable::new();

    println!("Upload dir: {}", root.path().display());

    let mut images = 0usize;
    let mut videos = 0usize;
    let mut refused_links = 0usize;
    let mut skipped: BTreeMap<String, usize> = BTreeMap::new();

    for entry in walkdir::WalkDir::new(root.path()).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        // Symlinks are served only when their target stays inside the root.
        let target = if entry.path_is_symlink() {
            let Ok(rel) = entry.path().strip_prefix(root.path()) else {
                continue;
            };
            let segments: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            match root.resolve(segments.as_slice()) {
                Ok(target) if target.is_file() => target,
                Ok(_) => continue,
                Err(e) => {
                    println!("  refused link {}: {e}", rel.display());
                    refused_links += 1;
                    continue;
                }
            }
        } else if entry.file_type().is_file() {
            entry.path().to_path_buf()
        } else {
            continue;
        };

        match mime.for_path(&target).and_then(MediaKind::from_mime) {
            Some(MediaKind::Image) => images += 1,
            Some(MediaKind::Video) => videos += 1,
            None => {
                let ext = target
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                    .unwrap_or_else(|| "(no extension)".into());
                *skipped.entry(ext).or_default() += 1;
            }
        }
    }

    println!("Servable images: {images}");
    println!("Servable videos: {videos}");
    if refused_links > 0 {
        println!("Refused links: {refused_links}");
    }
    if !skipped.is_empty() {
        println!("Not served:");
        for (ext, count) in &skipped {
            println!("  {ext}: {count}");
        }
    }

    Ok(())
}

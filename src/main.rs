mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

use sc_av::tools::{FFMPEG, SILK_ENCODER};
use sc_av::{Converter, ToolRegistry};
use sc_core::config::Config;
use sc_core::{media, Platform};
use sc_server::AppContext;

/// Load config from `--config`, then apply `PORT`.
fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env();
    config
}

/// Discover tools, failing if either one is missing.
fn require_tools(config: &Config, platform: &Platform) -> Result<ToolRegistry> {
    let tools = ToolRegistry::discover(&config.tools, platform);

    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        }
    }

    if !tools.has(FFMPEG) {
        let hint = if platform.termux {
            "Install it with: pkg install ffmpeg"
        } else {
            "Install ffmpeg or set tools.ffmpeg_path in the config file"
        };
        anyhow::bail!("ffmpeg not found. {hint}");
    }

    if !tools.has(SILK_ENCODER) {
        anyhow::bail!(
            "SILK encoder not found. Build silk_v3_encoder from the SILK SDK and put it on PATH, \
             or set tools.encoder_path in the config file"
        );
    }

    Ok(tools)
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    watch: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path);

    // Override from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if watch {
        config.watch.enabled = true;
    }

    let platform = Platform::detect();
    if platform.termux {
        tracing::info!("Running under Termux");
    }

    let tools = require_tools(&config, &platform)?;
    let converter = Converter::from_tools(&tools, &config.encoder)?;
    let ctx = AppContext::new(config, platform, tools, converter);

    sc_server::start(ctx).await?;
    Ok(())
}

async fn convert_file(
    input: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    if !media::is_supported_audio(input) {
        anyhow::bail!(
            "Unsupported file format: {}. Supported formats: {}",
            input.display(),
            media::supported_list()
        );
    }

    let config = load_config(config_path);
    let platform = Platform::detect();
    let tools = require_tools(&config, &platform)?;
    let converter = Converter::from_tools(&tools, &config.encoder)?;

    let output = output.unwrap_or_else(|| input.with_extension(media::SILK_EXTENSION));
    let report = converter
        .convert_file(input, &output)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!(
        "{} -> {} ({} bytes, {} ms)",
        input.display(),
        report.output.display(),
        report.encoded_bytes,
        report.duration_ms
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "silkconv=trace,sc_server=trace,sc_av=trace,sc_core=debug,tower_http=debug".to_string()
        } else {
            "silkconv=debug,sc_server=debug,sc_av=debug,sc_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Start {
        host: None,
        port: None,
        watch: false,
    });

    match command {
        Commands::Start { host, port, watch } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, watch, cli.config.as_deref()))
        }
        Commands::Convert { input, output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&input, output, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("silkconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path);
    let platform = Platform::detect();
    let tools = ToolRegistry::discover(&config.tools, &platform);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else if platform.termux {
        println!("Some tools are missing. Install ffmpeg with: pkg install ffmpeg");
    } else {
        println!("Some tools are missing. The server will not start without them.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let platform = Platform::detect();
    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Upload limit: {} bytes", config.upload.max_bytes);
    println!("  Upload dir: {}", config.upload_dir(&platform).display());
    println!("  Watch enabled: {}", config.watch.enabled);
    println!("  Watch input: {}", config.watch_input_dir(&platform).display());
    println!("  Watch output: {}", config.watch_output_dir(&platform).display());

    for warning in config.validate() {
        println!("  warning: {warning}");
    }

    Ok(())
}

use super::builtins::builtin_handler;
use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::server::{AppService, HttpServer, ServerHandle};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface of the zest dispatcher.
#[derive(Parser, Debug)]
#[command(name = "zest")]
#[command(about = "Serve and inspect declarative zest routes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the configured routes over HTTP
    Serve {
        /// Configuration file (YAML or TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Address to listen on
        #[arg(long, env = "ZEST_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
    /// Print the compiled route table
    Routes {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Resolve one request offline and print its bindings
    Match {
        #[arg(short, long)]
        config: PathBuf,

        /// Request method
        method: String,

        /// Request path
        path: String,
    },
}

/// Run a parsed command.
///
/// # Errors
///
/// The configuration cannot be loaded, a route does not compile, or the
/// server fails to start.
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { config, addr } => serve(&config, &addr),
        Commands::Routes { config } => {
            print!("{}", routes_report(&load_config(&config)?)?);
            Ok(())
        }
        Commands::Match {
            config,
            method,
            path,
        } => {
            match match_report(&load_config(&config)?, &method, &path)? {
                Some(report) => println!("{report}"),
                None => println!("no route matches {} {path}", method.to_ascii_uppercase()),
            }
            Ok(())
        }
    }
}

/// Load a config file and apply `ZEST_*` overrides.
///
/// # Errors
///
/// Unreadable file, unsupported format or invalid override.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)
        .with_context(|| format!("loading configuration {}", path.display()))?;
    config
        .apply_env_overrides()
        .context("applying ZEST_* overrides")?;
    Ok(config)
}

/// A dispatcher for `config` whose unregistered handler names fall back
/// to the built-ins.
///
/// # Errors
///
/// A declared route does not compile.
pub fn build_dispatcher(config: AppConfig) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::from_config(config).context("compiling routes")?;
    dispatcher.autoload(builtin_handler);
    Ok(dispatcher)
}

/// One line per route: method, template, matcher, names and handler.
///
/// # Errors
///
/// A declared route does not compile.
pub fn routes_report(config: &AppConfig) -> Result<String> {
    let table = config.build_routes().context("compiling routes")?;
    let mut out = String::new();
    for route in table.routes() {
        let names: Vec<String> = route.names().iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "{:<7} {:<32} {:<48} [{}] -> {}",
            route.method().as_str(),
            route.pattern().template(),
            route.pattern().matcher(),
            names.join(", "),
            route.handler_name()
        );
    }
    Ok(out)
}

/// The matched handler and bindings as pretty JSON, `None` when no route
/// matches.
///
/// # Errors
///
/// A declared route does not compile.
pub fn match_report(config: &AppConfig, method: &str, path: &str) -> Result<Option<String>> {
    let table = config.build_routes().context("compiling routes")?;
    let Some(found) = table.find(method, path) else {
        return Ok(None);
    };
    let report = serde_json::json!({
        "handler": found.handler_name(),
        "template": found.route.pattern().template(),
        "params": found.params,
        "args": found.args(),
    });
    Ok(Some(serde_json::to_string_pretty(&report)?))
}

fn serve(config_path: &Path, addr: &str) -> Result<()> {
    let config = load_config(config_path)?;
    may::config().set_stack_size(config.stack_size);
    let dispatcher = Arc::new(build_dispatcher(config)?);
    info!(
        addr = %addr,
        routes_count = dispatcher.routes().len(),
        "Starting server"
    );

    let handle = HttpServer(AppService::new(dispatcher))
        .start(addr)
        .with_context(|| format!("binding {addr}"))?;
    handle.wait_ready().context("waiting for the listener")?;

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown requested");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}

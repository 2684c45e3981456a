use std::path::PathBuf;

use brrtchannels::config::ChannelConfig;
use brrtchannels::demo::{response_message, sample_app, SAMPLE_CHANNELS, SAMPLE_REQUESTS};
use brrtchannels::otel::{init_logging_with_config, LogConfig};
use brrtchannels::server::{ChannelService, HttpServer};
use brrtchannels::{Request, ResolverOptions};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use tracing::info;

/// Channel selection demo: `/{channel}/stack/...` and `/{channel}/router/...`
#[derive(Parser)]
#[command(name = "brrtchannels-demo")]
#[command(about = "Serve or replay the channel selection sample app", long_about = None)]
struct Cli {
    /// Channel configuration file (.yaml, .yml or .toml); falls back to BRRTCH_CHANNELS
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the sample app over HTTP
    Serve {
        /// Address to bind
        #[arg(long, env = "BRRTCH_ADDR", default_value = "0.0.0.0:5000")]
        addr: String,

        /// Coroutine stack size in bytes
        #[arg(long, env = "BRRTCH_STACK_SIZE", default_value_t = 0x10000)]
        stack_size: usize,
    },
    /// Replay the documented sample requests in-process and report mismatches
    Requests,
}

fn resolver_options(config: Option<&PathBuf>) -> anyhow::Result<ResolverOptions> {
    let config = match config {
        Some(path) => Some(ChannelConfig::from_path(path)?),
        None => ChannelConfig::from_env()?,
    };
    Ok(match config {
        Some(config) => config.into_options(),
        None => ResolverOptions::new(SAMPLE_CHANNELS),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;

    let app = sample_app(resolver_options(cli.config.as_ref())?)?;

    match cli.command {
        Commands::Serve { addr, stack_size } => {
            may::config().set_stack_size(stack_size);
            let handle = HttpServer(ChannelService::new(app)).start(addr.as_str())?;
            handle.wait_ready()?;
            info!(addr = %handle.addr(), "Channel demo ready");
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
        }
        Commands::Requests => {
            let mut mismatches = 0usize;
            for &(path, status, message) in SAMPLE_REQUESTS {
                let response = block_on(app.handle(Request::get(path)));
                let actual = response_message(&response).unwrap_or_default();
                let ok = response.status == status && actual == message;
                if !ok {
                    mismatches += 1;
                }
                println!(
                    "{} GET {path:<24} ---> {} {actual}",
                    if ok { "ok  " } else { "FAIL" },
                    response.status
                );
            }
            if mismatches > 0 {
                anyhow::bail!("{mismatches} sample request(s) did not match");
            }
        }
    }

    Ok(())
}

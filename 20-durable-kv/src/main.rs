use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use durable_kv::{
    cli::Cli,
    context::{bootstrap, Bootstrap},
    http::Server,
};

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = cli.config();
    config.validate()?;

    let Bootstrap {
        context,
        mut writer_errors,
        replay,
    } = bootstrap(&config).context("failed to initialize transaction log")?;
    info!(
        events = replay.events,
        keys = context.store().len(),
        "store rebuilt from transaction log"
    );

    tokio::spawn(async move {
        if let Some(err) = writer_errors.recv().await {
            error!(error = %err, "transaction log writer failed; new writes are no longer durable");
        }
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    let server = Server::new(listener, context.clone());
    info!("listening on {}", server.local_addr()?);

    server.run_until_ctrl_c().await?;

    match context.log().close().await {
        Ok(last_sequence) => info!(last_sequence, "transaction log closed"),
        Err(err) => warn!(error = %err, "transaction log was already stopped"),
    }

    Ok(())
}

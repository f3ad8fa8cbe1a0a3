use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    process::exit,
    sync::{mpsc, Arc},
    thread,
};

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use gitlab_metrics::{
    collector::Collector,
    config::{default_config_path, load_config, SAMPLE_CONFIG},
    logging::{init_logging, LoggingConfig},
    metric::CollectorEvent,
    output::to_line_protocol,
};
use tracing::{error, info, warn};

/// Collects GitLab merge request and commit activity as InfluxDB line protocol
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Print a sample configuration and exit.
    #[arg(short, long)]
    sample_config: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    if args.sample_config {
        print!("{SAMPLE_CONFIG}");
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(default_config_path);
    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    if !config_path.exists() {
        return Err(eyre!(
            "no configuration file at {}, see --sample-config",
            config_path.display()
        ));
    }

    let config = load_config(&config_path)
        .wrap_err_with(|| format!("failed to load {}", config_path.display()))?;
    config
        .validate()
        .wrap_err_with(|| format!("invalid configuration in {}", config_path.display()))?;

    let logging = LoggingConfig::from_env().with_level_override(config.log_level.as_deref());
    let _log_guard = init_logging(logging).map_err(|e| eyre!("failed to initialize logging: {e}"))?;

    let debug = std::env::var("GITLAB_METRICS_DEBUG").is_ok();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create runtime")?;

    let (sender, receiver) = mpsc::channel::<CollectorEvent>();
    let printer = thread::spawn(move || print_events(receiver));

    let result = rt.block_on(collect(config.collector(debug), sender));

    let printed = printer
        .join()
        .map_err(|_| eyre!("output thread panicked"))?;
    info!(printed, "Collection finished");

    result
}

/// Runs one collection cycle until every stream has drained or Ctrl-C is
/// pressed.
async fn collect(
    mut collector: Collector,
    sender: mpsc::Sender<CollectorEvent>,
) -> color_eyre::Result<()> {
    collector.start(Arc::new(sender)).await?;

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    for summary in collector.run_until(ctrl_c).await {
        info!(
            stream = %summary.stream,
            pages = summary.pages,
            records = summary.records,
            stop = ?summary.stop,
            "Stream summary"
        );
    }

    Ok(())
}

/// Writes measurements to stdout and logs reported errors. Returns once
/// every sender is gone.
fn print_events(receiver: mpsc::Receiver<CollectorEvent>) -> usize {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printed = 0;

    for event in receiver {
        match event {
            CollectorEvent::Metric(measurement) => {
                let Some(line) = to_line_protocol(&measurement) else {
                    continue;
                };
                if let Err(e) = writeln!(out, "{line}") {
                    error!(error = %e, "Unable to write to stdout");
                    break;
                }
                printed += 1;
            },
            CollectorEvent::Error(e) => error!(error = %error_chain(&e), "Collection error"),
        }
    }

    let _ = out.flush();
    printed
}

fn error_chain(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

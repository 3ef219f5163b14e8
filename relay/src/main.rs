//! convrelay binary
//!
//! Converts a single query given on the command line, or answers commands
//! read line by line from stdin until EOF.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convrelay::{ConversionDispatcher, LogFormat, RelayConfig};

/// Unit and currency conversion relay
#[derive(Parser, Debug)]
#[command(name = "convrelay")]
#[command(about = "Convert units and currencies: <amount> <from> to <to>")]
struct Args {
    /// Log output format (overrides LOG_FORMAT)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,

    /// Query to convert once, e.g. `100 USD to UAH`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    query: Vec<String>,
}

impl Args {
    /// The one-shot query, or `None` to read commands from stdin.
    fn query_text(&self) -> Option<String> {
        (!self.query.is_empty()).then(|| self.query.join(" "))
    }

    /// Apply command-line overrides on top of the environment configuration.
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
    );

    // Replies go to stdout, logs to stderr.
    let (json, pretty) = match format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = RelayConfig::from_env();
    args.apply(&mut config);

    init_logging(&config.log_level, config.log_format);

    if let Err(e) = config.check() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let dispatcher = ConversionDispatcher::from_config(&config);
    let mut stdout = tokio::io::stdout();

    if let Some(query) = args.query_text() {
        let reply = dispatcher.respond(&query).await;
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
    } else {
        info!("Reading commands from stdin");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let reply = dispatcher.respond(&line).await;
            stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    stdout.flush().await?;

    let stats = dispatcher.fx_stats();
    info!(
        requests = dispatcher.metrics().snapshot().requests_total,
        rate_fetches = stats.fetches,
        rate_fetch_failures = stats.fetch_failures,
        cached_bases = stats.cache.total_entries,
        "convrelay shutting down"
    );

    if args.metrics {
        eprint!("{}", dispatcher.metrics().to_prometheus());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_query() {
        let args = Args::try_parse_from(["convrelay", "100", "USD", "to", "UAH"]).unwrap();

        assert_eq!(args.query_text().as_deref(), Some("100 USD to UAH"));
        assert!(!args.metrics);
        assert_eq!(args.log_format, None);
    }

    #[test]
    fn test_no_query_reads_stdin() {
        let args = Args::try_parse_from(["convrelay", "--metrics"]).unwrap();

        assert_eq!(args.query_text(), None);
        assert!(args.metrics);
    }

    #[test]
    fn test_log_format_override() {
        let args =
            Args::try_parse_from(["convrelay", "--log-format", "pretty", "5", "km", "to", "m"])
                .unwrap();
        let mut config = RelayConfig::default();
        args.apply(&mut config);
        assert_eq!(config.log_format, LogFormat::Pretty);

        let args = Args::try_parse_from(["convrelay"]).unwrap();
        let mut config = RelayConfig::default();
        config.log_format = LogFormat::Pretty;
        args.apply(&mut config);
        assert_eq!(config.log_format, LogFormat::Pretty);

        assert!(Args::try_parse_from(["convrelay", "--log-format", "xml"]).is_err());
    }
}

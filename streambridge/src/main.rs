// SPDX-License-Identifier: MIT
// streambridge: search primes on a worker thread and print them on the main thread
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use clap::Parser;
use log::{error, info};

use streambridge::actions;
use streambridge::config::{
    HostConfig, StreamConfig, DEFAULT_PRIME_COUNT, DEFAULT_QUEUE_DEPTH, DEFAULT_REPORT_EVERY,
    DEFAULT_WORKER_THREADS,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of primes to search for, starting at 2
    #[arg(long, default_value_t = DEFAULT_PRIME_COUNT)]
    count: u32,

    /// Only every n-th prime found is reported
    #[arg(long = "report-every", default_value_t = DEFAULT_REPORT_EVERY)]
    report_every: u32,

    /// Capacity of the channel between worker and main thread (0 = unbounded)
    #[arg(long = "queue-depth", default_value_t = DEFAULT_QUEUE_DEPTH)]
    queue_depth: usize,

    /// Number of work queue threads
    #[arg(long = "worker-threads", default_value_t = DEFAULT_WORKER_THREADS)]
    worker_threads: usize,

    /// Action to execute (JSON encoded). Note that this excludes all other options.
    #[arg(long, value_name = "JSON")]
    pub action: Option<String>,

    /// Action to execute (base64-encoded JSON). Note that this excludes all other options.
    #[arg(long = "action-base64", value_name = "BASE64")]
    pub action_base64: Option<String>,
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.action.is_some() && args.action_base64.is_some() {
        return Err("--action and --action-base64 may not be used together".into());
    }
    if args.report_every == 0 {
        return Err("--report-every must be greater than 0".into());
    }
    if args.worker_threads == 0 {
        return Err("--worker-threads must be greater than 0".into());
    }
    Ok(())
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let action = match (&args.action, &args.action_base64) {
        (Some(json), None) => Some(json.clone()),
        (None, Some(b64)) => {
            let decoded = BASE64_STANDARD
                .decode(b64)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

            let decoded = String::from_utf8(decoded)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            Some(decoded)
        }
        (None, None) => None,
        _ => unreachable!("validate_args enforces mutual exclusion"),
    };

    if let Some(action) = action {
        let error_code = actions::handle_action::handle_cli_action(action);
        std::process::exit(error_code);
    }

    let stream_config = StreamConfig {
        count: args.count,
        report_every: args.report_every,
        queue_depth: args.queue_depth,
    };
    let host_config = HostConfig {
        worker_threads: args.worker_threads,
    };

    info!("Starting streambridge");
    let result = actions::handle_action::stream_primes(stream_config, &host_config, |prime| {
        println!("Received prime from worker thread: {prime}");
    });
    match result {
        Ok(summary) => {
            info!(
                "Stream finished with {} and {}",
                summary["status"], summary["report"]
            );
            Ok(())
        }
        Err(err) => {
            error!("Stream failed: {err:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("streambridge").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let args = parse(&[]);
        assert_eq!(args.count, DEFAULT_PRIME_COUNT);
        assert_eq!(args.queue_depth, DEFAULT_QUEUE_DEPTH);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn action_flags_exclude_each_other() {
        let args = parse(&["--action", "{}", "--action-base64", "e30="]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn zero_stride_and_zero_threads_are_rejected() {
        assert!(validate_args(&parse(&["--report-every", "0"])).is_err());
        assert!(validate_args(&parse(&["--worker-threads", "0"])).is_err());
    }
}

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use hdrhistogram::Histogram;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use ringkv::ClientConfig;
use ringkv::ReplicatedClient;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Writes random keys through the replicated client and reports latency
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory service endpoints, comma-separated
    #[arg(long, value_delimiter = ',')]
    endpoints: Vec<String>,

    /// Membership group the storage nodes register under
    #[arg(long)]
    service_name: Option<String>,

    /// Replicas per key (default: 2)
    #[arg(long)]
    replication_factor: Option<usize>,

    #[arg(long, default_value_t = 10_000)]
    total: u64,

    /// Keys are drawn uniformly from 0..key_space
    #[arg(long, default_value_t = 10_000_000)]
    key_space: u64,

    /// Read every key back after writing it
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// TOML config file, merged under the environment
    #[arg(long)]
    config: Option<String>,

    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

struct BenchmarkStats {
    sets: Histogram<u64>,
    gets: Histogram<u64>,
    mismatches: u64,
}

impl BenchmarkStats {
    fn new() -> Result<Self, hdrhistogram::CreationError> {
        Ok(Self {
            sets: Histogram::new_with_bounds(1, 600_000_000, 3)?,
            gets: Histogram::new_with_bounds(1, 600_000_000, 3)?,
            mismatches: 0,
        })
    }

    fn summary(
        &self,
        total_time: Duration,
    ) {
        let ops = self.sets.len() + self.gets.len();
        println!("Summary:");
        println!("Total time:\t{:.2} s", total_time.as_secs_f64());
        println!(" Requests:\t{ops}");
        println!("Throughput:\t{:.2} ops/sec", ops as f64 / total_time.as_secs_f64());

        print_latency("set", &self.sets);
        if !self.gets.is_empty() {
            print_latency("get", &self.gets);
            println!("\nMismatched reads:\t{}", self.mismatches);
        }
    }
}

fn print_latency(
    op: &str,
    hist: &Histogram<u64>,
) {
    println!("\n{op} latency distribution (μs):");
    println!(" Avg\t{:.2}", hist.mean());
    println!(" Min\t{}", hist.min());
    println!(" Max\t{}", hist.max());
    println!(" p50\t{}", hist.value_at_quantile(0.5));
    println!(" p90\t{}", hist.value_at_quantile(0.9));
    println!(" p99\t{}", hist.value_at_quantile(0.99));
    println!(" p99.9\t{}", hist.value_at_quantile(0.999));
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = init_observability(cli.log_dir.as_deref());

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if !cli.endpoints.is_empty() {
        config.directory.endpoints = cli.endpoints.clone();
    }
    if let Some(service_name) = &cli.service_name {
        config.directory.service_name = service_name.clone();
    }
    if let Some(factor) = cli.replication_factor {
        config.replication.factor = factor;
    }

    let client = ReplicatedClient::builder(
        config.directory.endpoints.clone(),
        config.directory.service_name.clone(),
    )
    .set_config(config)
    .build()
    .await?;

    let mut stats = BenchmarkStats::new()?;
    let mut rng = StdRng::from_entropy();
    let key_space = cli.key_space.max(1);

    info!(total = cli.total, verify = cli.verify, "Benchmark started");
    let started = Instant::now();
    for _ in 0..cli.total {
        let key = rng.gen_range(0..key_space).to_string();

        let op_start = Instant::now();
        if let Err(e) = client.set(&key, key.clone()).await {
            error!(%key, error = %e, "Set failed, stopping benchmark");
            client.close().await;
            return Err(e.into());
        }
        stats.sets.saturating_record(op_start.elapsed().as_micros() as u64);

        if cli.verify {
            let op_start = Instant::now();
            match client.get(&key).await {
                Ok(Some(value)) if value == key.as_bytes() => {}
                Ok(other) => {
                    warn!(%key, ?other, "Read back unexpected value");
                    stats.mismatches += 1;
                }
                Err(e) => {
                    warn!(%key, error = %e, "Read back failed");
                    stats.mismatches += 1;
                }
            }
            stats.gets.saturating_record(op_start.elapsed().as_micros() as u64);
        }
    }
    let elapsed = started.elapsed();

    client.close().await;
    stats.summary(elapsed);

    if stats.mismatches > 0 {
        return Err(format!("{} keys did not read back as written", stats.mismatches).into());
    }
    Ok(())
}

fn init_observability(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "ringkv.log"));
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(file_layer).init();
            Some(guard)
        }
        None => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(stderr_layer).init();
            None
        }
    }
}

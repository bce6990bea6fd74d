//! CLI testbench for the blackbox virtual DPU platform.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blackbox")]
#[command(about = "blackbox — virtual DPU platform testbench")]
#[command(version = blackbox_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single data block through the dual-path logging pipeline
    Run {
        /// Block size in bytes
        #[arg(long, default_value_t = 64 * 1024)]
        size: usize,

        /// Fill pattern for the generated block
        #[arg(long, default_value = "sensor", value_parser = ["sensor", "constant", "counter"])]
        pattern: String,

        /// Print the full statistics report afterwards
        #[arg(long)]
        report: bool,
    },

    /// Stream blocks continuously with simulated drive telemetry
    Stream {
        /// Number of blocks to log (0 = until ctrl-c)
        #[arg(long, default_value_t = 5)]
        blocks: u32,

        /// Block size in bytes
        #[arg(long, default_value_t = 32 * 1024)]
        block_size: usize,

        /// Cloud backend base URL; telemetry is posted there when given
        #[arg(long)]
        backend: Option<String>,

        /// Vehicle id reported in telemetry packets
        #[arg(long, default_value = "BB-001")]
        vehicle: String,

        /// Drive scenario seed for reproducible streams
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Benchmark the pipeline across block sizes
    Bench {
        /// Comma-separated block sizes in bytes
        #[arg(long, value_delimiter = ',')]
        sizes: Option<Vec<usize>>,
    },

    /// Validate the address map with bus probes
    Probe,

    /// Log blocks, then request a gated transfer of one record
    Transfer {
        /// Virtual timestamp (ns) to query
        #[arg(long)]
        timestamp: u64,

        /// Transfer key checked against the marker-key file
        #[arg(long)]
        key: String,

        /// Blocks to log before querying
        #[arg(long, default_value_t = 3)]
        blocks: u32,
    },

    /// Run a canned workload and emit the statistics report as JSON
    Report {
        /// Blocks in the canned workload
        #[arg(long, default_value_t = 3)]
        blocks: u32,
    },

    /// Run the cloud endpoint development server
    Server {
        /// Listen port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            size,
            pattern,
            report,
        } => commands::run::run(size, &pattern, report),
        Commands::Stream {
            blocks,
            block_size,
            backend,
            vehicle,
            seed,
        } => commands::stream::run(blocks, block_size, backend.as_deref(), &vehicle, seed),
        Commands::Bench { sizes } => commands::bench::run(sizes),
        Commands::Probe => commands::probe::run(),
        Commands::Transfer {
            timestamp,
            key,
            blocks,
        } => commands::transfer::run(timestamp, &key, blocks),
        Commands::Report { blocks } => commands::report::run(blocks),
        Commands::Server { port } => commands::server::run(port),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

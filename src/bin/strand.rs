/// Strand CLI
///
/// Runs programs through the cooperative scheduler and writes execution
/// traces for external visualizers.
use strand_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

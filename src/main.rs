use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = tagrelay::cli::Cli::parse();
    if let Err(e) = tagrelay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

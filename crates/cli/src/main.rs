use ipfs_cli::lifecycle::alloc::CountingAllocator;
use ipfs_cli::Cli;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[tokio::main]
async fn main() {
    let cli = Cli::system();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let status = cli
        .run(std::env::args_os(), &mut stdout, &mut stderr, interrupt)
        .await;

    std::process::exit(status.code());
}

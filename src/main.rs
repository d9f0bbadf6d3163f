mod cli;

#[tokio::main]
async fn main() {
    env_logger::init();
    let code = cli::run().await;
    std::process::exit(code);
}

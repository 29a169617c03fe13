#[tokio::main]
async fn main() -> std::io::Result<()> {
    jukebox_server::run_with_config().await
}

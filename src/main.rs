use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    itest_cli::cli::app::run().await
}

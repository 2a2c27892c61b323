use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    triage_cli::main_entry().await
}

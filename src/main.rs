use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gpt4shell::run().await
}

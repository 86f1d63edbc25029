#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hebrew_lesson_client::run().await
}

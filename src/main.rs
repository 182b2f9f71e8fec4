#[tokio::main]
async fn main() -> anyhow::Result<()> {
    event_monitor_lib::run().await
}

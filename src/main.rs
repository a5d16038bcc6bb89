#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = courseforge::run().await {
        eprintln!("courseforge fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

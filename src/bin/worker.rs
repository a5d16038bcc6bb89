#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = courseforge::run_worker().await {
        eprintln!("courseforge-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

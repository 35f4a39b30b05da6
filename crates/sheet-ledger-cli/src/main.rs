#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sheet_ledger_cli::run(std::env::args()).await
}

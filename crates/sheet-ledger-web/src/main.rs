use clap::Parser;
use sheet_ledger::StockPolicy;
use sheet_ledger_web::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-ledger-web")]
#[command(about = "JSON API server for a sheet-ledger workbook")]
struct Args {
    /// Directory holding Inventory.csv, Sales.csv and Purchases.csv, overriding the config file
    #[arg(short, long)]
    workbook: Option<PathBuf>,

    /// Config file. Defaults to sheet-ledger.toml or .sheet-ledger.toml in the current directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refuse sales that exceed the stock instead of flooring it at zero
    #[arg(long)]
    reject_oversell: bool,

    /// Port to listen on
    #[arg(short, long, default_value_t = sheet_ledger_web::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (base_dir, mut config) = Config::load(args.config.as_deref())?;
    if args.reject_oversell {
        config.ledger.stock_policy = StockPolicy::Reject;
    }
    let workbook = args
        .workbook
        .unwrap_or_else(|| config.workbook_dir(&base_dir));

    sheet_ledger_web::run(workbook, config.ledger, args.port).await
}

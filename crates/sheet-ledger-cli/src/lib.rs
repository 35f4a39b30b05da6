mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args as ClapArgs, CommandFactory as _, Parser, Subcommand};
use sheet_ledger::locate::Criteria;
use sheet_ledger::store::init_workbook;
use sheet_ledger::{Book, Decimal, Field, NewTransaction, TransactionKind};

use sheet_ledger_web::config::Config;

#[derive(Parser)]
#[command(
    name = "sheet-ledger",
    about = "Record sales and purchases and keep the inventory stock in step"
)]
#[command(disable_help_subcommand = true)]
struct Args {
    /// Workbook directory, overriding the config file
    #[arg(short, long, global = true)]
    workbook: Option<PathBuf>,

    /// Config file. Defaults to sheet-ledger.toml or .sheet-ledger.toml in the current directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs)]
struct RecordArgs {
    /// Item name, exactly as in the inventory
    #[arg(short, long)]
    item: String,

    #[arg(short, long)]
    quantity: u32,

    /// Unit price. For sales, defaults to the item's current sell price
    #[arg(short, long)]
    price: Option<Decimal>,

    /// Date of the transaction. Defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,
}

#[derive(ClapArgs)]
struct DeleteArgs {
    /// Position of the record as shown in the listing
    #[arg(long, conflicts_with_all = ["date", "item", "quantity"])]
    position: Option<usize>,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    item: Option<String>,

    #[arg(long)]
    quantity: Option<u32>,
}

impl DeleteArgs {
    fn criteria(&self) -> Criteria {
        Criteria::new()
            .with_opt(Field::Date, self.date.as_deref())
            .with_opt(Field::Item, self.item.as_deref())
            .with_opt(Field::Quantity, self.quantity)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the workbook files that do not exist yet
    Init,
    /// Show revenue, cost, profit and the best selling items (default)
    Dashboard,
    /// List the inventory
    Inventory,
    /// List recorded sales
    Sales,
    /// List recorded purchases
    Purchases,
    /// Record a sale and take the units out of stock
    Sale(RecordArgs),
    /// Record a purchase and add the units to stock
    Purchase(RecordArgs),
    /// Delete a sale and put its units back into stock
    DeleteSale(DeleteArgs),
    /// Delete a purchase and take its units out of stock
    DeletePurchase(DeleteArgs),
    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = sheet_ledger_web::DEFAULT_PORT)]
        port: u16,
    },
}

pub async fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sheet_ledger=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);
    let (base_dir, config) = Config::load(args.config.as_deref())?;
    let dir = args
        .workbook
        .unwrap_or_else(|| config.workbook_dir(&base_dir));
    tracing::debug!("Using workbook {}", dir.display());

    let mut book = Book::open_dir(&dir, config.ledger.clone());
    match args.command.unwrap_or(Commands::Dashboard) {
        Commands::Init => {
            let created = init_workbook(&dir)
                .with_context(|| format!("Failed to create workbook in {}", dir.display()))?;
            if created.is_empty() {
                println!("Workbook in {} is already complete", dir.display());
            }
            for path in created {
                println!("Created {}", path.display());
            }
        }
        Commands::Dashboard => {
            let summary = book.dashboard()?;
            if summary.is_empty() {
                println!("No sales recorded yet.");
            } else {
                show::print_section("Dashboard", &show::render_summary(&summary));
            }
        }
        Commands::Inventory => {
            let items = book.inventory()?;
            if items.is_empty() {
                println!("Your inventory is empty. Record a purchase first.");
            } else {
                show::print_section("Inventory", &show::render_inventory(&items));
            }
        }
        Commands::Sales => {
            let sales = book.sales()?;
            show::print_section(
                "Sales",
                &show::render_transactions(TransactionKind::Sale, &sales),
            );
        }
        Commands::Purchases => {
            let purchases = book.purchases()?;
            show::print_section(
                "Purchases",
                &show::render_transactions(TransactionKind::Purchase, &purchases),
            );
        }
        Commands::Sale(record) => {
            let price = match record.price {
                Some(price) => price,
                None => book.sell_price(&record.item)?,
            };
            let sale = new_transaction(record, price);
            let outcome = book.record_sale(&sale)?;
            show::print_outcome(
                &format!(
                    "Sale recorded for {} on {}. Stock reduced by {}.",
                    sale.item, sale.date, sale.quantity
                ),
                &outcome,
            );
        }
        Commands::Purchase(record) => {
            let price = record
                .price
                .context("a purchase needs a --price")?;
            let purchase = new_transaction(record, price);
            let outcome = book.record_purchase(&purchase)?;
            show::print_outcome(
                &format!(
                    "Purchase recorded for {} on {}. Stock increased by {}.",
                    purchase.item, purchase.date, purchase.quantity
                ),
                &outcome,
            );
        }
        Commands::DeleteSale(delete) => {
            let outcome = match delete.position {
                Some(position) => book.delete_sale_at(position)?,
                None => book.delete_sale(&delete.criteria())?,
            };
            show::print_outcome("Sale deleted. Stock restored.", &outcome);
        }
        Commands::DeletePurchase(delete) => {
            let outcome = match delete.position {
                Some(position) => book.delete_purchase_at(position)?,
                None => book.delete_purchase(&delete.criteria())?,
            };
            show::print_outcome("Purchase deleted. Stock reduced.", &outcome);
        }
        Commands::Serve { port } => {
            sheet_ledger_web::run(dir, config.ledger, port).await?;
        }
    }

    Ok(())
}

fn new_transaction(record: RecordArgs, price: Decimal) -> NewTransaction {
    NewTransaction {
        date: record.date.unwrap_or_else(|| Local::now().date_naive()),
        item: record.item,
        quantity: record.quantity,
        price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn delete_criteria_skip_missing_flags() {
        let args = Args::parse_from(["sheet-ledger", "delete-sale", "--item", "Pen", "--quantity", "3"]);
        let Some(Commands::DeleteSale(delete)) = args.command else {
            panic!("expected delete-sale");
        };
        assert_eq!(
            delete.criteria(),
            Criteria::new()
                .with(Field::Item, "Pen")
                .with(Field::Quantity, 3)
        );
    }

    #[test]
    fn position_excludes_criteria() {
        let result = Args::try_parse_from([
            "sheet-ledger",
            "delete-purchase",
            "--position",
            "2",
            "--item",
            "Pen",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn record_arguments_parse() {
        let args = Args::parse_from([
            "sheet-ledger",
            "-w",
            "shop",
            "purchase",
            "-i",
            "Notebook",
            "-q",
            "5",
            "-p",
            "20",
            "-d",
            "2025-02-01",
        ]);
        assert_eq!(args.workbook, Some(PathBuf::from("shop")));
        let Some(Commands::Purchase(record)) = args.command else {
            panic!("expected purchase");
        };
        assert_eq!(record.price, Some(Decimal::from(20)));
        assert_eq!(record.date, "2025-02-01".parse().ok());
    }
}

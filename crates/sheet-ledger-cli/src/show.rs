use anstyle::{AnsiColor, Color, Style};
use sheet_ledger::report::Summary;
use sheet_ledger::{Item, Outcome, Transaction, TransactionKind};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

fn table(header: &[(&str, Align)], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(column, (title, _))| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut output = line(&widths, header, header.iter().map(|(title, _)| *title));
    output.push('\n');
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    output.push_str(&rule.join("  "));
    output.push('\n');
    for row in rows {
        output.push_str(&line(&widths, header, row.iter().map(String::as_str)));
        output.push('\n');
    }
    output
}

fn line<'a>(
    widths: &[usize],
    header: &[(&str, Align)],
    cells: impl Iterator<Item = &'a str>,
) -> String {
    let padded: Vec<String> = cells
        .zip(header)
        .zip(widths)
        .map(|((cell, (_, align)), &width)| match align {
            Align::Left => format!("{cell:<width$}"),
            Align::Right => format!("{cell:>width$}"),
        })
        .collect();
    padded.join("  ").trim_end().to_owned()
}

pub fn render_inventory(items: &[Item]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.name.clone(),
                item.buy_price.to_string(),
                item.sell_price.to_string(),
                item.stock.to_string(),
            ]
        })
        .collect();
    table(
        &[
            ("Item", Align::Left),
            ("Buy Price", Align::Right),
            ("Sell Price", Align::Right),
            ("Stock", Align::Right),
        ],
        &rows,
    )
}

pub fn render_transactions(kind: TransactionKind, transactions: &[Transaction]) -> String {
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|transaction| {
            vec![
                transaction.position.to_string(),
                transaction.date.clone(),
                transaction.item.clone(),
                transaction.quantity.to_string(),
                transaction.price.to_string(),
                transaction.total().map(|total| total.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    let units = match kind {
        TransactionKind::Sale => "Units Sold",
        TransactionKind::Purchase => "Units Bought",
    };
    table(
        &[
            ("#", Align::Right),
            ("Date", Align::Left),
            ("Item", Align::Left),
            (units, Align::Right),
            ("Price", Align::Right),
            ("Total", Align::Right),
        ],
        &rows,
    )
}

pub fn render_summary(summary: &Summary) -> String {
    let mut output = String::new();
    for (label, value) in [
        ("Total Revenue", summary.revenue.round_dp(2).to_string()),
        ("Total Cost", summary.cost.round_dp(2).to_string()),
        ("Total Profit", summary.profit.round_dp(2).to_string()),
        ("Recorded", summary.recorded_revenue.round_dp(2).to_string()),
        (
            "Sales",
            format!("{} ({} units)", summary.sales_count, summary.units_sold),
        ),
    ] {
        output.push_str(&format!("{label:<15}{value}\n"));
    }

    let rows: Vec<Vec<String>> = summary
        .most_sold
        .iter()
        .map(|entry| vec![entry.item.clone(), entry.units.to_string()])
        .collect();
    output.push('\n');
    output.push_str(&table(
        &[("Most Sold", Align::Left), ("Units", Align::Right)],
        &rows,
    ));

    if !summary.unknown_items.is_empty() {
        output.push_str(&format!(
            "\nNot in inventory: {}\n",
            summary.unknown_items.join(", ")
        ));
    }
    output
}

pub fn print_outcome(message: &str, outcome: &Outcome) {
    let ok_style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let warning_style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    let reset = Style::new();

    for warning in &outcome.warnings {
        println!("{warning_style}warning:{reset} {warning}");
    }
    println!("{ok_style}✓{reset} {message}");
}

pub fn print_section(title: &str, body: &str) {
    let bold = Style::new().bold();
    let reset = Style::new();
    println!("{bold}━━━ {title} ━━━{reset}");
    print!("{body}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_ledger::Decimal;
    use sheet_ledger::report::summarize;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "Pen".into(),
                buy_price: dec("5"),
                sell_price: dec("8"),
                stock: 10,
            },
            Item {
                name: "Notebook".into(),
                buy_price: dec("20"),
                sell_price: dec("24.0"),
                stock: 5,
            },
        ]
    }

    fn sales() -> Vec<Transaction> {
        vec![
            Transaction {
                position: 0,
                date: "2025-02-03".into(),
                item: "Notebook".into(),
                quantity: 2,
                price: dec("30"),
                total: Some(dec("60")),
            },
            Transaction {
                position: 1,
                date: "2025-02-04".into(),
                item: "Pen".into(),
                quantity: 3,
                price: dec("8"),
                total: None,
            },
        ]
    }

    #[test]
    fn inventory_table() {
        insta::assert_snapshot!(render_inventory(&items()), @r"
        Item      Buy Price  Sell Price  Stock
        --------  ---------  ----------  -----
        Pen               5           8     10
        Notebook         20        24.0      5
        ");
    }

    #[test]
    fn sales_table() {
        insta::assert_snapshot!(render_transactions(TransactionKind::Sale, &sales()), @r"
        #  Date        Item      Units Sold  Price  Total
        -  ----------  --------  ----------  -----  -----
        0  2025-02-03  Notebook           2     30     60
        1  2025-02-04  Pen                3      8     24
        ");
    }

    #[test]
    fn summary() {
        let summary = summarize(&items(), &sales()).unwrap();
        insta::assert_snapshot!(render_summary(&summary), @r"
        Total Revenue  72.0
        Total Cost     55
        Total Profit   17.0
        Recorded       84
        Sales          2 (5 units)

        Most Sold  Units
        ---------  -----
        Pen            3
        Notebook       2
        ");
    }
}

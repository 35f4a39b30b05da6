use std::time::Duration;

use serde_json::{Value, json};
use sheet_ledger::LedgerConfig;
use sheet_ledger::store::init_workbook;

async fn get(client: &reqwest::Client, url: String) -> Value {
    client
        .get(url)
        .send()
        .await
        .expect("get request failed")
        .json()
        .await
        .expect("json parse failed")
}

fn number(value: &Value) -> f64 {
    value
        .as_str()
        .expect("decimals are serialized as strings")
        .parse()
        .expect("not a number")
}

#[tokio::test]
async fn test_api_workflow() {
    let temp_dir = std::env::temp_dir().join(format!("sheet-ledger-test-{}", std::process::id()));
    std::fs::create_dir_all(&temp_dir).unwrap();
    init_workbook(&temp_dir).unwrap();

    let workbook = temp_dir.clone();
    tokio::spawn(async move {
        sheet_ledger_web::run(workbook, LedgerConfig::default(), 8083)
            .await
            .ok();
    });

    let client = reqwest::Client::new();
    let base = "http://localhost:8083";

    // wait for the server to come up
    let mut inventory = None;
    for _ in 0..50 {
        if let Ok(response) = client.get(format!("{base}/api/inventory")).send().await {
            inventory = Some(response.json::<Value>().await.unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let inventory = inventory.expect("server did not start");
    assert_eq!(inventory, json!([]));

    // Purchase of a new item creates it
    let purchase: Value = client
        .post(format!("{base}/api/purchases"))
        .json(&json!({"date": "2025-02-01", "item": "Notebook", "quantity": 5, "price": 20}))
        .send()
        .await
        .expect("purchase request failed")
        .json()
        .await
        .unwrap();
    assert_eq!(purchase["ok"], json!(true));
    assert_eq!(purchase["warnings"].as_array().unwrap().len(), 1);

    let inventory = get(&client, format!("{base}/api/inventory")).await;
    assert_eq!(inventory[0]["name"], json!("Notebook"));
    assert_eq!(number(&inventory[0]["sell_price"]), 24.0);
    assert_eq!(inventory[0]["stock"], json!(5));

    // Purchase without a price is rejected
    let missing_price = client
        .post(format!("{base}/api/purchases"))
        .json(&json!({"item": "Notebook", "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_price.status().as_u16(), 422);

    // Sale at an explicit price
    let sale: Value = client
        .post(format!("{base}/api/sales"))
        .json(&json!({"date": "2025-02-03", "item": "Notebook", "quantity": 2, "price": "30"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sale, json!({"ok": true, "warnings": []}));

    let sales = get(&client, format!("{base}/api/sales")).await;
    assert_eq!(sales.as_array().unwrap().len(), 1);
    assert_eq!(number(&sales[0]["total"]), 60.0);

    let dashboard = get(&client, format!("{base}/api/dashboard")).await;
    assert_eq!(dashboard["sales_count"], json!(1));
    assert_eq!(dashboard["most_sold"][0]["item"], json!("Notebook"));

    // Unknown items cannot be sold
    let unknown = client
        .post(format!("{base}/api/sales"))
        .json(&json!({"item": "Stapler", "quantity": 1, "price": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);

    // Deleting the sale restores the stock
    let deleted: Value = client
        .post(format!("{base}/api/sales/delete"))
        .json(&json!({"date": "2025-02-03", "item": "Notebook", "quantity": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["ok"], json!(true));

    let inventory = get(&client, format!("{base}/api/inventory")).await;
    assert_eq!(inventory[0]["stock"], json!(5));

    let again = client
        .post(format!("{base}/api/sales/delete"))
        .json(&json!({"item": "Notebook"}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);

    // Purchases can be deleted by position
    let deleted = client
        .post(format!("{base}/api/purchases/delete"))
        .json(&json!({"position": 0}))
        .send()
        .await
        .unwrap();
    assert!(deleted.status().is_success());
    let inventory = get(&client, format!("{base}/api/inventory")).await;
    assert_eq!(inventory[0]["stock"], json!(0));

    std::fs::remove_dir_all(&temp_dir).ok();
}

//! A posts table driven against an in-memory backend.
//!
//! Mirrors the usual wiring: the engine notifies with outgoing parameters,
//! the host fetches and feeds the page back with `set_data`.

use std::sync::Arc;
use std::sync::Mutex;

use gridquery_lib::TableBuilder;
use gridquery_lib::column::ColumnSpec;
use gridquery_lib::column::Columns;
use gridquery_lib::column::FilterSpec;
use gridquery_lib::column::FilterType;
use gridquery_lib::column::SelectOption;
use gridquery_lib::options::TableOptions;
use gridquery_lib::query::MemoryUrl;
use gridquery_lib::query::OutgoingParams;
use gridquery_lib::rest::PageResponse;
use serde_json::Value;
use serde_json::json;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;

fn main() {
    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    let dataset = posts();
    let pending: Arc<Mutex<Vec<OutgoingParams>>> = Arc::default();

    let sink = Arc::clone(&pending);
    let mut table = TableBuilder::new(
        Columns::new()
            .column(
                "id",
                ColumnSpec::new().label("Id").width(6).filter(
                    FilterSpec::new(FilterType::Number)
                        .extend([FilterType::NumberBetween, FilterType::NumberGreater]),
                ),
            )
            .column("title", ColumnSpec::new().label("Title").filterable())
            .column(
                "userId",
                ColumnSpec::new().label("User").filter(
                    FilterSpec::new(FilterType::Select).options(vec![
                        SelectOption::new("Leanne", 1),
                        SelectOption::new("Ervin", 2),
                        SelectOption::new("Clementine", 3),
                    ]),
                ),
            )
            .column("body", ColumnSpec::new().label("Body").no_sort()),
    )
    .options(TableOptions::new().rows([5, 10, 25]))
    .url_store(MemoryUrl::new())
    .on_change(move |params, action| {
        println!("-- {}: {:?}", action.as_str(), params);
        sink.lock().unwrap().push(params.clone());
    })
    .build()
    .expect("URL state should decode");

    table.init();
    fetch_pending(&mut table, &pending, &dataset);

    table.toggle_sort("title");
    table.set_filter("userId", json!(2), None);
    fetch_pending(&mut table, &pending, &dataset);

    table.set_filter(
        "id",
        json!([10, 40]),
        Some(FilterType::NumberBetween),
    );
    fetch_pending(&mut table, &pending, &dataset);

    table.toggle_select(json!(13));
    table.set_page(2);
    fetch_pending(&mut table, &pending, &dataset);

    let info = table.page_info();
    println!(
        "page {}/{} -- {}",
        info.page,
        info.page_total,
        info.summary()
    );
}

/// Drains queued notifications, "fetching" each one from the dataset.
fn fetch_pending(
    table: &mut gridquery_lib::TableState,
    pending: &Arc<Mutex<Vec<OutgoingParams>>>,
    dataset: &[Value],
) {
    for params in pending.lock().unwrap().drain(..) {
        let page = fetch(&params, dataset);
        println!(
            "   {} rows of {}",
            page.data.len(),
            page.total
        );
        table.set_data(page.data, page.total);
    }
}

/// Applies the outgoing parameters the way a json-server backend would.
fn fetch(params: &OutgoingParams, rows: &[Value]) -> PageResponse {
    let mut rows: Vec<Value> = rows
        .iter()
        .filter(|row| {
            params.iter().all(|(key, value)| match key.as_str() {
                "_page" | "_limit" | "_sort" | "_order" => true,
                _ => {
                    if let Some(field) = key.strip_suffix("_like") {
                        row.get(field)
                            .and_then(Value::as_str)
                            .zip(value.as_str())
                            .is_some_and(|(hay, needle)| hay.contains(needle))
                    } else if let Some(field) = key.strip_suffix("_gte") {
                        number(row.get(field)) >= number(Some(value))
                    } else if let Some(field) = key.strip_suffix("_lte") {
                        number(row.get(field)) <= number(Some(value))
                    } else {
                        row.get(key) == Some(value)
                    }
                }
            })
        })
        .cloned()
        .collect();

    if let Some(field) = params.get("_sort").and_then(Value::as_str) {
        rows.sort_by(|a, b| {
            let (a, b) = (a.get(field), b.get(field));
            match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .cmp(b.and_then(Value::as_str).unwrap_or("")),
            }
        });
        if params.get("_order").and_then(Value::as_str) == Some("desc") {
            rows.reverse();
        }
    }

    let total = rows.len() as u64;
    let page = params["_page"].as_u64().unwrap_or(1) as usize;
    let limit = params["_limit"].as_u64().unwrap_or(10) as usize;
    let data = rows
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .collect();
    PageResponse::new(data, total)
}

fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn posts() -> Vec<Value> {
    (1..=60)
        .map(|id| {
            json!({
                "id": id,
                "userId": (id - 1) / 10 + 1,
                "title": format!("post number {id}"),
                "body": format!("body of post {id}"),
            })
        })
        .collect()
}

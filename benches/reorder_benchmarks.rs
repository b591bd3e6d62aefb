use chrono::{Duration as ChronoDuration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smart_inventory_api::services::{
    forecasting::accuracy::{evaluate, ObservedDay},
    reorder::{calculate_reorder, ReorderInputs},
    sales::average_daily_quantity,
};
use std::time::Duration;

fn inputs(i: i32) -> ReorderInputs {
    ReorderInputs {
        current_stock: i % 50,
        reorder_point: 50,
        safety_stock: 5,
        item_reorder_qty: if i % 3 == 0 { None } else { Some(40) },
        supplier_min_order_qty: if i % 2 == 0 { Some(24) } else { None },
        horizon_days: 21,
        avg_daily_sales: f64::from(i % 11) * 0.75,
        forecast_demand: f64::from(i % 97) * 1.5,
    }
}

// Pure calculation over a batch of low-stock items
fn reorder_calculation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_calculation");

    for size in [1, 100, 1_000, 10_000].iter() {
        let batch: Vec<ReorderInputs> = (0..*size).map(inputs).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| {
                let total: i64 = batch
                    .iter()
                    .map(|item| calculate_reorder(black_box(item)).recommended_qty)
                    .sum();
                black_box(total)
            });
        });
    }

    group.finish();
}

// Thirty days of sales rows, several per day
fn sales_average_benchmark(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let rows: Vec<(NaiveDate, i32)> = (0..300)
        .map(|i| (start + ChronoDuration::days(i64::from(i % 30)), i % 7 + 1))
        .collect();

    c.bench_function("average_daily_quantity_300_rows", |b| {
        b.iter(|| black_box(average_daily_quantity(black_box(rows.clone()))));
    });
}

fn accuracy_benchmark(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let days: Vec<ObservedDay> = (0..365)
        .map(|i| ObservedDay {
            date: start + ChronoDuration::days(i),
            actual: (i % 13 + 1) as f64,
            predicted: (i % 11 + 1) as f64,
        })
        .collect();

    c.bench_function("forecast_accuracy_365_days", |b| {
        b.iter(|| black_box(evaluate("SKU-1", black_box(&days))));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets =
        reorder_calculation_benchmark,
        sales_average_benchmark,
        accuracy_benchmark
}

criterion_main!(benches);

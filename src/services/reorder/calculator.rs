//! Pure reorder arithmetic. Nothing in here touches a data store.

use serde::Serialize;
use utoipa::ToSchema;

/// Everything the calculation needs for one item, already fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderInputs {
    pub current_stock: i32,
    pub reorder_point: i32,
    pub safety_stock: i32,
    pub item_reorder_qty: Option<i32>,
    pub supplier_min_order_qty: Option<i32>,
    pub horizon_days: u32,
    pub avg_daily_sales: f64,
    pub forecast_demand: f64,
}

/// Result of [`calculate_reorder`]. Fractional values are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReorderCalculation {
    pub forecast_based_qty: f64,
    pub velocity_based_qty: f64,
    pub simple_qty: f64,
    pub min_order_qty: f64,
    pub recommended_qty: i64,
    pub stock_ratio: f64,
    pub urgency_score: f64,
    pub days_remaining: Option<i64>,
}

/// Supplier lead time wins over the item's, which wins over `default_days`.
pub fn effective_lead_time(
    supplier_lead_time: Option<i32>,
    item_lead_time: Option<i32>,
    default_days: u32,
) -> u32 {
    supplier_lead_time
        .or(item_lead_time)
        .map(|days| days.max(0) as u32)
        .unwrap_or(default_days)
}

/// Static reorder quantity: item first, then the supplier minimum, else zero.
pub fn simple_quantity(item_reorder_qty: Option<i32>, supplier_min_order_qty: Option<i32>) -> f64 {
    item_reorder_qty
        .or(supplier_min_order_qty)
        .map(|qty| f64::from(qty.max(0)))
        .unwrap_or(0.0)
}

/// Minimum order quantity: supplier first, then the item quantity, else one.
pub fn min_order_quantity(
    item_reorder_qty: Option<i32>,
    supplier_min_order_qty: Option<i32>,
) -> f64 {
    supplier_min_order_qty
        .or(item_reorder_qty)
        .map(|qty| f64::from(qty.max(0)))
        .unwrap_or(1.0)
}

/// Quantity used when demand figures could not be obtained.
pub fn fallback_quantity(item_reorder_qty: Option<i32>, supplier_min_order_qty: Option<i32>) -> i64 {
    simple_quantity(item_reorder_qty, supplier_min_order_qty)
        .max(min_order_quantity(item_reorder_qty, supplier_min_order_qty))
        .round() as i64
}

/// `clamp(10 - ratio * 10, 0, 10)` where `ratio = stock / max(reorder_point, 1)`.
pub fn urgency_score(current_stock: i32, reorder_point: i32) -> (f64, f64) {
    let ratio = f64::from(current_stock) / f64::from(reorder_point.max(1));
    let urgency = (10.0 - ratio * 10.0).clamp(0.0, 10.0);
    (ratio, urgency)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn calculate_reorder(inputs: &ReorderInputs) -> ReorderCalculation {
    let stock = f64::from(inputs.current_stock);
    let safety = f64::from(inputs.safety_stock.max(0));
    let avg = if inputs.avg_daily_sales.is_finite() {
        inputs.avg_daily_sales.max(0.0)
    } else {
        0.0
    };
    let forecast = if inputs.forecast_demand.is_finite() {
        inputs.forecast_demand.max(0.0)
    } else {
        0.0
    };

    let forecast_based_qty = (forecast + safety - stock).max(0.0);
    let velocity_based_qty = (avg * f64::from(inputs.horizon_days) + safety - stock).max(0.0);
    let simple_qty = simple_quantity(inputs.item_reorder_qty, inputs.supplier_min_order_qty);
    let min_order_qty = min_order_quantity(inputs.item_reorder_qty, inputs.supplier_min_order_qty);

    let recommended_qty = forecast_based_qty
        .max(velocity_based_qty)
        .max(simple_qty)
        .max(min_order_qty)
        .round() as i64;

    let (stock_ratio, urgency) = urgency_score(inputs.current_stock, inputs.reorder_point);

    let days_remaining = if avg > 0.0 {
        Some((stock.max(0.0) / avg).floor() as i64)
    } else {
        None
    };

    ReorderCalculation {
        forecast_based_qty: round2(forecast_based_qty),
        velocity_based_qty: round2(velocity_based_qty),
        simple_qty: round2(simple_qty),
        min_order_qty: round2(min_order_qty),
        recommended_qty,
        stock_ratio: round2(stock_ratio),
        urgency_score: round2(urgency),
        days_remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn inputs() -> ReorderInputs {
        ReorderInputs {
            current_stock: 10,
            reorder_point: 50,
            safety_stock: 5,
            item_reorder_qty: Some(50),
            supplier_min_order_qty: None,
            horizon_days: 21,
            avg_daily_sales: 5.0,
            forecast_demand: 80.0,
        }
    }

    #[test]
    fn blends_three_heuristics() {
        let calc = calculate_reorder(&inputs());

        assert_eq!(calc.forecast_based_qty, 75.0);
        assert_eq!(calc.velocity_based_qty, 100.0);
        assert_eq!(calc.simple_qty, 50.0);
        assert_eq!(calc.min_order_qty, 50.0);
        assert_eq!(calc.recommended_qty, 100);
        assert_eq!(calc.stock_ratio, 0.2);
        assert_eq!(calc.urgency_score, 8.0);
        assert_eq!(calc.days_remaining, Some(2));
    }

    #[test]
    fn no_demand_signal_falls_back_to_static_quantities() {
        let calc = calculate_reorder(&ReorderInputs {
            current_stock: 40,
            reorder_point: 50,
            safety_stock: 0,
            item_reorder_qty: None,
            supplier_min_order_qty: Some(24),
            horizon_days: 21,
            avg_daily_sales: 0.0,
            forecast_demand: 0.0,
        });

        assert_eq!(calc.recommended_qty, 24);
        assert_eq!(calc.days_remaining, None);
    }

    #[test]
    fn nothing_configured_orders_at_least_one() {
        let calc = calculate_reorder(&ReorderInputs {
            current_stock: 3,
            reorder_point: 3,
            safety_stock: 0,
            item_reorder_qty: None,
            supplier_min_order_qty: None,
            horizon_days: 21,
            avg_daily_sales: 0.0,
            forecast_demand: 0.0,
        });

        assert_eq!(calc.simple_qty, 0.0);
        assert_eq!(calc.min_order_qty, 1.0);
        assert_eq!(calc.recommended_qty, 1);
        assert_eq!(calc.urgency_score, 0.0);
    }

    #[test_case(0, 10 => 10.0 ; "empty shelf is maximally urgent")]
    #[test_case(10, 10 => 0.0 ; "at reorder point")]
    #[test_case(5, 10 => 5.0 ; "half way")]
    #[test_case(0, 0 => 10.0 ; "zero reorder point treated as one")]
    #[test_case(3, 0 => 0.0 ; "above a zero reorder point clamps")]
    fn urgency_table(stock: i32, reorder_point: i32) -> f64 {
        round2(urgency_score(stock, reorder_point).1)
    }

    #[test_case(Some(3), Some(9), 7 => 3 ; "supplier wins")]
    #[test_case(None, Some(9), 7 => 9 ; "item when supplier unset")]
    #[test_case(None, None, 7 => 7 ; "default")]
    fn lead_time_priority(supplier: Option<i32>, item: Option<i32>, default: u32) -> u32 {
        effective_lead_time(supplier, item, default)
    }

    #[test]
    fn fallback_is_max_of_simple_and_min() {
        assert_eq!(fallback_quantity(Some(12), Some(30)), 30);
        assert_eq!(fallback_quantity(Some(40), None), 40);
        assert_eq!(fallback_quantity(None, None), 1);
    }

    #[test]
    fn days_remaining_floors() {
        let calc = calculate_reorder(&ReorderInputs {
            current_stock: 7,
            avg_daily_sales: 2.0,
            ..inputs()
        });
        assert_eq!(calc.days_remaining, Some(3));
    }

    proptest! {
        #[test]
        fn recommendation_respects_minimums(
            stock in 0i32..10_000,
            reorder_point in 0i32..10_000,
            safety in 0i32..1_000,
            item_qty in proptest::option::of(0i32..5_000),
            supplier_min in proptest::option::of(0i32..5_000),
            horizon in 0u32..400,
            avg in 0.0f64..500.0,
            forecast in 0.0f64..50_000.0,
        ) {
            let calc = calculate_reorder(&ReorderInputs {
                current_stock: stock,
                reorder_point,
                safety_stock: safety,
                item_reorder_qty: item_qty,
                supplier_min_order_qty: supplier_min,
                horizon_days: horizon,
                avg_daily_sales: avg,
                forecast_demand: forecast,
            });

            prop_assert!(calc.recommended_qty >= 0);
            prop_assert!(calc.recommended_qty as f64 >= calc.min_order_qty);
            prop_assert!((0.0..=10.0).contains(&calc.urgency_score));
            prop_assert!(calc.forecast_based_qty >= 0.0);
            prop_assert!(calc.velocity_based_qty >= 0.0);
        }
    }
}

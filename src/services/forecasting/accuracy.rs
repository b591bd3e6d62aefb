use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

// Guards the percentage metrics against division by zero.
const EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum::Display, strum::EnumString)]
pub enum ForecastQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ForecastQuality {
    /// Buckets a MAPE percentage
    pub fn from_mape(mape: f64) -> Self {
        if mape <= 10.0 {
            ForecastQuality::Excellent
        } else if mape <= 20.0 {
            ForecastQuality::Good
        } else if mape <= 50.0 {
            ForecastQuality::Fair
        } else {
            ForecastQuality::Poor
        }
    }
}

/// A day on which both a prediction and actual sales exist
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedDay {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EvaluationPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_evaluated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mape: f64,
    pub smape: f64,
    pub bias: f64,
    pub bias_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AccuracySummary {
    #[schema(value_type = String)]
    pub forecast_quality: ForecastQuality,
    pub avg_actual: f64,
    pub avg_predicted: f64,
    pub total_actual: f64,
    pub total_predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AccuracyReport {
    pub sku: String,
    pub evaluation_period: EvaluationPeriod,
    pub metrics: AccuracyMetrics,
    pub summary: AccuracySummary,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Scores predictions against actuals. Returns `None` when there is no overlap.
pub fn evaluate(sku: &str, days: &[ObservedDay]) -> Option<AccuracyReport> {
    let start_date = days.iter().map(|d| d.date).min()?;
    let end_date = days.iter().map(|d| d.date).max()?;
    let n = days.len() as f64;

    let mut abs_err = 0.0;
    let mut sq_err = 0.0;
    let mut pct_err = 0.0;
    let mut sym_pct_err = 0.0;
    let mut signed_err = 0.0;
    let mut total_actual = 0.0;
    let mut total_predicted = 0.0;

    for day in days {
        let diff = day.actual - day.predicted;
        abs_err += diff.abs();
        sq_err += diff * diff;
        pct_err += (diff / (day.actual + EPSILON)).abs();
        sym_pct_err += 2.0 * diff.abs() / (day.actual.abs() + day.predicted.abs() + EPSILON);
        signed_err += day.predicted - day.actual;
        total_actual += day.actual;
        total_predicted += day.predicted;
    }

    let mse = sq_err / n;
    let mape = pct_err / n * 100.0;
    let bias = signed_err / n;
    let avg_actual = total_actual / n;

    Some(AccuracyReport {
        sku: sku.to_string(),
        evaluation_period: EvaluationPeriod {
            start_date,
            end_date,
            days_evaluated: days.len(),
        },
        metrics: AccuracyMetrics {
            mae: round_to(abs_err / n, 4),
            mse: round_to(mse, 4),
            rmse: round_to(mse.sqrt(), 4),
            mape: round_to(mape, 4),
            smape: round_to(sym_pct_err / n * 100.0, 4),
            bias: round_to(bias, 4),
            bias_percent: round_to(bias / (avg_actual + EPSILON) * 100.0, 4),
        },
        summary: AccuracySummary {
            forecast_quality: ForecastQuality::from_mape(mape),
            avg_actual: round_to(avg_actual, 2),
            avg_predicted: round_to(total_predicted / n, 2),
            total_actual: round_to(total_actual, 2),
            total_predicted: round_to(total_predicted, 2),
        },
    })
}

use apr_core::period::UnitPeriod;
use apr_core::schedule::{LineItem, LineItemSeries};
use apr_core::solver::{solve, AprCalculator, SolverConfig, DEFAULT_TOLERANCE};
use apr_core::AprError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ===========================================================================
// End-to-end APR scenarios
// ===========================================================================

/// 5000 disbursed on 1978-01-10, repaid by 24 monthly payments of 230.
fn twenty_four_month_note() -> LineItemSeries {
    let mut series = LineItemSeries::new();
    series
        .add(LineItem::disbursement_on(dec!(5000), d(1978, 1, 10)).unwrap())
        .unwrap();
    series
        .add(
            LineItem::payment_on(dec!(230), d(1978, 2, 10))
                .unwrap()
                .recurring(24, UnitPeriod::monthly(1))
                .unwrap(),
        )
        .unwrap();
    series
}

#[test]
fn test_two_year_common_period_converges() {
    let series = twenty_four_month_note().with_common_period(UnitPeriod::monthly(24));
    let mut calculator = AprCalculator::with_series(series);
    let outcome = calculator.calculate().unwrap();

    assert!(outcome.converged);
    assert!(outcome.final_balance().abs() <= 0.001);
    assert!(outcome.iterations < 1000);
    assert!(outcome.apr > 0.0 && outcome.apr < 1.0, "apr = {}", outcome.apr);
}

#[test]
fn test_inferred_monthly_period_converges() {
    let mut calculator = AprCalculator::with_series(twenty_four_month_note());
    let outcome = calculator.calculate().unwrap().clone();

    assert_eq!(calculator.unit_period().unwrap(), Some(UnitPeriod::monthly(1)));
    assert!(outcome.converged);
    // 5000 over 24 x 230 is roughly 9.5% nominal
    assert!(outcome.apr > 0.09 && outcome.apr < 0.10, "apr = {}", outcome.apr);
}

#[test]
fn test_biweekly_payments_infer_two_weeks() {
    let mut series = LineItemSeries::new();
    series
        .add(LineItem::disbursement_on(dec!(1000), d(2021, 1, 1)).unwrap())
        .unwrap();
    let mut due = d(2021, 1, 15);
    for _ in 0..6 {
        series.add(LineItem::payment_on(dec!(175), due).unwrap()).unwrap();
        due += chrono::Duration::days(14);
    }

    let mut calculator = AprCalculator::with_series(series);
    let outcome = calculator.calculate().unwrap().clone();
    assert_eq!(calculator.unit_period().unwrap(), Some(UnitPeriod::weekly(2)));
    assert!(outcome.converged);
    assert!(outcome.apr > 0.0);
}

#[test]
fn test_period_scheduled_items_from_start_date() {
    let mut series = LineItemSeries::new()
        .with_common_period(UnitPeriod::monthly(1))
        .with_start_date(d(2022, 3, 1));
    series
        .add(LineItem::disbursement_after(dec!(1000), 0, 0).unwrap())
        .unwrap();
    for month in 1..=12 {
        series
            .add(LineItem::payment_after(dec!(88.85), month, 0).unwrap())
            .unwrap();
    }

    let mut calculator = AprCalculator::with_series(series);
    let outcome = calculator.calculate().unwrap();
    assert!(outcome.converged);
    assert!((outcome.apr - 0.12).abs() < 1e-3, "apr = {}", outcome.apr);
    assert_eq!(outcome.ledger.entries[12].date, d(2023, 3, 1));
}

// ===========================================================================
// Degenerate and difficult schedules
// ===========================================================================

#[test]
fn test_offsetting_flows_on_one_date_converge_immediately() {
    let mut series = LineItemSeries::new();
    series
        .add(LineItem::disbursement_on(dec!(1000), d(2021, 6, 1)).unwrap())
        .unwrap();
    series
        .add(LineItem::payment_on(dec!(1000), d(2021, 6, 1)).unwrap())
        .unwrap();

    let mut calculator = AprCalculator::with_series(series);
    let outcome = calculator.calculate().unwrap();
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.apr, 0.0);
    assert_eq!(outcome.final_balance(), 0.0);
}

#[test]
fn test_multiple_sign_changes_terminate() {
    let mut series = LineItemSeries::new();
    series
        .add(LineItem::disbursement_on(dec!(1000), d(2021, 1, 1)).unwrap())
        .unwrap();
    series
        .add(LineItem::payment_on(dec!(600), d(2021, 2, 1)).unwrap())
        .unwrap();
    series
        .add(LineItem::disbursement_on(dec!(500), d(2021, 3, 1)).unwrap())
        .unwrap();
    series
        .add(LineItem::payment_on(dec!(1000), d(2021, 4, 1)).unwrap())
        .unwrap();

    let schedule = series.complete().unwrap();
    let outcome = solve(schedule, &SolverConfig::default()).unwrap();
    assert!(outcome.iterations <= 1000);
    if outcome.converged {
        assert!(outcome.final_balance().abs() <= DEFAULT_TOLERANCE);
    }
}

#[test]
fn test_payments_short_of_principal_find_negative_rate() {
    let mut series = LineItemSeries::new();
    series
        .add(LineItem::disbursement_on(dec!(1000), d(2021, 1, 1)).unwrap())
        .unwrap();
    series
        .add(LineItem::payment_on(dec!(950), d(2022, 1, 1)).unwrap())
        .unwrap();

    let mut calculator = AprCalculator::with_series(series);
    let outcome = calculator.calculate().unwrap();
    assert!(outcome.converged);
    assert!(outcome.apr < 0.0, "apr = {}", outcome.apr);
}

#[test]
fn test_offset_items_without_dates_or_period_are_unresolvable() {
    let mut series = LineItemSeries::new().with_start_date(d(2021, 1, 1));
    series
        .add(LineItem::disbursement_after(dec!(1000), 0, 0).unwrap())
        .unwrap();
    series
        .add(LineItem::payment_after(dec!(1100), 1, 0).unwrap())
        .unwrap();

    let mut calculator = AprCalculator::with_series(series);
    assert!(matches!(
        calculator.calculate(),
        Err(AprError::UnresolvablePeriod(_))
    ));
}

// ===========================================================================
// Determinism and concurrency
// ===========================================================================

#[test]
fn test_cloned_series_give_identical_outcomes() {
    let original = twenty_four_month_note();
    let mut first = AprCalculator::with_series(original.clone());
    let mut second = AprCalculator::with_series(original);

    let a = first.calculate().unwrap().clone();
    let b = second.calculate().unwrap().clone();
    assert_eq!(a, b);
    assert_eq!(a.apr.to_bits(), b.apr.to_bits());
}

#[test]
fn test_parallel_passes_over_one_schedule() {
    let mut series = twenty_four_month_note();
    let schedule = series.complete().unwrap();
    let rates = [0.05, 0.08, 0.11, 0.14];

    let parallel: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = rates
            .iter()
            .map(|&rate| scope.spawn(move || schedule.amortize(rate).unwrap().final_balance))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let sequential: Vec<f64> = rates
        .iter()
        .map(|&rate| schedule.amortize(rate).unwrap().final_balance)
        .collect();

    assert_eq!(parallel, sequential);
    assert!(parallel.windows(2).all(|w| w[0] > w[1]));
}

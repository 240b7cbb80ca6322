//! Usage statistics for a single account
//!
//! Every function here is pure: it takes one account's rows, the resolved
//! plan and, where the result depends on the current day, an explicit
//! reference instant whose offset defines the local calendar.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use tally_config::{DEFAULT_DRAIN_PLACE_PREFIX, DEFAULT_IMPORT_PLACE};
use tally_parser::TransactionRecord;

use crate::plans::Plan;
use crate::time::{add_days, days_between, each_day};

/// Round to cents, halves away from zero
pub fn round_to_hundredth(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Reserved place names that change how rows are counted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsOptions {
    /// Place of balance imports
    pub import_place: String,
    /// Prefix of the terminals that drain leftover balance at the end of a term
    pub drain_place_prefix: String,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            import_place: DEFAULT_IMPORT_PLACE.to_string(),
            drain_place_prefix: DEFAULT_DRAIN_PLACE_PREFIX.to_string(),
        }
    }
}

impl StatsOptions {
    pub fn is_import(&self, record: &TransactionRecord) -> bool {
        record.place == self.import_place
    }

    pub fn is_drain(&self, record: &TransactionRecord) -> bool {
        record.place.starts_with(&self.drain_place_prefix)
    }
}

// ==================== Places ====================

/// Place with the highest usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPlace {
    /// `None` when no place has positive usage
    pub name: Option<String>,
    pub used: Decimal,
}

/// Amount used per place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceStats {
    pub by_place: BTreeMap<String, Decimal>,
    pub top: TopPlace,
}

impl PlaceStats {
    /// Places ordered by usage, highest first
    pub fn ranked(&self) -> Vec<(&str, Decimal)> {
        let mut ranked: Vec<(&str, Decimal)> = self
            .by_place
            .iter()
            .map(|(place, used)| (place.as_str(), *used))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Sum spend per place, leaving out imports and balance drains.
///
/// The top place is the first place in name order with the strictly
/// greatest usage.
pub fn place_stats(records: &[TransactionRecord], options: &StatsOptions) -> PlaceStats {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for record in records {
        if options.is_import(record) || options.is_drain(record) {
            continue;
        }
        *totals.entry(record.place.clone()).or_default() -= record.amount;
    }

    let by_place: BTreeMap<String, Decimal> = totals
        .into_iter()
        .map(|(place, used)| (place, round_to_hundredth(used)))
        .collect();

    let mut top = TopPlace {
        name: None,
        used: Decimal::ZERO,
    };
    for (place, used) in &by_place {
        if *used > top.used {
            top = TopPlace {
                name: Some(place.clone()),
                used: *used,
            };
        }
    }

    PlaceStats { by_place, top }
}

// ==================== Aggregate usage ====================

/// Imported funds versus spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateUsageStats {
    /// Sum of import rows, sign preserved
    pub imported_amount: Decimal,
    /// Spend across every other row, positive when money was used
    pub non_imported_amount: Decimal,
}

impl AggregateUsageStats {
    /// Funds available over the plan: the plan amount plus imports
    pub fn total_start_amount(&self, plan: &Plan) -> Decimal {
        plan.total_amount + self.imported_amount
    }

    /// Funds left after spend
    pub fn balance(&self, plan: &Plan) -> Decimal {
        self.total_start_amount(plan) - self.non_imported_amount
    }
}

pub fn aggregate_usage_stats(records: &[TransactionRecord], options: &StatsOptions) -> AggregateUsageStats {
    let (imports, spend): (Vec<&TransactionRecord>, Vec<&TransactionRecord>) =
        records.iter().partition(|record| options.is_import(record));

    AggregateUsageStats {
        imported_amount: round_to_hundredth(imports.iter().map(|r| r.amount).sum()),
        non_imported_amount: round_to_hundredth(-spend.iter().map(|r| r.amount).sum::<Decimal>()),
    }
}

// ==================== Rates ====================

/// Days of the plan elapsed by `today`, capped at the plan length
pub fn days_since_begin(plan: &Plan, today: NaiveDate) -> i64 {
    days_between(plan.plan_start, today).min(plan.duration_days())
}

/// Average daily spend so far; zero before the plan starts
pub fn current_rate(used: Decimal, plan: &Plan, today: NaiveDate) -> Decimal {
    let days = days_since_begin(plan, today);
    if days > 0 {
        used / Decimal::from(days)
    } else {
        Decimal::ZERO
    }
}

/// Daily spend that spreads the starting funds evenly over the plan
pub fn ideal_rate(total_start_amount: Decimal, plan: &Plan) -> Decimal {
    let days = plan.duration_days();
    if days > 0 {
        total_start_amount / Decimal::from(days)
    } else {
        Decimal::ZERO
    }
}

/// Most recent row
pub fn last_activity(records: &[TransactionRecord]) -> Option<&TransactionRecord> {
    records.iter().max_by_key(|r| r.when)
}

// ==================== Forecast ====================

/// How long the balance lasts at the current rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemainingDays {
    /// Balance runs out after `days` more days
    Days { days: Decimal, runs_out_on: Option<NaiveDate> },
    /// Nothing left. When the balance is exactly zero, the number of days
    /// since the last transaction is reported.
    Exhausted { days_since_last_activity: Option<i64> },
    /// Positive balance with no spend so far
    Indefinite,
}

impl RemainingDays {
    /// Whether any balance is left to forecast
    pub fn has_balance(&self) -> bool {
        !matches!(self, RemainingDays::Exhausted { .. })
    }
}

/// Point-in-time projection of the balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastStats {
    pub balance: Decimal,
    pub days_since_begin: i64,
    pub days_until_end: i64,
    pub current_rate: Decimal,
    /// Daily spend that exhausts the balance on the last plan day;
    /// `None` once the plan has ended
    pub required_rate: Option<Decimal>,
    pub remaining: RemainingDays,
}

pub fn forecast_stats(
    records: &[TransactionRecord],
    plan: &Plan,
    total_start_amount: Decimal,
    used: Decimal,
    now: &DateTime<FixedOffset>,
) -> ForecastStats {
    let today = now.date_naive();
    let balance = total_start_amount - used;

    let days_since_begin = days_since_begin(plan, today);
    let days_until_end = days_between(today, plan.plan_end);
    let current_rate = current_rate(used, plan, today);
    let required_rate = if days_until_end > 0 {
        Some(balance / Decimal::from(days_until_end))
    } else {
        None
    };

    let remaining = if balance.is_zero() {
        let last = last_activity(records).and_then(|r| r.local_date(&now.timezone()));
        RemainingDays::Exhausted {
            days_since_last_activity: last.map(|day| (today - day).num_days()),
        }
    } else if current_rate.is_zero() {
        if balance.is_sign_positive() {
            RemainingDays::Indefinite
        } else {
            RemainingDays::Exhausted {
                days_since_last_activity: None,
            }
        }
    } else {
        let days = balance / current_rate;
        if days <= Decimal::ZERO {
            RemainingDays::Exhausted {
                days_since_last_activity: None,
            }
        } else {
            let whole_days: Option<i64> = days.trunc().to_i64();
            RemainingDays::Days {
                days: round_to_hundredth(days),
                runs_out_on: whole_days.and_then(|n| add_days(today, n)),
            }
        }
    };

    ForecastStats {
        balance: round_to_hundredth(balance),
        days_since_begin,
        days_until_end,
        current_rate,
        required_rate,
        remaining,
    }
}

// ==================== Trend ====================

/// Remaining funds at the start of one plan day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub ideal_remaining: Decimal,
    pub actual_remaining: Decimal,
}

/// Actual versus linear depletion across the whole plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendStats {
    pub usage_over_time: Vec<TrendPoint>,
    pub current_rate: Decimal,
    pub ideal_rate: Decimal,
}

/// Net spend per local calendar day
fn spend_by_day(records: &[TransactionRecord], offset: &FixedOffset) -> HashMap<NaiveDate, Decimal> {
    let mut spend: HashMap<NaiveDate, Decimal> = HashMap::new();
    for record in records {
        if let Some(day) = record.local_date(offset) {
            *spend.entry(day).or_default() -= record.amount;
        }
    }
    spend
}

/// Day-by-day remaining funds from the first to the last plan day.
///
/// Each point holds the balance at the start of its day, before that day's
/// spend (actual) or the ideal daily rate (ideal) is taken off.
pub fn trend_stats(
    records: &[TransactionRecord],
    plan: &Plan,
    total_start_amount: Decimal,
    used: Decimal,
    now: &DateTime<FixedOffset>,
) -> TrendStats {
    let ideal_rate = ideal_rate(total_start_amount, plan);
    let spend = spend_by_day(records, &now.timezone());

    let mut usage_over_time = Vec::with_capacity(plan.duration_days().max(0) as usize);
    let mut ideal_remaining = total_start_amount;
    let mut actual_remaining = total_start_amount;

    for day in each_day(plan.plan_start, plan.plan_end) {
        usage_over_time.push(TrendPoint {
            day,
            ideal_remaining: round_to_hundredth(ideal_remaining),
            actual_remaining: round_to_hundredth(actual_remaining),
        });

        ideal_remaining -= ideal_rate;
        if let Some(spent) = spend.get(&day) {
            actual_remaining -= *spent;
        }
    }

    TrendStats {
        usage_over_time,
        current_rate: current_rate(used, plan, now.date_naive()),
        ideal_rate,
    }
}

// ==================== Tests ====================

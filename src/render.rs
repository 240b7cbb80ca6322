//! Plain text rendering of reports for the terminal

use std::fmt::Write;

use tally_core::{AccountReport, RemainingDays, Report};
use tally_utils::{long_date, money, rate, short_date};

/// Trend rows printed per account, evenly spaced over the plan
const TREND_SAMPLES: usize = 8;

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} rows, generated {}",
        report.row_count,
        long_date(report.generated_at.date_naive())
    );

    for account in &report.accounts {
        out.push('\n');
        render_account(&mut out, account);
    }

    if !report.unsupported.is_empty() {
        out.push('\n');
        for skipped in &report.unsupported {
            let _ = writeln!(out, "unsupported plan: {} ({})", skipped.account, skipped.reason);
        }
    }
    out
}

fn render_account(out: &mut String, account: &AccountReport) {
    let plan = &account.plan;
    let _ = writeln!(out, "{}", account.account);
    let _ = writeln!(
        out,
        "  plan      {}: {} - {} ({} days)",
        plan.term,
        long_date(plan.plan_start),
        long_date(plan.plan_end),
        account.plan_days
    );
    let _ = writeln!(out, "  original  {}", money(plan.total_amount));
    let _ = writeln!(out, "  imported  {}", money(account.usage.imported_amount));
    let _ = writeln!(out, "  used      {}", money(-account.usage.non_imported_amount));
    let _ = writeln!(out, "  balance   {}", money(account.balance));

    let trend = &account.trend;
    let _ = writeln!(
        out,
        "\n  trend     actual {}, ideal {}",
        rate(trend.current_rate),
        rate(trend.ideal_rate)
    );
    let points = &trend.usage_over_time;
    let step = (points.len() / TREND_SAMPLES).max(1);
    for point in points.iter().step_by(step) {
        let _ = writeln!(
            out,
            "    {:<12} ideal {:>12}  actual {:>12}",
            short_date(point.day),
            money(point.ideal_remaining),
            money(point.actual_remaining)
        );
    }

    let places = &account.places;
    match &places.top.name {
        Some(name) => {
            let _ = writeln!(out, "\n  places    top: {} ({})", name, money(places.top.used));
        }
        None => {
            let _ = writeln!(out, "\n  places    top: N/A");
        }
    }
    for (place, used) in places.ranked() {
        let _ = writeln!(out, "    {:<32} {:>12}", place, money(used));
    }

    let forecast = &account.forecast;
    out.push('\n');
    match &forecast.remaining {
        RemainingDays::Exhausted {
            days_since_last_activity: Some(days),
        } => {
            let _ = writeln!(out, "  forecast  no balance remaining (last used {} days ago)", days);
        }
        RemainingDays::Exhausted { .. } => {
            let _ = writeln!(out, "  forecast  no balance remaining");
        }
        RemainingDays::Indefinite => {
            let _ = writeln!(out, "  forecast  nothing used yet, balance lasts indefinitely");
        }
        RemainingDays::Days { days, runs_out_on } => {
            let _ = writeln!(
                out,
                "  forecast  used {} over the past {} days",
                rate(forecast.current_rate),
                forecast.days_since_begin
            );
            let on = runs_out_on.map(long_date).unwrap_or_else(|| "an unknown date".to_string());
            let _ = writeln!(out, "            at this rate, plan will run out in {} days, on {}", days, on);
            match forecast.required_rate {
                Some(required) => {
                    let _ = writeln!(
                        out,
                        "            use {} to instead run out on {}",
                        rate(required),
                        long_date(plan.plan_end)
                    );
                }
                None => {
                    let _ = writeln!(out, "            plan ended on {}", long_date(plan.plan_end));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use tally_config::Config;
    use tally_core::Tally;

    const TABLE: &str = "Fall Flex 500\t2024-10-05 09:15:00\tPort City Java\t-$4.50\n\
        Guest Pass\t2024-10-04 12:00:00\tFountain Dining Hall\t-$9.00\n\
        Fall Flex 500\t2024-09-01 18:30:00\tFountain Dining Hall\t-$1,200.00\n\
        Fall Flex 500\t2024-08-20 09:00:00\tPatronImport Location\t$1,000.00\n";

    fn report() -> Report {
        let mut config = Config::default();
        config.report.utc_offset = Some("-05:00".to_string());
        let tally = Tally::new(&config);
        let now = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 10, 6, 12, 0, 0)
            .unwrap();
        let encoded = tally.submit(TABLE).unwrap().encoded;
        tally.report(&encoded, None, &now).unwrap()
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&report());

        assert!(text.starts_with("4 rows, generated October 6, 2024"));
        assert!(text.contains("plan      Fall: August 11, 2024 - December 11, 2024 (123 days)"));
        assert!(text.contains("used      -$1,204.50"));
        assert!(text.contains("balance   $295.50"));
        assert!(text.contains("top: Fountain Dining Hall ($1,200.00)"));
        assert!(text.contains("Aug 11, 24"));
        assert!(text.contains("unsupported plan: Guest Pass"));
    }

    #[test]
    fn test_places_sorted_by_usage() {
        let text = render_report(&report());
        let fountain = text.find("    Fountain Dining Hall").unwrap();
        let java = text.find("    Port City Java").unwrap();
        assert!(fountain < java);
    }
}

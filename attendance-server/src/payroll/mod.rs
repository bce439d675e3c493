//! Payroll calculator
//!
//! Derives a period salary figure from base salary, attendance counts and
//! adjustment sums. Pure functions over [`Decimal`]; callers convert the
//! stored `f64` amounts at this boundary and all arithmetic happens in
//! decimal.
//!
//! Each calling surface historically used its own formula; they are kept as
//! explicit [`Variant`]s of a single `compute` entry point rather than
//! silently diverging per call site.

use rust_decimal::Decimal;

/// Flat deduction per late mark.
pub const LATE_DEDUCTION: u32 = 400;

/// Absences forgiven before per-day deductions start (self report).
pub const ABSENCE_GRACE: u32 = 4;

/// Paid off-days credited in the per-user team detail.
pub const FIXED_PAID_OFFS: u32 = 4;

/// Flat travel allowance for eligible users in the team detail view.
pub const FLAT_TRAVEL_ALLOWANCE: u32 = 5000;

/// Divisor for the nominal day rate when no month length applies.
const NOMINAL_MONTH_DAYS: u32 = 30;

/// Attendance counts and per-record adjustment sums over one period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub off: u32,
    /// Sum of per-record bonus amounts.
    pub bonus: Decimal,
    /// Sum of per-record penalty amounts.
    pub penalty: Decimal,
}

impl PeriodTotals {
    pub fn total_marked(&self) -> u32 {
        self.present + self.late + self.absent + self.off
    }
}

/// Ledger sums over the same period, separate from per-record amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerSums {
    pub penalties: Decimal,
    pub clearances: Decimal,
}

/// Which calling surface's formula to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Agent's own monthly report.
    SelfReport,
    /// Admin spreadsheet export; prorated by actual month length.
    AdminExport { days_in_month: u32 },
    /// Supervisor per-user detail; prorated, fixed paid offs, flat travel
    /// allowance.
    TeamDetail { days_in_month: u32 },
    /// Supervisor roster summary line.
    RosterSummary,
}

/// Everything a single payroll figure needs.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInput {
    pub base_salary: Decimal,
    pub travel_allowance: Decimal,
    pub travel_allowance_eligible: bool,
    pub totals: PeriodTotals,
    pub ledger: LedgerSums,
}

/// Compute the period figure for one user, rounded to 2 decimal places.
///
/// With no marked records (or a zero-day month) every variant degrades to
/// the unmodified base salary.
pub fn compute(variant: Variant, input: &PayrollInput) -> Decimal {
    let salary = input.base_salary;
    let totals = &input.totals;

    if totals.total_marked() == 0 {
        return salary.round_dp(2);
    }

    let figure = match variant {
        Variant::SelfReport => self_report(input),
        Variant::AdminExport { days_in_month } => {
            if days_in_month == 0 {
                return salary.round_dp(2);
            }
            admin_export(input, days_in_month)
        }
        Variant::TeamDetail { days_in_month } => {
            if days_in_month == 0 {
                return salary.round_dp(2);
            }
            team_detail(input, days_in_month)
        }
        Variant::RosterSummary => roster_summary(input),
    };

    figure.round_dp(2)
}

/// `S + T + B - Pn - L*400 - max(A - 4, 0) * (S/30)`
fn self_report(input: &PayrollInput) -> Decimal {
    let totals = &input.totals;
    let day_rate = input.base_salary / Decimal::from(NOMINAL_MONTH_DAYS);
    let excess_absences = totals.absent.saturating_sub(ABSENCE_GRACE);

    input.base_salary + travel_allowance(input) + totals.bonus
        - totals.penalty
        - Decimal::from(totals.late) * Decimal::from(LATE_DEDUCTION)
        - Decimal::from(excess_absences) * day_rate
}

/// `r = S/D; P*r + L*(r - 400) + O*r + B - (Pn + ledger penalties)
/// + ledger clearances`
fn admin_export(input: &PayrollInput, days_in_month: u32) -> Decimal {
    let totals = &input.totals;
    let rate = input.base_salary / Decimal::from(days_in_month);

    let earned_days = Decimal::from(totals.present) * rate
        + Decimal::from(totals.late) * (rate - Decimal::from(LATE_DEDUCTION))
        + Decimal::from(totals.off) * rate;

    earned_days + totals.bonus - (totals.penalty + input.ledger.penalties)
        + input.ledger.clearances
}

/// `r = S/D; P*r + 4*r - L*400 - Pn + B + T`
fn team_detail(input: &PayrollInput, days_in_month: u32) -> Decimal {
    let totals = &input.totals;
    let rate = input.base_salary / Decimal::from(days_in_month);

    Decimal::from(totals.present) * rate + Decimal::from(FIXED_PAID_OFFS) * rate
        - Decimal::from(totals.late) * Decimal::from(LATE_DEDUCTION)
        - totals.penalty
        + totals.bonus
        + team_travel_allowance(input)
}

/// `(P + O) * (S/30) + B - Pn`
fn roster_summary(input: &PayrollInput) -> Decimal {
    let totals = &input.totals;
    let day_rate = input.base_salary / Decimal::from(NOMINAL_MONTH_DAYS);

    Decimal::from(totals.present + totals.off) * day_rate + totals.bonus - totals.penalty
}

fn travel_allowance(input: &PayrollInput) -> Decimal {
    if input.travel_allowance_eligible {
        input.travel_allowance
    } else {
        Decimal::ZERO
    }
}

/// The team detail historically ignores the configured per-user amount and
/// credits a flat figure.
fn team_travel_allowance(input: &PayrollInput) -> Decimal {
    if input.travel_allowance_eligible {
        Decimal::from(FLAT_TRAVEL_ALLOWANCE)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(base_salary: u32, totals: PeriodTotals, ledger: LedgerSums) -> PayrollInput {
        PayrollInput {
            base_salary: Decimal::from(base_salary),
            travel_allowance: Decimal::ZERO,
            travel_allowance_eligible: false,
            totals,
            ledger,
        }
    }

    #[test]
    fn admin_export_reference_figure() {
        // 30000 over 30 days: 26 present, 2 late, 1 off, 500 bonus,
        // 200 penalty -> 28500.
        let totals = PeriodTotals {
            present: 26,
            late: 2,
            absent: 1,
            off: 1,
            bonus: Decimal::from(500),
            penalty: Decimal::from(200),
        };
        let figure = compute(
            Variant::AdminExport { days_in_month: 30 },
            &input(30000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(28500));
    }

    #[test]
    fn admin_export_subtracts_ledger_sums() {
        let totals = PeriodTotals {
            present: 26,
            late: 2,
            absent: 1,
            off: 1,
            bonus: Decimal::from(500),
            penalty: Decimal::from(200),
        };
        let ledger = LedgerSums {
            penalties: Decimal::from(1000),
            clearances: Decimal::from(300),
        };
        let figure = compute(
            Variant::AdminExport { days_in_month: 30 },
            &input(30000, totals, ledger),
        );
        assert_eq!(figure, Decimal::from(28500 - 1000 + 300));
    }

    #[test]
    fn no_records_returns_base_salary() {
        for variant in [
            Variant::SelfReport,
            Variant::AdminExport { days_in_month: 30 },
            Variant::TeamDetail { days_in_month: 31 },
            Variant::RosterSummary,
        ] {
            let figure = compute(
                variant,
                &input(45000, PeriodTotals::default(), LedgerSums::default()),
            );
            assert_eq!(figure, Decimal::from(45000));
        }
    }

    #[test]
    fn zero_day_month_returns_base_salary() {
        let totals = PeriodTotals {
            present: 1,
            ..Default::default()
        };
        let figure = compute(
            Variant::AdminExport { days_in_month: 0 },
            &input(45000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(45000));
    }

    #[test]
    fn self_report_absence_grace() {
        // 4 absences are forgiven entirely.
        let totals = PeriodTotals {
            present: 22,
            absent: 4,
            ..Default::default()
        };
        let figure = compute(
            Variant::SelfReport,
            &input(30000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(30000));

        // The sixth absence costs two day rates (30000/30 = 1000 each).
        let totals = PeriodTotals {
            present: 20,
            absent: 6,
            ..Default::default()
        };
        let figure = compute(
            Variant::SelfReport,
            &input(30000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(28000));
    }

    #[test]
    fn self_report_late_deduction() {
        let totals = PeriodTotals {
            present: 25,
            late: 3,
            ..Default::default()
        };
        let figure = compute(
            Variant::SelfReport,
            &input(30000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(30000 - 3 * 400));
    }

    #[test]
    fn self_report_includes_travel_allowance_when_eligible() {
        let totals = PeriodTotals {
            present: 26,
            ..Default::default()
        };
        let mut payroll_input = input(30000, totals, LedgerSums::default());
        payroll_input.travel_allowance = Decimal::from(2500);

        // Not eligible: allowance ignored.
        assert_eq!(
            compute(Variant::SelfReport, &payroll_input),
            Decimal::from(30000)
        );

        payroll_input.travel_allowance_eligible = true;
        assert_eq!(
            compute(Variant::SelfReport, &payroll_input),
            Decimal::from(32500)
        );
    }

    #[test]
    fn team_detail_credits_fixed_offs_and_flat_allowance() {
        // r = 31000/31 = 1000; 25*1000 + 4*1000 - 2*400 = 28200; +5000 flat
        // when eligible, regardless of the configured amount.
        let totals = PeriodTotals {
            present: 25,
            late: 2,
            absent: 2,
            off: 2,
            ..Default::default()
        };
        let mut payroll_input = input(31000, totals, LedgerSums::default());
        payroll_input.travel_allowance = Decimal::from(1234);

        assert_eq!(
            compute(Variant::TeamDetail { days_in_month: 31 }, &payroll_input),
            Decimal::from(28200)
        );

        payroll_input.travel_allowance_eligible = true;
        assert_eq!(
            compute(Variant::TeamDetail { days_in_month: 31 }, &payroll_input),
            Decimal::from(33200)
        );
    }

    #[test]
    fn roster_summary_counts_present_and_off() {
        // (24 + 2) * 1500 = 39000; +300 bonus - 100 penalty.
        let totals = PeriodTotals {
            present: 24,
            late: 1,
            absent: 1,
            off: 2,
            bonus: Decimal::from(300),
            penalty: Decimal::from(100),
        };
        let figure = compute(
            Variant::RosterSummary,
            &input(45000, totals, LedgerSums::default()),
        );
        assert_eq!(figure, Decimal::from(39200));
    }

    #[test]
    fn figures_are_rounded_to_cents() {
        let totals = PeriodTotals {
            present: 1,
            ..Default::default()
        };
        let figure = compute(
            Variant::AdminExport { days_in_month: 31 },
            &input(10000, totals, LedgerSums::default()),
        );
        // 10000/31 = 322.5806...
        assert_eq!(figure.to_string(), "322.58");
    }
}

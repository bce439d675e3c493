//! Reporting and CSV export
//!
//! Builds monthly attendance grids and serializes them with the `csv`
//! crate into in-memory buffers; handlers own the HTTP headers.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use shared::models::{Attendance, AttendanceStatus, User};

use crate::payroll::{self, LedgerSums, PayrollInput, PeriodTotals, Variant};
use crate::utils::{AppError, AppResult};

/// One user's row in the monthly grid.
#[derive(Debug, Clone)]
pub struct GridRow {
    pub user_id: i64,
    pub name: String,
    /// One cell per calendar day: `P`, `L`, `A`, `Off` or blank.
    pub cells: Vec<String>,
    pub totals: PeriodTotals,
    /// Ledger sums for the same month, fed into the payroll column.
    pub ledger: LedgerSums,
    pub payroll: Decimal,
}

/// Convert a stored f64 amount into a decimal, treating NaN as zero.
pub fn amount(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn status_cell(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "P",
        AttendanceStatus::Late => "L",
        AttendanceStatus::Absent => "A",
        AttendanceStatus::Off => "Off",
    }
}

/// Fold a user's records into per-status counts and amount sums.
///
/// The `is_late` flag decides the late count; a non-late row with a Late
/// status still counts as attended.
pub fn totals_from_records(records: &[Attendance]) -> PeriodTotals {
    let mut totals = PeriodTotals::default();
    for record in records {
        if record.is_late {
            totals.late += 1;
        } else {
            match record.status {
                AttendanceStatus::Present | AttendanceStatus::Late => totals.present += 1,
                AttendanceStatus::Absent => totals.absent += 1,
                AttendanceStatus::Off => totals.off += 1,
            }
        }
        totals.bonus += amount(record.bonus);
        totals.penalty += amount(record.penalty);
    }
    totals
}

/// Build the grid rows for one company's month.
///
/// `users` arrive pre-ordered (supervisors first); `records` may span every
/// user in the company. Two records landing on the same (user, day) keep
/// whichever status ranks higher (Present > Late > Off > Absent).
pub fn build_grid(
    users: &[User],
    records: &[Attendance],
    ledger_by_user: &HashMap<i64, LedgerSums>,
    month_dates: &[NaiveDate],
) -> Vec<GridRow> {
    let mut by_user: HashMap<i64, HashMap<u32, AttendanceStatus>> = HashMap::new();
    let mut user_records: HashMap<i64, Vec<Attendance>> = HashMap::new();

    for record in records {
        let day = record.date.day();
        let day_map = by_user.entry(record.user_id).or_default();
        match day_map.get(&day) {
            Some(existing)
                if existing.export_priority() <= record.status.export_priority() => {}
            _ => {
                day_map.insert(day, record.status);
            }
        }
        user_records
            .entry(record.user_id)
            .or_default()
            .push(record.clone());
    }

    let days_in_month = month_dates.len() as u32;

    users
        .iter()
        .map(|user| {
            let day_map = by_user.get(&user.id);
            let cells = month_dates
                .iter()
                .map(|date| {
                    day_map
                        .and_then(|m| m.get(&date.day()))
                        .map(|s| status_cell(*s).to_string())
                        .unwrap_or_default()
                })
                .collect();

            let totals = user_records
                .get(&user.id)
                .map(|records| totals_from_records(records))
                .unwrap_or_default();
            let ledger = ledger_by_user.get(&user.id).copied().unwrap_or_default();

            let payroll = payroll::compute(
                Variant::AdminExport { days_in_month },
                &PayrollInput {
                    base_salary: amount(user.salary),
                    travel_allowance: amount(user.travel_allowance_amount),
                    travel_allowance_eligible: user.travel_allowance_eligible,
                    totals,
                    ledger,
                },
            );

            GridRow {
                user_id: user.id,
                name: user.full_name(),
                cells,
                totals,
                ledger,
                payroll,
            }
        })
        .collect()
}

/// Serialize grid rows as the attendance spreadsheet.
///
/// Header: `Name`, one column per day number, then summary and payroll
/// columns. Zero rows still produce the header line.
pub fn attendance_csv(rows: &[GridRow], month_dates: &[NaiveDate]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Name".to_string()];
    header.extend(month_dates.iter().map(|d| d.day().to_string()));
    header.extend(
        ["Present", "Late", "Absent", "Off", "Bonus", "Penalty", "Salary"]
            .iter()
            .map(|s| s.to_string()),
    );
    writer
        .write_record(&header)
        .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;

    for row in rows {
        let mut record = vec![row.name.clone()];
        record.extend(row.cells.iter().cloned());
        record.push(row.totals.present.to_string());
        record.push(row.totals.late.to_string());
        record.push(row.totals.absent.to_string());
        record.push(row.totals.off.to_string());
        record.push(row.totals.bonus.round_dp(2).to_string());
        record.push(row.totals.penalty.round_dp(2).to_string());
        record.push(row.payroll.to_string());
        writer
            .write_record(&record)
            .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV flush failed: {e}")))
}

/// All-user export with the legacy column set.
pub fn users_csv(users: &[User], company_names: &HashMap<i64, String>) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "ID", "Name", "Username", "Email", "Role", "Company", "Shift", "Salary",
        ])
        .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;

    for user in users {
        let company = user
            .company_id
            .and_then(|id| company_names.get(&id))
            .cloned()
            .unwrap_or_default();
        let shift = user.shift.map(|s| s.to_string()).unwrap_or_default();
        writer
            .write_record([
                user.id.to_string(),
                user.full_name(),
                user.username.clone(),
                user.email.clone(),
                user.role.to_string(),
                company,
                shift,
                format!("{:.2}", user.salary),
            ])
            .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV flush failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Role;

    fn user(id: i64, first: &str, salary: f64) -> User {
        User {
            id,
            first_name: first.into(),
            last_name: "Khan".into(),
            username: first.to_lowercase(),
            email: format!("{first}@example.com"),
            password_hash: String::new(),
            role: Role::Agent,
            shift: None,
            company_id: Some(1),
            salary,
            is_active: true,
            travel_allowance_eligible: false,
            travel_allowance_amount: 0.0,
            cnic: None,
            father_name: None,
            contact_number: None,
            emergency_contact: None,
            whatsapp_number: None,
            blood_group: None,
            current_address: None,
            permanent_address: None,
            profile_locked: false,
            created_at: 0,
        }
    }

    fn record(user_id: i64, day: u32, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: 0,
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            status,
            is_late: status == AttendanceStatus::Late,
            bonus: 0.0,
            penalty: 0.0,
            marked_by: None,
            marked_at: 0,
        }
    }

    #[test]
    fn late_flag_drives_the_late_count() {
        let mut on_time = record(1, 3, AttendanceStatus::Late);
        on_time.is_late = false;
        let mut flagged = record(1, 4, AttendanceStatus::Present);
        flagged.is_late = true;

        let totals = totals_from_records(&[
            record(1, 1, AttendanceStatus::Present),
            record(1, 2, AttendanceStatus::Late),
            on_time,
            flagged,
        ]);
        assert_eq!(totals.late, 2);
        assert_eq!(totals.present, 2);
        assert_eq!(totals.absent, 0);
    }

    fn march_dates() -> Vec<NaiveDate> {
        (1..=31)
            .map(|d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap())
            .collect()
    }

    #[test]
    fn grid_places_cells_on_marked_days() {
        let users = vec![user(1, "Ali", 31000.0)];
        let records = vec![
            record(1, 1, AttendanceStatus::Present),
            record(1, 2, AttendanceStatus::Late),
            record(1, 5, AttendanceStatus::Off),
        ];
        let rows = build_grid(&users, &records, &HashMap::new(), &march_dates());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells[0], "P");
        assert_eq!(rows[0].cells[1], "L");
        assert_eq!(rows[0].cells[2], "");
        assert_eq!(rows[0].cells[4], "Off");
        assert_eq!(rows[0].totals.present, 1);
        assert_eq!(rows[0].totals.late, 1);
    }

    #[test]
    fn duplicate_day_keeps_higher_priority_status() {
        let users = vec![user(1, "Ali", 31000.0)];
        let records = vec![
            record(1, 3, AttendanceStatus::Absent),
            record(1, 3, AttendanceStatus::Present),
            record(1, 4, AttendanceStatus::Present),
            record(1, 4, AttendanceStatus::Off),
        ];
        let rows = build_grid(&users, &records, &HashMap::new(), &march_dates());

        assert_eq!(rows[0].cells[2], "P");
        assert_eq!(rows[0].cells[3], "P");
    }

    #[test]
    fn empty_roster_yields_header_only() {
        let csv = attendance_csv(&[], &march_dates()).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Name,1,2,"));
    }

    #[test]
    fn users_csv_header_matches_legacy_export() {
        let csv = users_csv(&[], &HashMap::new()).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(
            text.trim_end(),
            "ID,Name,Username,Email,Role,Company,Shift,Salary"
        );
    }

    #[test]
    fn users_csv_resolves_company_names() {
        let mut names = HashMap::new();
        names.insert(1, "Falcon".to_string());
        let csv = users_csv(&[user(9, "Ali", 30000.0)], &names).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "9,Ali Khan,ali,Ali@example.com,agent,Falcon,,30000.00");
    }
}

//! Report handlers
//!
//! Thin orchestration: load ledger slices, hand them to the payroll and
//! report modules, shape the response.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::models::User;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{
    adjustment as adjustment_repo, attendance as attendance_repo, company as company_repo,
    user as user_repo,
};
use crate::payroll::{self, LedgerSums, PayrollInput, PeriodTotals, Variant};
use crate::report::{self, amount};
use crate::utils::time::{month_dates, month_start, parse_month, today_in};
use crate::utils::{ok, AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub company_id: Option<i64>,
    pub month: Option<String>,
}

/// One user's monthly payroll summary.
#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub user_id: i64,
    pub full_name: String,
    pub month: String,
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub off: u32,
    pub bonus: Decimal,
    pub penalty: Decimal,
    pub salary: Decimal,
}

struct MonthWindow {
    year: i32,
    month: u32,
    start: NaiveDate,
    end: NaiveDate,
    days: u32,
    label: String,
}

fn resolve_month(state: &ServerState, month: Option<&str>) -> AppResult<MonthWindow> {
    let (year, month) = match month {
        Some(m) => parse_month(m)?,
        None => {
            let today = today_in(state.config.business_timezone);
            (today.year(), today.month())
        }
    };
    let dates = month_dates(year, month)?;
    let start = month_start(year, month)?;
    let end = dates
        .last()
        .copied()
        .ok_or_else(|| AppError::validation("Empty month"))?;
    Ok(MonthWindow {
        year,
        month,
        start,
        end,
        days: dates.len() as u32,
        label: format!("{year}-{month:02}"),
    })
}

async fn ledger_for(
    state: &ServerState,
    user_id: i64,
    window: &MonthWindow,
) -> AppResult<LedgerSums> {
    let next = window
        .end
        .succ_opt()
        .ok_or_else(|| AppError::validation("Month end out of range"))?;
    let (start_ms, end_ms) = adjustment_repo::month_window_millis(window.start, next);

    let penalties = adjustment_repo::sum_penalties_in_window(&state.db, user_id, start_ms, end_ms)
        .await
        .map_err(AppError::from)?;
    let clearances =
        adjustment_repo::sum_clearances_in_window(&state.db, user_id, start_ms, end_ms)
            .await
            .map_err(AppError::from)?;

    Ok(LedgerSums {
        penalties: amount(penalties),
        clearances: amount(clearances),
    })
}

async fn report_for(
    state: &ServerState,
    user: &User,
    window: &MonthWindow,
    variant: Variant,
    ledger: LedgerSums,
) -> AppResult<MonthlyReport> {
    let (counts, bonus, penalty) =
        attendance_repo::summarize_range(&state.db, user.id, window.start, window.end)
            .await
            .map_err(AppError::from)?;
    let totals = PeriodTotals {
        present: counts.present as u32,
        late: counts.late as u32,
        absent: counts.absent as u32,
        off: counts.off as u32,
        bonus: amount(bonus),
        penalty: amount(penalty),
    };

    let salary = payroll::compute(
        variant,
        &PayrollInput {
            base_salary: amount(user.salary),
            travel_allowance: amount(user.travel_allowance_amount),
            travel_allowance_eligible: user.travel_allowance_eligible,
            totals,
            ledger,
        },
    );

    Ok(MonthlyReport {
        user_id: user.id,
        full_name: user.full_name(),
        month: window.label.clone(),
        present: totals.present,
        late: totals.late,
        absent: totals.absent,
        off: totals.off,
        bonus: totals.bonus.round_dp(2),
        penalty: totals.penalty.round_dp(2),
        salary,
    })
}

pub async fn own_report(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<impl IntoResponse> {
    let window = resolve_month(&state, query.month.as_deref())?;
    let user = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;

    let report = report_for(
        &state,
        &user,
        &window,
        Variant::SelfReport,
        LedgerSums::default(),
    )
    .await?;
    Ok(ok(report))
}

pub async fn team_report(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<impl IntoResponse> {
    if !current.is_supervisor() {
        return Err(AppError::forbidden("Supervisor access required"));
    }
    let company_id = current
        .company_id
        .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;

    let window = resolve_month(&state, query.month.as_deref())?;
    let agents = user_repo::list_agents_by_company(&state.db, company_id)
        .await
        .map_err(AppError::from)?;

    let mut reports = Vec::with_capacity(agents.len());
    for agent in &agents {
        let report = report_for(
            &state,
            agent,
            &window,
            Variant::RosterSummary,
            LedgerSums::default(),
        )
        .await?;
        reports.push(report);
    }

    Ok(ok(reports))
}

pub async fn user_report(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> AppResult<impl IntoResponse> {
    let user = if current.is_admin() {
        user_repo::find_by_id(&state.db, id)
            .await
            .map_err(AppError::from)?
    } else if current.is_supervisor() {
        let company_id = current
            .company_id
            .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;
        user_repo::find_agent_in_company(&state.db, id, company_id)
            .await
            .map_err(AppError::from)?
    } else {
        return Err(AppError::forbidden("Supervisor access required"));
    };

    let window = resolve_month(&state, query.month.as_deref())?;
    let report = report_for(
        &state,
        &user,
        &window,
        Variant::TeamDetail {
            days_in_month: window.days,
        },
        LedgerSums::default(),
    )
    .await?;
    Ok(ok(report))
}

pub async fn attendance_csv(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let company_id = if current.is_admin() {
        query
            .company_id
            .ok_or_else(|| AppError::validation("company_id is required"))?
    } else if current.is_supervisor() {
        let own = current
            .company_id
            .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;
        if let Some(requested) = query.company_id
            && requested != own
        {
            return Err(AppError::forbidden(
                "You can only export your own company",
            ));
        }
        own
    } else {
        return Err(AppError::forbidden("Export access required"));
    };

    let company = company_repo::find_by_id(&state.db, company_id)
        .await
        .map_err(AppError::from)?;
    let window = resolve_month(&state, query.month.as_deref())?;
    let dates = month_dates(window.year, window.month)?;

    let users = user_repo::list_for_export(&state.db, company_id)
        .await
        .map_err(AppError::from)?;
    let records =
        attendance_repo::list_for_company_range(&state.db, company_id, window.start, window.end)
            .await
            .map_err(AppError::from)?;

    let mut ledger_by_user = HashMap::new();
    for user in &users {
        ledger_by_user.insert(user.id, ledger_for(&state, user.id, &window).await?);
    }

    let rows = report::build_grid(&users, &records, &ledger_by_user, &dates);
    let csv = report::attendance_csv(&rows, &dates)?;

    let filename = format!(
        "attendance-{}-{}.csv",
        company.name.to_lowercase().replace(' ', "-"),
        window.label
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

pub async fn users_csv(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }

    let users = user_repo::list_all(&state.db).await.map_err(AppError::from)?;
    let companies = company_repo::list_with_counts(&state.db)
        .await
        .map_err(AppError::from)?;
    let names: HashMap<i64, String> =
        companies.into_iter().map(|c| (c.id, c.name)).collect();

    let csv = report::users_csv(&users, &names)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"users.csv\"".to_string(),
            ),
        ],
        csv,
    ))
}

//! Dashboard service: aggregate statistics over the report collection.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};
use civicreport_common::{AppResult, WeekStart};
use civicreport_db::{
    entities::category,
    repositories::{CategoryRepository, CategoryStatusRow, CreatedStatusRow, ReportRepository},
};
use serde::Serialize;

use super::report::{ReportStatus, ReportView};

const DEFAULT_TREND_MONTHS: u32 = 12;
const MAX_TREND_MONTHS: u32 = 60;

const DEFAULT_ACTIVITY_LIMIT: u64 = 20;
const MAX_ACTIVITY_LIMIT: u64 = 100;

/// Days within which a resolution counts as "quick".
const QUICK_RESOLUTION_DAYS: i64 = 7;
/// Age in days past which an open report counts as overdue.
const OVERDUE_AGE_DAYS: i64 = 30;

/// Report counts per status.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub submitted: u64,
    pub in_review: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
}

/// Dashboard overview numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_reports: u64,
    pub status_breakdown: StatusBreakdown,
    pub this_week_reports: u64,
    pub this_month_reports: u64,
    /// Share of reports in the resolution bucket, percent, one decimal.
    pub completion_rate: f64,
}

/// Per-category report counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category_id: i32,
    pub category_name: String,
    pub category_icon: String,
    pub category_color: String,
    pub count: u64,
    pub resolved: u64,
    pub pending: u64,
}

/// One month's bucket in the trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub total: u64,
    pub resolved: u64,
    pub pending: u64,
}

/// Resolution performance numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub average_resolution_days: f64,
    pub total_reports: u64,
    pub resolved_reports: u64,
    pub quick_resolutions: u64,
    pub overdue_reports: u64,
    pub resolution_rate: f64,
}

/// Dashboard service computing aggregate statistics.
#[derive(Clone)]
pub struct DashboardService {
    report_repo: ReportRepository,
    category_repo: CategoryRepository,
    week_start: WeekStart,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        category_repo: CategoryRepository,
        week_start: WeekStart,
    ) -> Self {
        Self {
            report_repo,
            category_repo,
            week_start,
        }
    }

    /// Totals, status breakdown, current week/month counts, completion rate.
    pub async fn overview(&self) -> AppResult<Overview> {
        let total_reports = self.report_repo.count_all().await?;

        let submitted = self
            .report_repo
            .count_with_status(ReportStatus::Submitted)
            .await?;
        let in_review = self
            .report_repo
            .count_with_status(ReportStatus::InReview)
            .await?;
        let in_progress = self
            .report_repo
            .count_with_status(ReportStatus::InProgress)
            .await?;
        let resolved = self
            .report_repo
            .count_with_status(ReportStatus::Resolved)
            .await?;
        let closed = self
            .report_repo
            .count_with_status(ReportStatus::Closed)
            .await?;

        let now = Utc::now();
        let this_week_reports = self
            .report_repo
            .count_created_since(start_of_week(now, self.week_start.weekday()))
            .await?;
        let this_month_reports = self
            .report_repo
            .count_created_since(start_of_month(now))
            .await?;

        Ok(Overview {
            total_reports,
            status_breakdown: StatusBreakdown {
                submitted,
                in_review,
                in_progress,
                resolved,
                closed,
            },
            this_week_reports,
            this_month_reports,
            completion_rate: percentage(resolved + closed, total_reports),
        })
    }

    /// Report counts grouped by category, busiest categories first.
    pub async fn category_breakdown(&self) -> AppResult<Vec<CategoryStat>> {
        let rows = self.report_repo.category_status_rows().await?;
        let categories = self.category_repo.all().await?;
        Ok(aggregate_categories(&rows, &categories))
    }

    /// Monthly created/resolved/pending counts for the trailing window.
    ///
    /// Always returns exactly the requested number of buckets; months with
    /// no reports appear with zero counts.
    pub async fn monthly_trends(&self, months: i64) -> AppResult<Vec<MonthlyTrend>> {
        let months = normalize_months(months);
        let now = Utc::now();
        let window = month_window(now, months);

        let since = window
            .first()
            .and_then(|&(year, month)| NaiveDate::from_ymd_opt(year, month, 1))
            .map_or(now, |date| date.and_time(NaiveTime::MIN).and_utc());

        let rows = self.report_repo.created_status_rows_since(since).await?;
        Ok(fill_monthly_buckets(&rows, &window))
    }

    /// Latest reports with category decoration.
    pub async fn recent_activity(&self, limit: i64) -> AppResult<Vec<ReportView>> {
        let limit = normalize_limit(limit);
        let models = self.report_repo.recent(limit).await?;

        let categories: HashMap<i32, category::Model> = self
            .category_repo
            .all()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let now = Utc::now();
        Ok(models
            .into_iter()
            .map(|m| ReportView::decorate(m, &categories, now))
            .collect())
    }

    /// Resolution-time statistics and overdue count.
    pub async fn performance_metrics(&self) -> AppResult<PerformanceMetrics> {
        let total_reports = self.report_repo.count_all().await?;

        if total_reports == 0 {
            return Ok(PerformanceMetrics {
                average_resolution_days: 0.0,
                total_reports: 0,
                resolved_reports: 0,
                quick_resolutions: 0,
                overdue_reports: 0,
                resolution_rate: 0.0,
            });
        }

        let rows = self.report_repo.resolution_rows().await?;
        let resolution_days: Vec<i64> = rows
            .iter()
            .map(|row| (row.resolved_at - row.created_at).num_days())
            .collect();

        let average_resolution_days = if resolution_days.is_empty() {
            0.0
        } else {
            round1(resolution_days.iter().sum::<i64>() as f64 / resolution_days.len() as f64)
        };
        let quick_resolutions = resolution_days
            .iter()
            .filter(|days| **days <= QUICK_RESOLUTION_DAYS)
            .count() as u64;

        let now = Utc::now();
        let overdue_reports = self
            .report_repo
            .count_overdue(now - Duration::days(OVERDUE_AGE_DAYS))
            .await?;

        Ok(PerformanceMetrics {
            average_resolution_days,
            total_reports,
            resolved_reports: rows.len() as u64,
            quick_resolutions,
            overdue_reports,
            resolution_rate: percentage(rows.len() as u64, total_reports),
        })
    }
}

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of `part` in `total`, one decimal, 0 when `total` is 0.
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

/// Midnight at the start of the current week.
fn start_of_week(now: DateTime<Utc>, week_start: Weekday) -> DateTime<Utc> {
    let today = now.date_naive();
    let days_back = today.weekday().days_since(week_start);
    let start = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(today);
    start.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight on the first of the current month.
fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    first.and_time(NaiveTime::MIN).and_utc()
}

fn normalize_months(months: i64) -> u32 {
    if months < 1 {
        DEFAULT_TREND_MONTHS
    } else {
        (months as u32).min(MAX_TREND_MONTHS)
    }
}

fn normalize_limit(limit: i64) -> u64 {
    if limit < 1 {
        DEFAULT_ACTIVITY_LIMIT
    } else {
        (limit as u64).min(MAX_ACTIVITY_LIMIT)
    }
}

/// The trailing `months` calendar months ending with the current one,
/// oldest first.
fn month_window(now: DateTime<Utc>, months: u32) -> Vec<(i32, u32)> {
    let today = now.date_naive();
    let current = today.with_day(1).unwrap_or(today);
    (0..months)
        .rev()
        .map(|back| {
            let date = current
                .checked_sub_months(Months::new(back))
                .unwrap_or(current);
            (date.year(), date.month())
        })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_default()
}

/// Aggregate per-month counts and lay them over the window, synthesizing
/// zero buckets for months without reports.
fn fill_monthly_buckets(rows: &[CreatedStatusRow], window: &[(i32, u32)]) -> Vec<MonthlyTrend> {
    let mut counts: HashMap<(i32, u32), (u64, u64)> = HashMap::new();
    for row in rows {
        let created = row.created_at.with_timezone(&Utc);
        let entry = counts.entry((created.year(), created.month())).or_default();
        entry.0 += 1;
        if row.status.in_resolution_bucket() {
            entry.1 += 1;
        }
    }

    window
        .iter()
        .map(|&(year, month)| {
            let (total, resolved) = counts.get(&(year, month)).copied().unwrap_or((0, 0));
            MonthlyTrend {
                year,
                month,
                month_name: month_label(year, month),
                total,
                resolved,
                pending: total - resolved,
            }
        })
        .collect()
}

/// Aggregate per-category counts, busiest first. Categories without reports
/// are omitted, matching the grouped query this replaces.
fn aggregate_categories(
    rows: &[CategoryStatusRow],
    categories: &[category::Model],
) -> Vec<CategoryStat> {
    let mut counts: HashMap<i32, (u64, u64)> = HashMap::new();
    for row in rows {
        let entry = counts.entry(row.category_id).or_default();
        entry.0 += 1;
        if row.status.in_resolution_bucket() {
            entry.1 += 1;
        }
    }

    let mut stats: Vec<CategoryStat> = categories
        .iter()
        .filter_map(|category| {
            counts.get(&category.id).map(|&(count, resolved)| CategoryStat {
                category_id: category.id,
                category_name: category.name.clone(),
                category_icon: category.icon.clone(),
                category_color: category.color.clone(),
                count,
                resolved,
                pending: count - resolved,
            })
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.category_id.cmp(&b.category_id)));
    stats
}

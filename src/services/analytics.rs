use crate::models::{
    ActivityEntry, DailyStat, DeviceType, PageView, PageViewEvent, User, UserActivity,
    VisitorSummary,
};
use crate::services::classifier::{classify_device, classify_location, classify_source};
use crate::services::identity::{self, ClientStorage, HAS_VISITED_KEY, LAST_VISIT_DATE_KEY};
use crate::services::sink::AnalyticsSink;
use crate::services::format_timestamp;
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Activities kept per signed-in user; older entries are pruned on write.
pub const ACTIVITY_HISTORY_LIMIT: i64 = 50;

const MAX_PATH_LENGTH: usize = 2000;
const MAX_TITLE_LENGTH: usize = 500;

const DIMENSION_DEVICE: &str = "device";
const DIMENSION_COUNTRY: &str = "country";
const DIMENSION_SOURCE: &str = "source";

/// Everything the recorder knows about the visitor, backed by their storage.
pub struct VisitorContext<S: ClientStorage> {
    storage: S,
}

impl<S: ClientStorage> VisitorContext<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn visitor_id(&mut self) -> String {
        identity::visitor_id(&mut self.storage)
    }

    pub fn session_id(&mut self) -> String {
        identity::session_id(&mut self.storage)
    }

    /// True exactly once per storage profile, regardless of date.
    pub fn check_new_visitor(&mut self) -> bool {
        if self.storage.get(HAS_VISITED_KEY).is_some() {
            return false;
        }
        self.storage.set(HAS_VISITED_KEY, "true");
        true
    }

    /// True on the first call of each calendar day.
    pub fn check_new_session(&mut self, today: &str) -> bool {
        let is_new = self.storage.get(LAST_VISIT_DATE_KEY).as_deref() != Some(today);
        if is_new {
            self.storage.set(LAST_VISIT_DATE_KEY, today);
        }
        is_new
    }
}

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub event: PageViewEvent,
    pub is_new_session: bool,
}

pub struct PageViewRecorder {
    db: Database,
    sink: Arc<dyn AnalyticsSink>,
}

impl PageViewRecorder {
    pub fn new(db: Database, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { db, sink }
    }

    pub fn record<S: ClientStorage>(
        &self,
        ctx: &mut VisitorContext<S>,
        view: &PageView,
    ) -> RecordOutcome {
        self.record_at(ctx, view, Utc::now())
    }

    /// Records one route change. Storage failures are logged and dropped: the
    /// event row, the daily counters and the visitor summary are independent
    /// writes and a failure in one does not stop the others.
    pub fn record_at<S: ClientStorage>(
        &self,
        ctx: &mut VisitorContext<S>,
        view: &PageView,
        now: DateTime<Utc>,
    ) -> RecordOutcome {
        let date = now.format("%Y-%m-%d").to_string();
        let location = classify_location(&view.timezone);

        let visitor_id = ctx.visitor_id();
        let session_id = ctx.session_id();
        let is_new_visitor = ctx.check_new_visitor();
        let is_new_session = ctx.check_new_session(&date);

        let event = PageViewEvent {
            visitor_id,
            session_id,
            page_path: truncate(&view.page_path, MAX_PATH_LENGTH),
            page_title: truncate(&view.page_title, MAX_TITLE_LENGTH),
            device_type: classify_device(view.viewport_width),
            country: location.country,
            region: location.region,
            traffic_source: classify_source(&view.referrer),
            is_new_visitor,
            timestamp: format_timestamp(now),
            date,
        };

        if let Err(e) = insert_event(&self.db, &event) {
            tracing::error!("Failed to record page view event: {}", e);
        }

        if let Err(e) = increment_daily_stat(&self.db, &event, is_new_session) {
            tracing::error!("Failed to update daily stats for {}: {}", event.date, e);
        }

        if is_new_session {
            if let Err(e) = upsert_visitor_summary(&self.db, &event) {
                tracing::error!("Failed to update visitor summary: {}", e);
            }
        }

        self.sink.emit("page_view", mirror_properties(&event));

        RecordOutcome {
            event,
            is_new_session,
        }
    }

    pub fn record_user_activity(&self, user: &User, view: &PageView) {
        self.record_user_activity_at(user, view, Utc::now());
    }

    pub fn record_user_activity_at(&self, user: &User, view: &PageView, now: DateTime<Utc>) {
        if let Err(e) = log_user_activity(&self.db, user, view, now) {
            tracing::warn!("Failed to log activity for user {}: {}", user.id, e);
        }
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn mirror_properties(event: &PageViewEvent) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(event) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

pub fn insert_event(db: &Database, event: &PageViewEvent) -> Result<()> {
    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO page_view_events
            (visitor_id, session_id, page_path, page_title, device_type, country,
             region, traffic_source, is_new_visitor, timestamp, date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        rusqlite::params![
            event.visitor_id,
            event.session_id,
            event.page_path,
            event.page_title,
            event.device_type.to_string(),
            event.country,
            event.region,
            event.traffic_source,
            event.is_new_visitor,
            event.timestamp,
            event.date,
        ],
    )?;
    Ok(())
}

/// Creates the day's row seeded from this event or adds this event's deltas to
/// it. Each counter moves by a delta inside one upsert, so concurrent writers
/// never read-modify-write and the first-event-of-the-day race cannot lose a
/// count.
pub fn increment_daily_stat(db: &Database, event: &PageViewEvent, is_new_session: bool) -> Result<()> {
    let mut conn = db.get()?;
    let tx = conn.transaction()?;

    tx.execute(
        r#"
        INSERT INTO daily_stats (date, page_views, unique_visitors, new_visitors, last_updated)
        VALUES (?1, 1, ?2, ?3, ?4)
        ON CONFLICT(date) DO UPDATE SET
            page_views = page_views + 1,
            unique_visitors = unique_visitors + excluded.unique_visitors,
            new_visitors = new_visitors + excluded.new_visitors,
            last_updated = MAX(last_updated, excluded.last_updated)
        "#,
        rusqlite::params![
            event.date,
            is_new_session as i64,
            event.is_new_visitor as i64,
            event.timestamp,
        ],
    )?;

    let device = event.device_type.to_string();
    for (dimension, key) in [
        (DIMENSION_DEVICE, device.as_str()),
        (DIMENSION_COUNTRY, event.country.as_str()),
        (DIMENSION_SOURCE, event.traffic_source.as_str()),
    ] {
        tx.execute(
            r#"
            INSERT INTO daily_stat_buckets (date, dimension, key, count)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(date, dimension, key) DO UPDATE SET count = count + 1
            "#,
            rusqlite::params![event.date, dimension, key],
        )?;
    }

    tx.commit()?;
    Ok(())
}

pub fn upsert_visitor_summary(db: &Database, event: &PageViewEvent) -> Result<()> {
    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO visitor_summaries
            (visitor_id, first_visit, last_visit, device_type, country, region, total_visits)
        VALUES (?1, ?2, ?2, ?3, ?4, ?5, 1)
        ON CONFLICT(visitor_id) DO UPDATE SET
            total_visits = total_visits + 1,
            first_visit = MIN(first_visit, excluded.first_visit),
            last_visit = MAX(last_visit, excluded.last_visit)
        "#,
        rusqlite::params![
            event.visitor_id,
            event.timestamp,
            event.device_type.to_string(),
            event.country,
            event.region,
        ],
    )?;
    Ok(())
}

fn log_user_activity(db: &Database, user: &User, view: &PageView, now: DateTime<Utc>) -> Result<()> {
    let timestamp = format_timestamp(now);
    let page_path = truncate(&view.page_path, MAX_PATH_LENGTH);
    let page_title = truncate(&view.page_title, MAX_TITLE_LENGTH);

    let mut conn = db.get()?;
    let tx = conn.transaction()?;

    tx.execute(
        r#"
        INSERT INTO user_activity
            (user_id, email, first_active, last_active, last_page, activity_count)
        VALUES (?1, ?2, ?3, ?3, ?4, 1)
        ON CONFLICT(user_id) DO UPDATE SET
            email = excluded.email,
            last_active = excluded.last_active,
            last_page = excluded.last_page,
            activity_count = activity_count + 1
        "#,
        rusqlite::params![user.id, user.email, timestamp, page_path],
    )?;

    tx.execute(
        "INSERT INTO user_activity_entries (user_id, page_path, page_title, timestamp) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user.id, page_path, page_title, timestamp],
    )?;

    tx.execute(
        r#"
        DELETE FROM user_activity_entries
        WHERE user_id = ?1 AND id NOT IN (
            SELECT id FROM user_activity_entries
            WHERE user_id = ?1
            ORDER BY id DESC
            LIMIT ?2
        )
        "#,
        rusqlite::params![user.id, ACTIVITY_HISTORY_LIMIT],
    )?;

    tx.commit()?;
    Ok(())
}

fn load_buckets(
    conn: &rusqlite::Connection,
    from: &str,
    to: &str,
) -> Result<HashMap<String, Vec<(String, String, i64)>>> {
    let mut stmt = conn.prepare(
        "SELECT date, dimension, key, count FROM daily_stat_buckets WHERE date >= ?1 AND date <= ?2",
    )?;
    let mut by_date: HashMap<String, Vec<(String, String, i64)>> = HashMap::new();
    let rows = stmt.query_map([from, to], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;
    for row in rows {
        let (date, dimension, key, count) = row?;
        by_date.entry(date).or_default().push((dimension, key, count));
    }
    Ok(by_date)
}

fn apply_buckets(stat: &mut DailyStat, buckets: Vec<(String, String, i64)>) {
    for (dimension, key, count) in buckets {
        let target = match dimension.as_str() {
            DIMENSION_DEVICE => &mut stat.device_types,
            DIMENSION_COUNTRY => &mut stat.countries,
            DIMENSION_SOURCE => &mut stat.traffic_sources,
            other => {
                tracing::warn!("Ignoring unknown stat dimension '{}'", other);
                continue;
            }
        };
        *target.entry(key).or_insert(0) += count;
    }
}

/// Daily stats between two `YYYY-MM-DD` dates, inclusive, oldest first.
pub fn list_daily_stats(db: &Database, from: &str, to: &str) -> Result<Vec<DailyStat>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT date, page_views, unique_visitors, new_visitors, last_updated
        FROM daily_stats
        WHERE date >= ?1 AND date <= ?2
        ORDER BY date ASC
        "#,
    )?;
    let mut stats: Vec<DailyStat> = stmt
        .query_map([from, to], |row| {
            Ok(DailyStat {
                date: row.get(0)?,
                page_views: row.get(1)?,
                unique_visitors: row.get(2)?,
                new_visitors: row.get(3)?,
                last_updated: row.get(4)?,
                ..Default::default()
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut buckets = load_buckets(&conn, from, to)?;
    for stat in stats.iter_mut() {
        if let Some(b) = buckets.remove(&stat.date) {
            apply_buckets(stat, b);
        }
    }
    Ok(stats)
}

pub fn get_daily_stat(db: &Database, date: &str) -> Result<Option<DailyStat>> {
    Ok(list_daily_stats(db, date, date)?.into_iter().next())
}

/// The last `days` days ending at `today`, inclusive.
pub fn recent_daily_stats(db: &Database, days: i64, today: DateTime<Utc>) -> Result<Vec<DailyStat>> {
    let days = days.clamp(1, 366);
    let from = (today - chrono::TimeDelta::days(days - 1))
        .format("%Y-%m-%d")
        .to_string();
    let to = today.format("%Y-%m-%d").to_string();
    list_daily_stats(db, &from, &to)
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub days: usize,
    pub page_views: i64,
    pub unique_visitors: i64,
    pub new_visitors: i64,
    pub device_types: BTreeMap<String, i64>,
    pub countries: Vec<(String, i64)>,
    pub traffic_sources: Vec<(String, i64)>,
    pub page_views_max: i64,
    pub series: Vec<DailyStat>,
}

fn top(map: BTreeMap<String, i64>, limit: usize) -> Vec<(String, i64)> {
    let mut entries: Vec<(String, i64)> = map.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

/// Folds a series of daily stats into dashboard totals.
pub fn summarize(series: Vec<DailyStat>) -> AnalyticsOverview {
    let mut countries = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut overview = AnalyticsOverview {
        days: series.len(),
        ..Default::default()
    };

    for stat in &series {
        overview.page_views += stat.page_views;
        overview.unique_visitors += stat.unique_visitors;
        overview.new_visitors += stat.new_visitors;
        for (k, v) in &stat.device_types {
            *overview.device_types.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &stat.countries {
            *countries.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &stat.traffic_sources {
            *sources.entry(k.clone()).or_insert(0) += v;
        }
    }

    overview.countries = top(countries, 10);
    overview.traffic_sources = top(sources, 10);
    // at least 1 so charts can divide by it
    overview.page_views_max = series.iter().map(|s| s.page_views).max().unwrap_or(1).max(1);
    overview.series = series;
    overview
}

fn row_to_visitor(row: &rusqlite::Row) -> rusqlite::Result<VisitorSummary> {
    Ok(VisitorSummary {
        visitor_id: row.get(0)?,
        first_visit: row.get(1)?,
        last_visit: row.get(2)?,
        device_type: row
            .get::<_, String>(3)?
            .parse()
            .unwrap_or(DeviceType::Desktop),
        country: row.get(4)?,
        region: row.get(5)?,
        total_visits: row.get(6)?,
    })
}

pub fn get_visitor(db: &Database, visitor_id: &str) -> Result<Option<VisitorSummary>> {
    let conn = db.get()?;
    let visitor = conn
        .query_row(
            "SELECT visitor_id, first_visit, last_visit, device_type, country, region, total_visits FROM visitor_summaries WHERE visitor_id = ?",
            [visitor_id],
            row_to_visitor,
        )
        .optional()?;
    Ok(visitor)
}

pub fn list_recent_visitors(db: &Database, limit: usize) -> Result<Vec<VisitorSummary>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        "SELECT visitor_id, first_visit, last_visit, device_type, country, region, total_visits FROM visitor_summaries ORDER BY last_visit DESC LIMIT ?",
    )?;
    let visitors = stmt
        .query_map([limit as i64], row_to_visitor)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(visitors)
}

pub fn count_events(db: &Database, date: &str) -> Result<i64> {
    let conn = db.get()?;
    let count = conn.query_row(
        "SELECT COUNT(*) FROM page_view_events WHERE date = ?",
        [date],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_user_activity(db: &Database, user_id: i64) -> Result<Option<UserActivity>> {
    let conn = db.get()?;
    let activity = conn
        .query_row(
            "SELECT user_id, email, first_active, last_active, last_page, activity_count FROM user_activity WHERE user_id = ?",
            [user_id],
            |row| {
                Ok(UserActivity {
                    user_id: row.get(0)?,
                    email: row.get(1)?,
                    first_active: row.get(2)?,
                    last_active: row.get(3)?,
                    last_page: row.get(4)?,
                    activity_count: row.get(5)?,
                    activities: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut activity) = activity else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT page_path, page_title, timestamp FROM user_activity_entries WHERE user_id = ? ORDER BY id DESC",
    )?;
    activity.activities = stmt
        .query_map([user_id], |row| {
            Ok(ActivityEntry {
                page_path: row.get(0)?,
                page_title: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(activity))
}

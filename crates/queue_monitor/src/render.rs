use chrono::{DateTime, FixedOffset, Utc};
use queue_core::{JobRowView, NotificationLevel, QueueViewModel, RowStatus};

use crate::config::SortOrder;
use crate::notify::NoticeBoard;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const HELP_LINE: &str = "Commands: delete <id> | refresh | pause | resume | quit";

/// Renders the whole screen as plain text. Times are shown in `offset`.
pub fn render(
    view: &QueueViewModel,
    notices: &NoticeBoard,
    sort: SortOrder,
    offset: FixedOffset,
) -> String {
    let mut out = String::new();
    out.push_str(&title_line(view));
    out.push('\n');
    out.push('\n');

    let zone = offset_label(offset);
    let header = [
        "ID".to_string(),
        format!("Created ({zone})"),
        format!("Processed ({zone})"),
        "Action".to_string(),
        "Status".to_string(),
        "Result".to_string(),
        "Delete".to_string(),
    ];

    let mut rows: Vec<&JobRowView> = view.rows.iter().collect();
    if sort == SortOrder::IdDescending {
        rows.sort_by(|a, b| b.id.cmp(&a.id));
    }
    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|row| row_cells(row, offset))
        .collect();

    let mut widths = header.each_ref().map(|h| h.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str(&format_line(&header, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    if cells.is_empty() {
        out.push_str("(queue is empty)\n");
    }
    for line in &cells {
        out.push_str(&format_line(line, &widths));
        out.push('\n');
    }

    out.push('\n');
    for notice in notices.notices() {
        let tag = match notice.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        out.push_str(&format!("[{tag}] {}\n", notice.message));
    }
    out.push_str(HELP_LINE);
    out.push('\n');
    out
}

fn title_line(view: &QueueViewModel) -> String {
    let mut title = format!("Queue: {} item(s)", view.job_count);
    if view.polling {
        title.push_str(" | live");
    } else {
        title.push_str(" | paused");
    }
    if view.busy {
        title.push_str(&format!(" | deleting {}", join_ids(&view.pending_deletes)));
    }
    if view.stale {
        title.push_str(" | last refresh failed, showing previous data");
    }
    title
}

fn row_cells(row: &JobRowView, offset: FixedOffset) -> [String; 7] {
    [
        row.id.to_string(),
        format_time(row.created_at, offset),
        row.processed_at
            .map(|at| format_time(at, offset))
            .unwrap_or_default(),
        row.action.label().to_string(),
        status_text(row.status, offset),
        row.result.clone().unwrap_or_default(),
        if row.deletable { "yes" } else { "" }.to_string(),
    ]
}

/// A failed row shows its attempt count and next retry together or not at all.
pub fn status_text(status: RowStatus, offset: FixedOffset) -> String {
    match status {
        RowStatus::Processed => "processed".to_string(),
        RowStatus::InProgress => "in progress ...".to_string(),
        RowStatus::Failed { retry: Some(retry) } => format!(
            "failed ({} {}, next {})",
            retry.try_count,
            if retry.try_count == 1 { "try" } else { "tries" },
            format_time(retry.next_try_at, offset)
        ),
        RowStatus::Failed { retry: None } => "failed".to_string(),
    }
}

fn format_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(TIME_FORMAT).to_string()
}

/// `UTC+2`, `UTC-5`, `UTC+5:30`.
pub fn offset_label(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if minutes == 0 {
        format!("UTC{sign}{hours}")
    } else {
        format!("UTC{sign}{hours}:{minutes:02}")
    }
}

fn format_line(cells: &[String; 7], widths: &[usize; 7]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

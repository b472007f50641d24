//! ホバー中のコミットを表示するツールチップ

use super::record::CommitSummary;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub id: String,
    pub url: String,
    /// 曜日付きの日付（例: `Tuesday, February 11, 2025`）
    pub date: String,
    pub time: String,
    pub author: String,
    pub lines: usize,
}

impl TooltipContent {
    pub fn for_commit(commit: &CommitSummary) -> Self {
        Self {
            id: commit.id.clone(),
            url: commit.url.clone(),
            date: full_date(&commit.datetime),
            time: commit.time.clone(),
            author: commit.author.clone(),
            lines: commit.total_lines,
        }
    }
}

/// ツールチップの状態変更
///
/// `content`が`None`のときは内容を消去します。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipUpdate {
    pub content: Option<TooltipContent>,
    pub visible: bool,
    pub position: Option<(f64, f64)>,
}

impl TooltipUpdate {
    pub fn show(commit: &CommitSummary, x: f64, y: f64) -> Self {
        Self {
            content: Some(TooltipContent::for_commit(commit)),
            visible: true,
            position: Some((x, y)),
        }
    }

    pub fn hide() -> Self {
        Self {
            content: None,
            visible: false,
            position: None,
        }
    }
}

pub fn full_date<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%A, %B %-d, %Y").to_string()
}

/// 長い日付と短い時刻（例: `February 11, 2025 at 3:52 PM`）
pub fn long_date_short_time<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%B %-d, %Y at %-I:%M %p").to_string()
}

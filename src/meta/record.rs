//! データセットの読み込みとコミット単位への集約を担当するモジュール
//!
//! `loc.csv` は「コミットが触れたソース行」1行につき1レコードの形式です。
//! このモジュールはそれを型付きの`LineRecord`に変換し、
//! コミットIDごとにまとめた`CommitSummary`を作成します。

use super::error::MetaError;
use chrono::{DateTime, FixedOffset, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// データセットが持つべき列（この順序で出力されます）
pub const DATASET_COLUMNS: &[&str] = &[
    "commit", "file", "line", "depth", "length", "date", "time", "timezone", "datetime",
    "author", "repo", "type",
];

/// CSVの1行をそのまま表す構造体
///
/// 数値列はserdeで直接変換し、日時列は後段で検証します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub commit: String,
    pub file: String,
    pub line: u32,
    pub depth: u32,
    pub length: u32,
    pub date: String,
    pub time: String,
    pub timezone: String,
    pub datetime: String,
    pub author: String,
    pub repo: String,
    #[serde(rename = "type")]
    pub line_type: String,
}

/// コミットによって変更されたソース行1行分のレコード
///
/// 読み込み後は変更されません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRecord {
    pub commit: String,
    pub file: String,
    pub line: u32,
    pub depth: u32,
    pub length: u32,
    /// `date`列とタイムゾーンから組み立てたその日の0時
    pub date: DateTime<FixedOffset>,
    pub time: String,
    pub timezone: String,
    pub datetime: DateTime<FixedOffset>,
    pub author: String,
    pub repo: String,
    #[serde(rename = "type")]
    pub line_type: String,
}

impl LineRecord {
    /// CSVの行を検証しながら変換します
    ///
    /// # 引数
    ///
    /// - `row`: 変換元の行
    /// - `index`: エラー報告用の行番号（ヘッダーを除き1始まり）
    pub fn from_raw(row: RawRow, index: usize) -> Result<Self, MetaError> {
        let date = DateTime::parse_from_rfc3339(&format!("{}T00:00:00{}", row.date, row.timezone))
            .map_err(|e| MetaError::InvalidRecord {
                row: index,
                reason: format!("invalid date '{}{}': {}", row.date, row.timezone, e),
            })?;
        let datetime =
            DateTime::parse_from_rfc3339(&row.datetime).map_err(|e| MetaError::InvalidRecord {
                row: index,
                reason: format!("invalid datetime '{}': {}", row.datetime, e),
            })?;

        Ok(Self {
            commit: row.commit,
            file: row.file,
            line: row.line,
            depth: row.depth,
            length: row.length,
            date,
            time: row.time,
            timezone: row.timezone,
            datetime,
            author: row.author,
            repo: row.repo,
            line_type: row.line_type,
        })
    }
}

/// 同じコミットIDを持つ行レコードをまとめたコミットの要約
///
/// 構成する行レコードは`lines()`で明示的に取得します。
/// シリアライズ対象には含まれません。
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub id: String,
    pub url: String,
    pub author: String,
    pub date: DateTime<FixedOffset>,
    pub time: String,
    pub timezone: String,
    pub datetime: DateTime<FixedOffset>,
    /// コミット時刻（コミット自身のオフセットでの時 + 分/60）
    pub hour_frac: f64,
    pub total_lines: usize,
    #[serde(skip)]
    lines: Vec<LineRecord>,
}

impl CommitSummary {
    fn from_lines(id: String, lines: Vec<LineRecord>) -> Self {
        let first = &lines[0];
        let datetime = first.datetime;
        Self {
            url: format!("https://github.com/{}/commit/{}", first.repo, id),
            author: first.author.clone(),
            date: first.date,
            time: first.time.clone(),
            timezone: first.timezone.clone(),
            datetime,
            hour_frac: datetime.hour() as f64 + datetime.minute() as f64 / 60.0,
            total_lines: lines.len(),
            id,
            lines,
        }
    }

    /// このコミットを構成する行レコード
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// タイムスタンプ（ミリ秒）
    pub fn timestamp_millis(&self) -> i64 {
        self.datetime.timestamp_millis()
    }
}

/// CSVリーダーから行レコードを読み込みます
///
/// # エラー
///
/// - CSVの構造や数値列が不正な場合は`MetaError::Csv`
/// - 日時列が解釈できない場合は`MetaError::InvalidRecord`
pub fn read_lines<R: Read>(reader: R) -> Result<Vec<LineRecord>, MetaError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut lines = Vec::new();
    for (index, row) in rdr.deserialize::<RawRow>().enumerate() {
        lines.push(LineRecord::from_raw(row?, index + 1)?);
    }
    Ok(lines)
}

/// 行レコードをコミットIDでまとめ、タイムスタンプの昇順に並べます
///
/// コミットは最初に現れた順で集約され、同時刻のコミットはその順序を保ちます。
pub fn summarize(lines: Vec<LineRecord>) -> Vec<CommitSummary> {
    let mut groups: IndexMap<String, Vec<LineRecord>> = IndexMap::new();
    for line in lines {
        groups.entry(line.commit.clone()).or_default().push(line);
    }

    let mut commits: Vec<CommitSummary> = groups
        .into_iter()
        .map(|(id, lines)| CommitSummary::from_lines(id, lines))
        .collect();
    commits.sort_by_key(CommitSummary::timestamp_millis);
    commits
}

//! 要約統計の計算と結果の表現を担当するモジュール

use super::record::CommitSummary;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// データセット全体の要約統計
///
/// # フィールド
///
/// - `total_loc`: 行レコードの総数
/// - `total_commits`: コミット数
/// - `file_count`: ファイルの種類数
/// - `average_file_length`: ファイルあたりの平均行数（四捨五入）
/// - `peak_hour`: コミットが最も多い時間帯（0〜23時）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_loc: usize,
    pub total_commits: usize,
    pub file_count: usize,
    pub average_file_length: u64,
    pub peak_hour: Option<u32>,
}

impl SummaryStats {
    pub fn compute(commits: &[CommitSummary]) -> Self {
        let mut file_lengths: IndexMap<&str, usize> = IndexMap::new();
        for line in commits.iter().flat_map(|c| c.lines()) {
            *file_lengths.entry(line.file.as_str()).or_insert(0) += 1;
        }

        let total_loc: usize = file_lengths.values().sum();
        let file_count = file_lengths.len();
        let average_file_length = if file_count > 0 {
            (total_loc as f64 / file_count as f64).round() as u64
        } else {
            0
        };

        Self {
            total_loc,
            total_commits: commits.len(),
            file_count,
            average_file_length,
            peak_hour: peak_hour(commits),
        }
    }

    /// 表示用のラベルと値の組
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total LOC", self.total_loc.to_string()),
            ("Total commits", self.total_commits.to_string()),
            ("Number of files", self.file_count.to_string()),
            ("Average file length", format!("{} lines", self.average_file_length)),
            (
                "Peak coding hour",
                self.peak_hour
                    .map(|h| format!("{h}:00"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]
    }
}

/// コミット数が最大の時間帯を返します
///
/// 同数の場合は最も早い時間帯を選びます。
pub fn peak_hour(commits: &[CommitSummary]) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for commit in commits {
        *counts.entry(commit.hour_frac.floor() as u32).or_insert(0) += 1;
    }

    // BTreeMapは昇順なので、最初に見つかった最大値が最も早い時間帯
    counts
        .into_iter()
        .fold(None, |best: Option<(u32, usize)>, (hour, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((hour, count)),
        })
        .map(|(hour, _)| hour)
}

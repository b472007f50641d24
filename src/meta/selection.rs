//! ブラシによるコミット選択と言語別内訳

use super::record::CommitSummary;
use super::scatter::Scales;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 散布図上の矩形選択（描画座標）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BrushRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// 境界を含めて点が矩形内にあるか
    ///
    /// 角の指定順序には依存しません。
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (min_x, max_x) = (self.x0.min(self.x1), self.x0.max(self.x1));
        let (min_y, max_y) = (self.y0.min(self.y1), self.y0.max(self.y1));
        x >= min_x && x <= max_x && y >= min_y && y <= max_y
    }
}

/// 矩形内に描画されているコミットを返します
///
/// 矩形がない（ブラシが解除された）場合は空になります。
pub fn select_commits<'a>(
    commits: &[&'a CommitSummary],
    scales: Option<&Scales>,
    brush: Option<BrushRect>,
) -> Vec<&'a CommitSummary> {
    let (Some(scales), Some(brush)) = (scales, brush) else {
        return Vec::new();
    };
    commits
        .iter()
        .copied()
        .filter(|commit| {
            let (x, y) = scales.position(commit);
            brush.contains(x, y)
        })
        .collect()
}

pub fn selection_count_text(count: usize) -> String {
    if count == 0 {
        "No commits selected".to_string()
    } else {
        format!("{count} commits selected")
    }
}

/// 言語（行の種類）ごとの行数と割合
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub count: usize,
    pub proportion: f64,
}

impl LanguageShare {
    /// 表示用の文字列（例: `"12 lines (33.3%)"`）
    pub fn label(&self) -> String {
        format!("{} lines ({})", self.count, format_percent(self.proportion))
    }
}

/// 選択中のコミットに含まれる行の言語別内訳
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageBreakdown {
    pub total_lines: usize,
    pub shares: Vec<LanguageShare>,
}

impl LanguageBreakdown {
    /// 内訳を計算します。選択が空の場合は`None`
    ///
    /// 言語は最初に現れた順に並びます。
    pub fn compute(selected: &[&CommitSummary]) -> Option<Self> {
        if selected.is_empty() {
            return None;
        }

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for line in selected.iter().flat_map(|c| c.lines()) {
            *counts.entry(line.line_type.as_str()).or_insert(0) += 1;
        }
        let total_lines: usize = counts.values().sum();

        let shares = counts
            .into_iter()
            .map(|(language, count)| LanguageShare {
                language: language.to_string(),
                count,
                proportion: if total_lines > 0 {
                    count as f64 / total_lines as f64
                } else {
                    0.0
                },
            })
            .collect();

        Some(Self { total_lines, shares })
    }
}

/// 割合を小数第1位までのパーセント表記にします（末尾の`.0`は省略）
///
/// ちょうど半分の値は切り上げます（例: 1/16 → `6.3%`）。
pub fn format_percent(proportion: f64) -> String {
    let tenths = (proportion * 1000.0).round() / 10.0;
    let text = format!("{:.1}", tenths);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::record::tests::sample_csv;
    use crate::meta::record::{read_lines, summarize};
    use crate::meta::scatter::{ChartLayout, Scatterplot};
    use std::collections::HashSet;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.5), "50%");
        assert_eq!(format_percent(1.0 / 3.0), "33.3%");
        assert_eq!(format_percent(1.0), "100%");
        assert_eq!(format_percent(0.0004), "0%");
        assert_eq!(format_percent(0.1234), "12.3%");
    }

    #[test]
    fn test_format_percent_rounds_halves_up() {
        assert_eq!(format_percent(1.0 / 16.0), "6.3%");
        assert_eq!(format_percent(3.0 / 16.0), "18.8%");
        assert_eq!(format_percent(1.0 / 80.0), "1.3%");
        assert_eq!(format_percent(1.0 / 8.0), "12.5%");
    }

    #[test]
    fn test_selection_count_text() {
        assert_eq!(selection_count_text(0), "No commits selected");
        assert_eq!(selection_count_text(1), "1 commits selected");
        assert_eq!(selection_count_text(12), "12 commits selected");
    }

    #[test]
    fn test_brush_selection() {
        let commits = summarize(read_lines(sample_csv().as_bytes()).unwrap());
        let refs: Vec<&CommitSummary> = commits.iter().collect();
        let layout = ChartLayout::default();
        let mut plot = Scatterplot::new(layout);
        plot.update(&refs, &HashSet::new());
        let scales = plot.scales();

        let full = BrushRect::new(0.0, 0.0, layout.width, layout.height);
        assert_eq!(select_commits(&refs, scales, Some(full)).len(), 2);

        assert!(select_commits(&refs, scales, None).is_empty());

        let collapsed = BrushRect::new(1.0, 1.0, 1.0, 1.0);
        assert!(select_commits(&refs, scales, Some(collapsed)).is_empty());

        // コミットAの位置だけを囲む（角の順序は逆でもよい）
        let (x, y) = scales.unwrap().position(&commits[0]);
        let around_a = BrushRect::new(x + 1.0, y + 1.0, x - 1.0, y - 1.0);
        let selected = select_commits(&refs, scales, Some(around_a));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "aaa");
        assert_eq!(selection_count_text(selected.len()), "1 commits selected");
    }

    #[test]
    fn test_language_breakdown() {
        let commits = summarize(read_lines(sample_csv().as_bytes()).unwrap());
        let refs: Vec<&CommitSummary> = commits.iter().collect();

        let breakdown = LanguageBreakdown::compute(&refs).unwrap();
        assert_eq!(breakdown.total_lines, 15);
        let languages: Vec<&str> = breakdown.shares.iter().map(|s| s.language.as_str()).collect();
        assert_eq!(languages, vec!["html", "js", "css"]);

        let count_sum: usize = breakdown.shares.iter().map(|s| s.count).sum();
        assert_eq!(count_sum, 15);
        let pct_sum: f64 = breakdown.shares.iter().map(|s| s.proportion).sum();
        assert!((pct_sum - 1.0).abs() < 1e-9);

        assert_eq!(breakdown.shares[0].label(), "6 lines (40%)");
        assert_eq!(breakdown.shares[1].label(), "4 lines (26.7%)");
    }

    #[test]
    fn test_empty_selection_clears_breakdown() {
        assert!(LanguageBreakdown::compute(&[]).is_none());
    }
}

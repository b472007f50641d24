//! ファイルごとの変更行を1行1マークで並べるユニット可視化

use super::record::{CommitSummary, LineRecord};
use indexmap::IndexMap;
use serde::Serialize;

/// Tableau10 配色
pub const TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// キーに対して最初に要求された順で色を割り当てる順序スケール
#[derive(Debug, Default)]
pub struct OrdinalScale {
    assigned: IndexMap<String, usize>,
}

impl OrdinalScale {
    pub fn color(&mut self, key: &str) -> &'static str {
        let next = self.assigned.len();
        let index = *self.assigned.entry(key.to_string()).or_insert(next);
        TABLEAU10[index % TABLEAU10.len()]
    }
}

/// 1行分のマーク
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMark {
    pub line_type: String,
    pub color: &'static str,
}

/// 1ファイル分の行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRow {
    pub name: String,
    pub line_count: usize,
    pub units: Vec<UnitMark>,
}

/// ファイル別内訳
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FileBreakdown {
    pub files: Vec<FileRow>,
}

impl FileBreakdown {
    /// 表示中のコミットの行をファイルごとにまとめ、行数の多い順に並べます
    ///
    /// 行数が同じファイルは最初に現れた順を保ちます。
    pub fn compute(commits: &[&CommitSummary]) -> Self {
        let mut groups: IndexMap<&str, Vec<&LineRecord>> = IndexMap::new();
        for line in commits.iter().flat_map(|c| c.lines()) {
            groups.entry(line.file.as_str()).or_default().push(line);
        }

        let mut groups: Vec<(&str, Vec<&LineRecord>)> = groups.into_iter().collect();
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let mut colors = OrdinalScale::default();
        let files = groups
            .into_iter()
            .map(|(name, lines)| FileRow {
                name: name.to_string(),
                line_count: lines.len(),
                units: lines
                    .iter()
                    .map(|line| UnitMark {
                        line_type: line.line_type.clone(),
                        color: colors.color(&line.line_type),
                    })
                    .collect(),
            })
            .collect();

        Self { files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::record::tests::sample_csv;
    use crate::meta::record::{read_lines, summarize};

    #[test]
    fn test_ordinal_scale_assigns_in_request_order() {
        let mut scale = OrdinalScale::default();
        assert_eq!(scale.color("css"), "#4e79a7");
        assert_eq!(scale.color("js"), "#f28e2c");
        assert_eq!(scale.color("css"), "#4e79a7");
    }

    #[test]
    fn test_ordinal_scale_wraps() {
        let mut scale = OrdinalScale::default();
        for i in 0..10 {
            scale.color(&i.to_string());
        }
        assert_eq!(scale.color("eleventh"), TABLEAU10[0]);
    }

    #[test]
    fn test_file_breakdown() {
        let commits = summarize(read_lines(sample_csv().as_bytes()).unwrap());
        let refs: Vec<&CommitSummary> = commits.iter().collect();

        let breakdown = FileBreakdown::compute(&refs);
        let names: Vec<&str> = breakdown.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["index.html", "style.css", "global.js"]);

        let total_units: usize = breakdown.files.iter().map(|f| f.units.len()).sum();
        assert_eq!(total_units, 15);
        assert!(breakdown.files.iter().all(|f| f.units.len() == f.line_count));

        // 色は種類ごとに一定
        assert!(breakdown.files[0].units.iter().all(|u| u.color == "#4e79a7"));
        assert!(breakdown.files[1].units.iter().all(|u| u.color == "#f28e2c"));
    }

    #[test]
    fn test_empty_breakdown() {
        assert!(FileBreakdown::compute(&[]).files.is_empty());
    }
}

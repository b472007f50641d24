//! 画面の状態とUIイベントの処理
//!
//! 状態を変更するイベントはブラシとスライダーの2つだけです。
//! どちらも不変のコミット一覧と現在の操作値から派生状態を毎回計算し直すため、
//! 同じ入力で何度呼んでも結果は変わりません。
//!
//! 各ハンドラは描画命令（`RenderUpdate`）の列を返し、
//! 実際の描画は`Surface`の実装に任せます。

use super::error::MetaError;
use super::files::FileBreakdown;
use super::record::CommitSummary;
use super::scale::ProgressScale;
use super::scatter::{ChartLayout, ScatterFrame, Scatterplot, DEFAULT_OPACITY, HOVER_OPACITY};
use super::selection::{select_commits, selection_count_text, BrushRect, LanguageBreakdown};
use super::stats::SummaryStats;
use super::tooltip::{long_date_short_time, TooltipUpdate};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// UIから届くイベント
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// ブラシの矩形が変わった（`None`は解除）
    Brush(Option<BrushRect>),
    /// スライダーの値（0〜100）が変わった
    SliderInput(f64),
    PointerEnter { id: String, x: f64, y: f64 },
    PointerLeave { id: String },
}

/// 描画命令
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RenderUpdate {
    Stats(SummaryStats),
    CutoffLabel(String),
    Scatter(ScatterFrame),
    DotStyle {
        id: String,
        fill_opacity: f64,
        selected: bool,
    },
    /// 選択中の円のID（それ以外の円は選択解除）
    SelectionMarks(Vec<String>),
    SelectionCount(String),
    /// `None`のときは内訳の表示を消去する
    LanguageBreakdown(Option<LanguageBreakdown>),
    Tooltip(TooltipUpdate),
    Files(FileBreakdown),
}

/// 描画命令を受け取る描画面
pub trait Surface {
    fn apply(&mut self, update: RenderUpdate);
}

impl Surface for Vec<RenderUpdate> {
    fn apply(&mut self, update: RenderUpdate) {
        self.push(update);
    }
}

/// 可視化全体の状態
///
/// # フィールド
///
/// - `commits`: 時刻順のコミット一覧（読み込み後は不変）
/// - `progress`: コミット期間と進捗の対応
/// - `display_offset`: 時刻表示に使うオフセット（最新コミットのもの）
/// - `cutoff`: スライダーから求めた表示上限時刻
/// - `filtered`: 表示中のコミットの添字
/// - `selected`: ブラシで選択中のコミットの添字
/// - `scatter`: 散布図の描画面
#[derive(Debug)]
pub struct MetaState {
    commits: Vec<CommitSummary>,
    progress: ProgressScale,
    display_offset: FixedOffset,
    progress_value: f64,
    cutoff: DateTime<Utc>,
    filtered: Vec<usize>,
    selected: Vec<usize>,
    scatter: Scatterplot,
}

impl MetaState {
    /// 時刻順に並んだコミットから状態を作ります
    ///
    /// # エラー
    ///
    /// コミットが1件もない場合は`MetaError::EmptyDataset`を返します。
    pub fn new(commits: Vec<CommitSummary>, layout: ChartLayout) -> Result<Self, MetaError> {
        let (first, last) = match (commits.first(), commits.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MetaError::EmptyDataset),
        };
        let progress = ProgressScale::new(
            first.datetime.with_timezone(&Utc),
            last.datetime.with_timezone(&Utc),
        );
        let display_offset = *last.datetime.offset();
        let cutoff = progress.domain().1;

        Ok(Self {
            filtered: (0..commits.len()).collect(),
            commits,
            progress,
            display_offset,
            progress_value: 100.0,
            cutoff,
            selected: Vec::new(),
            scatter: Scatterplot::new(layout),
        })
    }

    pub fn commits(&self) -> &[CommitSummary] {
        &self.commits
    }

    pub fn progress_scale(&self) -> &ProgressScale {
        &self.progress
    }

    pub fn progress(&self) -> f64 {
        self.progress_value
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn scatterplot(&self) -> &Scatterplot {
        &self.scatter
    }

    pub fn filtered_commits(&self) -> Vec<&CommitSummary> {
        self.filtered.iter().map(|&i| &self.commits[i]).collect()
    }

    pub fn selected_commits(&self) -> Vec<&CommitSummary> {
        self.selected.iter().map(|&i| &self.commits[i]).collect()
    }

    pub fn stats(&self) -> SummaryStats {
        SummaryStats::compute(&self.commits)
    }

    /// 初回描画
    ///
    /// 要約統計を出力したあと、スライダーを`progress`に置いたときと同じ描画を行います。
    pub fn load(&mut self, progress: f64) -> Vec<RenderUpdate> {
        let mut updates = vec![RenderUpdate::Stats(self.stats())];
        updates.extend(self.on_slider_input(progress));
        updates
    }

    pub fn handle(&mut self, event: UiEvent) -> Vec<RenderUpdate> {
        match event {
            UiEvent::Brush(rect) => self.on_brush(rect),
            UiEvent::SliderInput(value) => self.on_slider_input(value),
            UiEvent::PointerEnter { id, x, y } => self.on_pointer_enter(&id, x, y),
            UiEvent::PointerLeave { id } => self.on_pointer_leave(&id),
        }
    }

    /// イベントを処理し、描画命令を描画面に順に適用します
    pub fn dispatch<S: Surface>(&mut self, event: UiEvent, surface: &mut S) {
        for update in self.handle(event) {
            surface.apply(update);
        }
    }

    fn on_brush(&mut self, rect: Option<BrushRect>) -> Vec<RenderUpdate> {
        let visible = self.filtered_commits();
        let ids: HashSet<String> = select_commits(&visible, self.scatter.scales(), rect)
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        let selected: Vec<usize> = self
            .filtered
            .iter()
            .copied()
            .filter(|&i| ids.contains(&self.commits[i].id))
            .collect();

        tracing::debug!(selected = selected.len(), "brush selection changed");
        self.selected = selected;
        self.selection_updates()
    }

    fn selection_updates(&self) -> Vec<RenderUpdate> {
        let selected = self.selected_commits();
        vec![
            RenderUpdate::SelectionMarks(selected.iter().map(|c| c.id.clone()).collect()),
            RenderUpdate::SelectionCount(selection_count_text(selected.len())),
            RenderUpdate::LanguageBreakdown(LanguageBreakdown::compute(&selected)),
        ]
    }

    fn on_slider_input(&mut self, value: f64) -> Vec<RenderUpdate> {
        self.progress_value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        self.cutoff = self.progress.invert(self.progress_value);
        let cutoff_ms = self.cutoff.timestamp_millis();

        self.filtered = (0..self.commits.len())
            .filter(|&i| self.commits[i].timestamp_millis() <= cutoff_ms)
            .collect();
        tracing::debug!(
            progress = self.progress_value,
            shown = self.filtered.len(),
            "time filter changed"
        );

        let label = long_date_short_time(&self.cutoff.with_timezone(&self.display_offset));
        let mut updates = vec![RenderUpdate::CutoffLabel(label)];

        let before = self.selected.len();
        let filtered = &self.filtered;
        self.selected.retain(|i| filtered.contains(i));
        let selection_changed = self.selected.len() != before;

        let selected_ids: HashSet<String> = self
            .selected_commits()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        let visible: Vec<&CommitSummary> =
            self.filtered.iter().map(|&i| &self.commits[i]).collect();
        updates.push(RenderUpdate::Scatter(self.scatter.update(&visible, &selected_ids)));
        updates.push(RenderUpdate::Files(FileBreakdown::compute(&visible)));

        if selection_changed {
            updates.extend(self.selection_updates());
        }
        updates
    }

    fn on_pointer_enter(&self, id: &str, x: f64, y: f64) -> Vec<RenderUpdate> {
        let Some(commit) = self.filtered_commits().into_iter().find(|c| c.id == id) else {
            return Vec::new();
        };
        vec![
            RenderUpdate::DotStyle {
                id: id.to_string(),
                fill_opacity: HOVER_OPACITY,
                selected: self.is_selected(id),
            },
            RenderUpdate::Tooltip(TooltipUpdate::show(commit, x, y)),
        ]
    }

    fn on_pointer_leave(&self, id: &str) -> Vec<RenderUpdate> {
        vec![
            RenderUpdate::DotStyle {
                id: id.to_string(),
                fill_opacity: DEFAULT_OPACITY,
                selected: self.is_selected(id),
            },
            RenderUpdate::Tooltip(TooltipUpdate::hide()),
        ]
    }

    fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|&i| self.commits[i].id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::record::tests::{row, sample_csv, HEADER};
    use crate::meta::record::{read_lines, summarize};

    fn state_from(csv: &str) -> MetaState {
        let commits = summarize(read_lines(csv.as_bytes()).unwrap());
        MetaState::new(commits, ChartLayout::default()).unwrap()
    }

    fn three_commits() -> String {
        let mut csv = HEADER.to_string();
        csv.push_str(&row("a", "x.rs", 1, "2025-01-01", "08:00:00", "rs"));
        csv.push_str(&row("b", "y.rs", 1, "2025-01-05", "12:00:00", "rs"));
        csv.push_str(&row("b", "y.rs", 2, "2025-01-05", "12:00:00", "rs"));
        csv.push_str(&row("c", "z.md", 1, "2025-01-11", "20:00:00", "md"));
        csv
    }

    fn selection_count(updates: &[RenderUpdate]) -> Option<&str> {
        updates.iter().find_map(|u| match u {
            RenderUpdate::SelectionCount(text) => Some(text.as_str()),
            _ => None,
        })
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        assert!(matches!(
            MetaState::new(Vec::new(), ChartLayout::default()),
            Err(MetaError::EmptyDataset)
        ));
    }

    #[test]
    fn test_load_renders_everything() {
        let mut state = state_from(&sample_csv());
        let updates = state.load(100.0);

        assert!(matches!(updates[0], RenderUpdate::Stats(_)));
        assert_eq!(
            updates[1],
            RenderUpdate::CutoffLabel("February 12, 2025 at 2:00 PM".to_string())
        );
        assert!(matches!(updates[2], RenderUpdate::Scatter(_)));
        assert!(matches!(updates[3], RenderUpdate::Files(_)));
        assert_eq!(state.filtered_commits().len(), 2);
    }

    #[test]
    fn test_slider_bounds() {
        let mut state = state_from(&three_commits());
        let (min, max) = state.progress_scale().domain();
        assert_eq!(min, state.commits()[0].datetime.with_timezone(&Utc));
        assert_eq!(max, state.commits()[2].datetime.with_timezone(&Utc));

        state.handle(UiEvent::SliderInput(100.0));
        assert_eq!(state.filtered_commits().len(), 3);

        state.handle(UiEvent::SliderInput(0.0));
        let shown: Vec<&str> = state.filtered_commits().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(shown, vec!["a"]);

        // 1/1 〜 1/11 の半分は 1/6 → a と b
        state.handle(UiEvent::SliderInput(50.0));
        assert_eq!(state.filtered_commits().len(), 2);
    }

    #[test]
    fn test_slider_is_idempotent() {
        let mut state = state_from(&three_commits());
        state.load(100.0);
        let first = state.handle(UiEvent::SliderInput(40.0));
        let second = state.handle(UiEvent::SliderInput(40.0));

        assert_eq!(first[0], second[0]);
        assert_eq!(first[2], second[2]);
        match &second[1] {
            RenderUpdate::Scatter(frame) => assert!(frame
                .dots
                .iter()
                .all(|d| matches!(d.transition, crate::meta::scatter::Transition::Update { .. }))),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_brush_full_and_cleared() {
        let mut state = state_from(&three_commits());
        state.load(100.0);
        let layout = *state.scatterplot().layout();

        let updates = state.handle(UiEvent::Brush(Some(BrushRect::new(
            0.0,
            0.0,
            layout.width,
            layout.height,
        ))));
        assert_eq!(selection_count(&updates), Some("3 commits selected"));
        match &updates[2] {
            RenderUpdate::LanguageBreakdown(Some(b)) => {
                assert_eq!(b.total_lines, 4);
                let sum: usize = b.shares.iter().map(|s| s.count).sum();
                assert_eq!(sum, 4);
            }
            other => panic!("unexpected update: {:?}", other),
        }

        let updates = state.handle(UiEvent::Brush(None));
        assert_eq!(selection_count(&updates), Some("No commits selected"));
        assert_eq!(updates[2], RenderUpdate::LanguageBreakdown(None));
    }

    #[test]
    fn test_brush_only_sees_filtered_commits() {
        let mut state = state_from(&three_commits());
        state.load(0.0);
        let updates = state.handle(UiEvent::Brush(Some(BrushRect::new(-1e6, -1e6, 1e6, 1e6))));
        assert_eq!(selection_count(&updates), Some("1 commits selected"));
    }

    #[test]
    fn test_slider_drops_hidden_selection() {
        let mut state = state_from(&three_commits());
        state.load(100.0);
        state.handle(UiEvent::Brush(Some(BrushRect::new(-1e6, -1e6, 1e6, 1e6))));

        let updates = state.handle(UiEvent::SliderInput(0.0));
        assert_eq!(selection_count(&updates), Some("1 commits selected"));
        assert_eq!(state.selected_commits().len(), 1);

        // 選択が変わらなければ選択関連の命令は出ない
        let updates = state.handle(UiEvent::SliderInput(0.0));
        assert_eq!(selection_count(&updates), None);
    }

    #[test]
    fn test_hover() {
        let mut state = state_from(&sample_csv());
        state.load(100.0);

        let updates = state.handle(UiEvent::PointerEnter {
            id: "aaa".to_string(),
            x: 10.0,
            y: 20.0,
        });
        assert_eq!(
            updates[0],
            RenderUpdate::DotStyle {
                id: "aaa".to_string(),
                fill_opacity: 1.0,
                selected: false
            }
        );
        match &updates[1] {
            RenderUpdate::Tooltip(t) => {
                assert!(t.visible);
                assert_eq!(t.content.as_ref().map(|c| c.lines), Some(10));
            }
            other => panic!("unexpected update: {:?}", other),
        }

        let updates = state.handle(UiEvent::PointerLeave {
            id: "aaa".to_string(),
        });
        assert_eq!(updates[1], RenderUpdate::Tooltip(TooltipUpdate::hide()));

        assert!(state
            .handle(UiEvent::PointerEnter {
                id: "missing".to_string(),
                x: 0.0,
                y: 0.0
            })
            .is_empty());
    }

    #[test]
    fn test_dispatch_to_surface() {
        let mut state = state_from(&sample_csv());
        let mut surface: Vec<RenderUpdate> = Vec::new();
        state.dispatch(UiEvent::SliderInput(100.0), &mut surface);
        assert_eq!(surface.len(), 3);
    }
}

//! コミット履歴の可視化の中核となるモジュール
//!
//! 処理は以下の流れで行われます：
//!
//! 1. 行単位のデータセット（`loc.csv`）の読み込み
//! 2. コミットIDごとの集約と時刻順の並べ替え
//! 3. 要約統計の計算
//! 4. UIイベント（ブラシ・スライダー）に応じた描画命令の生成
//!
//! # 主要なコンポーネント
//!
//! - `CommitMeta`: データセットを読み込み、集約済みのコミットを保持する
//! - `MetaState`: 選択・表示範囲などの画面状態とイベント処理
//! - `Report`: 描画命令を静的なSVG/HTMLに変換する描画面
//! - `GitRepository`: Gitリポジトリからデータセットを生成する

mod config;
mod error;
mod files;
mod git;
mod record;
mod render;
mod scale;
mod scatter;
mod selection;
mod state;
mod stats;
mod tooltip;

pub use config::{ChartConfig, DatasetConfig, GenerateConfig, MetaConfig, DEFAULT_CONFIG_FILE};
pub use error::MetaError;
pub use files::{FileBreakdown, FileRow, OrdinalScale, UnitMark, TABLEAU10};
pub use git::{write_dataset, GitRepository};
pub use record::{read_lines, summarize, CommitSummary, LineRecord, RawRow, DATASET_COLUMNS};
pub use render::{render_svg, Report};
pub use scale::{LinearScale, ProgressScale, SqrtScale, TimeAxis};
pub use scatter::{
    ChartLayout, Dot, DotGeometry, Margin, ScatterFrame, Scatterplot, Tick, Transition,
};
pub use selection::{
    format_percent, select_commits, selection_count_text, BrushRect, LanguageBreakdown,
    LanguageShare,
};
pub use state::{MetaState, RenderUpdate, Surface, UiEvent};
pub use stats::SummaryStats;
pub use tooltip::{TooltipContent, TooltipUpdate};

use std::io::Read;
use std::path::Path;

/// 読み込み済みのデータセット
///
/// 行レコードはコミットごとにまとめて保持し、
/// `CommitSummary::lines()`から参照します。
pub struct CommitMeta {
    commits: Vec<CommitSummary>,
}

impl CommitMeta {
    /// CSVファイルからデータセットを読み込みます
    ///
    /// # エラー
    ///
    /// 以下の場合にエラーを返します：
    /// - ファイルが開けない
    /// - 行の形式が不正
    /// - コミットが1件もない
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MetaError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MetaError> {
        let lines = read_lines(reader)?;
        let line_count = lines.len();
        let commits = summarize(lines);
        if commits.is_empty() {
            return Err(MetaError::EmptyDataset);
        }
        tracing::info!(lines = line_count, commits = commits.len(), "dataset loaded");
        Ok(Self { commits })
    }

    /// 時刻順のコミット
    pub fn commits(&self) -> &[CommitSummary] {
        &self.commits
    }

    pub fn stats(&self) -> SummaryStats {
        SummaryStats::compute(&self.commits)
    }

    /// 画面状態に変換します
    pub fn into_state(self, layout: ChartLayout) -> Result<MetaState, MetaError> {
        MetaState::new(self.commits, layout)
    }
}

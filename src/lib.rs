//! コミット履歴の可視化ツール
//!
//! このクレートは、コミットが触れたソース行を1行1レコードで記録した
//! データセットを読み込み、コミット単位の集約・要約統計・散布図・
//! ファイル別のユニット可視化を行うための機能を提供します。
//!
//! # 主な機能
//!
//! - 行レコードのコミット単位への集約
//! - 要約統計（総行数、コミット数、ファイル数、平均行数、ピーク時間帯）
//! - 日時 × 時刻の散布図とブラシ選択、言語別内訳
//! - 期間スライダーによる絞り込みとファイル別内訳
//! - Gitリポジトリからのデータセット生成
//!
//! # 使用例
//!
//! ```no_run
//! use commit_meta::{BrushRect, ChartLayout, CommitMeta, Report, UiEvent};
//!
//! let meta = CommitMeta::from_path("loc.csv").unwrap();
//! let mut state = meta.into_state(ChartLayout::default()).unwrap();
//!
//! let mut report = Report::default();
//! for update in state.load(100.0) {
//!     commit_meta::Surface::apply(&mut report, update);
//! }
//! state.dispatch(
//!     UiEvent::Brush(Some(BrushRect::new(40.0, 10.0, 500.0, 470.0))),
//!     &mut report,
//! );
//! println!("{}", report.html());
//! ```

pub mod meta;
pub use meta::*;

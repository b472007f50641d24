//! コミットの散布図（日時 × 時刻、半径 = 変更行数）の描画命令を作るモジュール
//!
//! 描画は何度呼んでも同じ結果になるように作られており、呼び出しごとに
//! スケール・軸・グリッド線を作り直します。円はコミットIDで前回の描画と
//! 突き合わせ、追加・更新・削除のトランジションを決めます。

use super::record::CommitSummary;
use super::scale::{LinearScale, SqrtScale, TimeAxis};
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// トランジションの長さ（ミリ秒）
pub const TRANSITION_MS: u64 = 100;
/// 通常時の塗りの不透明度
pub const DEFAULT_OPACITY: f64 = 0.7;
/// ホバー中の塗りの不透明度
pub const HOVER_OPACITY: f64 = 1.0;
/// 半径の値域
pub const RADIUS_RANGE: (f64, f64) = (2.0, 20.0);

/// 描画領域の余白
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// 描画領域の大きさ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 500.0,
            margin: Margin {
                top: 10.0,
                right: 10.0,
                bottom: 30.0,
                left: 40.0,
            },
        }
    }
}

impl ChartLayout {
    pub fn left(&self) -> f64 {
        self.margin.left
    }

    pub fn right(&self) -> f64 {
        self.width - self.margin.right
    }

    pub fn top(&self) -> f64 {
        self.margin.top
    }

    pub fn bottom(&self) -> f64 {
        self.height - self.margin.bottom
    }

    pub fn usable_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }
}

/// 散布図の3つのスケール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub x: TimeAxis,
    pub y: LinearScale,
    pub r: SqrtScale,
}

impl Scales {
    /// 表示するコミットに合わせてスケールを作ります
    ///
    /// コミットが空の場合は`None`を返します。
    pub fn fit(commits: &[&CommitSummary], layout: &ChartLayout) -> Option<Self> {
        let first = commits.first()?;
        let (mut t_min, mut t_max) = (first.datetime, first.datetime);
        let (mut l_min, mut l_max) = (first.total_lines, first.total_lines);
        for commit in commits {
            t_min = t_min.min(commit.datetime);
            t_max = t_max.max(commit.datetime);
            l_min = l_min.min(commit.total_lines);
            l_max = l_max.max(commit.total_lines);
        }

        Some(Self {
            x: TimeAxis::new(
                (t_min.with_timezone(&Utc), t_max.with_timezone(&Utc)),
                (layout.left(), layout.right()),
            )
            .nice(),
            y: LinearScale::new((0.0, 24.0), (layout.bottom(), layout.top())),
            r: SqrtScale::new((l_min as f64, l_max as f64), RADIUS_RANGE),
        })
    }

    /// コミットの描画位置 (x, y)
    pub fn position(&self, commit: &CommitSummary) -> (f64, f64) {
        (
            self.x.apply(commit.datetime.with_timezone(&Utc)),
            self.y.apply(commit.hour_frac),
        )
    }

    pub fn geometry(&self, commit: &CommitSummary) -> DotGeometry {
        let (cx, cy) = self.position(commit);
        DotGeometry {
            cx,
            cy,
            r: self.r.apply(commit.total_lines as f64),
        }
    }
}

/// 円の位置と半径
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DotGeometry {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

/// 円のトランジション
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Transition {
    /// 新しく現れる円。最終位置で半径0から広がる
    Enter,
    /// 既存の円。前回の位置・半径から移動する
    Update { from: DotGeometry },
    /// 消える円。半径0まで縮んでから取り除かれる
    Exit { from: DotGeometry },
}

/// 円1つ分の描画命令
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dot {
    pub id: String,
    pub url: String,
    /// トランジション終了時の状態
    pub target: DotGeometry,
    pub transition: Transition,
    pub fill_opacity: f64,
    pub selected: bool,
}

/// 軸の目盛り
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// 散布図1回分の描画命令
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterFrame {
    pub layout: ChartLayout,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    /// 横方向のグリッド線のy座標
    pub gridlines: Vec<f64>,
    /// 描画順（大きい円が先）。削除される円は最後に並ぶ
    pub dots: Vec<Dot>,
    pub duration_ms: u64,
}

/// 散布図の描画面
///
/// 直前に描いた円を保持し、次の描画との差分を計算します。
#[derive(Debug, Clone, Default)]
pub struct Scatterplot {
    layout: ChartLayout,
    scales: Option<Scales>,
    /// 前回描いた円（ID → URLと位置）
    rendered: IndexMap<String, (String, DotGeometry)>,
}

impl Scatterplot {
    pub fn new(layout: ChartLayout) -> Self {
        Self {
            layout,
            scales: None,
            rendered: IndexMap::new(),
        }
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    /// 最後の描画で使ったスケール
    pub fn scales(&self) -> Option<&Scales> {
        self.scales.as_ref()
    }

    /// 指定したコミットで散布図を描き直します
    ///
    /// # 引数
    ///
    /// - `commits`: 表示するコミット
    /// - `selected`: 選択中のコミットID
    pub fn update(
        &mut self,
        commits: &[&CommitSummary],
        selected: &HashSet<String>,
    ) -> ScatterFrame {
        if let Some(scales) = Scales::fit(commits, &self.layout) {
            self.scales = Some(scales);
        }

        let mut sorted: Vec<&CommitSummary> = commits.to_vec();
        sorted.sort_by(|a, b| b.total_lines.cmp(&a.total_lines));

        let mut next: IndexMap<String, (String, DotGeometry)> = IndexMap::new();
        let mut dots = Vec::with_capacity(sorted.len());
        if let Some(scales) = &self.scales {
            for commit in sorted {
                let target = scales.geometry(commit);
                let transition = match self.rendered.get(&commit.id) {
                    Some((_, from)) => Transition::Update { from: *from },
                    None => Transition::Enter,
                };
                next.insert(commit.id.clone(), (commit.url.clone(), target));
                dots.push(Dot {
                    id: commit.id.clone(),
                    url: commit.url.clone(),
                    target,
                    transition,
                    fill_opacity: DEFAULT_OPACITY,
                    selected: selected.contains(&commit.id),
                });
            }
        }

        for (id, (url, from)) in &self.rendered {
            if !next.contains_key(id) {
                dots.push(Dot {
                    id: id.clone(),
                    url: url.clone(),
                    target: DotGeometry { r: 0.0, ..*from },
                    transition: Transition::Exit { from: *from },
                    fill_opacity: DEFAULT_OPACITY,
                    selected: false,
                });
            }
        }
        tracing::debug!(
            shown = next.len(),
            removed = dots.len() - next.len(),
            "scatterplot updated"
        );
        self.rendered = next;

        let (x_ticks, y_ticks, gridlines) = match &self.scales {
            Some(scales) => axes(scales),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        ScatterFrame {
            layout: self.layout,
            x_ticks,
            y_ticks,
            gridlines,
            dots,
            duration_ms: TRANSITION_MS,
        }
    }
}

fn axes(scales: &Scales) -> (Vec<Tick>, Vec<Tick>, Vec<f64>) {
    let x_ticks = scales
        .x
        .ticks()
        .into_iter()
        .map(|(t, label)| Tick {
            position: scales.x.apply(t),
            label,
        })
        .collect();

    let hours = scales.y.ticks(10);
    let gridlines = hours.iter().map(|h| scales.y.apply(*h)).collect();
    let y_ticks = hours
        .iter()
        .map(|h| Tick {
            position: scales.y.apply(*h),
            label: format!("{:02}:00", (*h as i64).rem_euclid(24)),
        })
        .collect();

    (x_ticks, y_ticks, gridlines)
}

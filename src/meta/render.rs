//! 描画命令を静的なSVG/HTMLに変換するモジュール
//!
//! `Report`は`Surface`として描画命令を受け取り、最新の状態を保持します。
//! トランジションは最終状態だけを出力し、削除中の円は出力しません。

use super::files::FileBreakdown;
use super::scatter::{ScatterFrame, Transition};
use super::selection::LanguageBreakdown;
use super::state::{RenderUpdate, Surface};
use super::stats::SummaryStats;
use super::tooltip::TooltipUpdate;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

const ACCENT: &str = "#4e79a7";
const SELECTED: &str = "#ff6b6b";

/// 描画命令を適用した結果の画面
#[derive(Debug, Default)]
pub struct Report {
    pub stats: Option<SummaryStats>,
    pub cutoff_label: String,
    pub scatter: Option<ScatterFrame>,
    pub selected: HashSet<String>,
    pub opacity: HashMap<String, f64>,
    pub selection_count: String,
    pub breakdown: Option<LanguageBreakdown>,
    pub tooltip: Option<TooltipUpdate>,
    pub files: FileBreakdown,
}

impl Surface for Report {
    fn apply(&mut self, update: RenderUpdate) {
        match update {
            RenderUpdate::Stats(stats) => self.stats = Some(stats),
            RenderUpdate::CutoffLabel(label) => self.cutoff_label = label,
            RenderUpdate::Scatter(frame) => {
                let shown: HashSet<&str> = frame
                    .dots
                    .iter()
                    .filter(|d| !matches!(d.transition, Transition::Exit { .. }))
                    .map(|d| d.id.as_str())
                    .collect();
                self.opacity.retain(|id, _| shown.contains(id.as_str()));
                self.scatter = Some(frame);
            }
            RenderUpdate::DotStyle {
                id,
                fill_opacity,
                selected,
            } => {
                if selected {
                    self.selected.insert(id.clone());
                } else {
                    self.selected.remove(&id);
                }
                self.opacity.insert(id, fill_opacity);
            }
            RenderUpdate::SelectionMarks(ids) => self.selected = ids.into_iter().collect(),
            RenderUpdate::SelectionCount(text) => self.selection_count = text,
            RenderUpdate::LanguageBreakdown(breakdown) => self.breakdown = breakdown,
            RenderUpdate::Tooltip(tooltip) => self.tooltip = Some(tooltip),
            RenderUpdate::Files(files) => self.files = files,
        }
    }
}

impl Report {
    pub fn svg(&self) -> String {
        match &self.scatter {
            Some(frame) => render_svg(frame, &self.selected, &self.opacity),
            None => String::new(),
        }
    }

    /// 単体で開けるHTMLページを出力します
    pub fn html(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"utf-8\">\n<title>Meta</title>\n<style>\n\
             dl.stats{display:grid;grid-template-columns:repeat(5,1fr)}\n\
             dl.stats dt{grid-row:1;font-size:.8em;text-transform:uppercase}\n\
             dl.stats dd{grid-row:2;margin:0;font-size:1.6em}\n\
             circle.selected{fill:#ff6b6b}\n\
             .files>div{display:grid;grid-template-columns:subgrid;grid-column:1/-1}\n\
             .files{display:grid;grid-template-columns:1fr 4fr}\n\
             .files dd{display:flex;flex-wrap:wrap;align-items:start;\
             align-content:start;gap:.15em;margin-left:0}\n\
             .line{display:flex;width:.5em;aspect-ratio:1;border-radius:50%}\n\
             </style>\n</head>\n<body>\n<h1>Meta</h1>\n",
        );

        if let Some(stats) = &self.stats {
            html.push_str("<dl class=\"stats\">\n");
            for (label, value) in stats.entries() {
                let _ = writeln!(
                    html,
                    "<dt>{}</dt><dd>{}</dd>",
                    escape_xml(label),
                    escape_xml(&value)
                );
            }
            html.push_str("</dl>\n");
        }

        let _ = writeln!(
            html,
            "<p>Show commits until: <time id=\"selectedTime\">{}</time></p>",
            escape_xml(&self.cutoff_label)
        );
        let _ = writeln!(html, "<div id=\"chart\">{}</div>", self.svg());
        let _ = writeln!(
            html,
            "<p id=\"selection-count\">{}</p>",
            escape_xml(&self.selection_count)
        );

        html.push_str("<dl id=\"language-breakdown\" class=\"stats\">\n");
        if let Some(breakdown) = &self.breakdown {
            for share in &breakdown.shares {
                let _ = writeln!(
                    html,
                    "<dt>{}</dt><dd>{}</dd>",
                    escape_xml(&share.language),
                    escape_xml(&share.label())
                );
            }
        }
        html.push_str("</dl>\n");

        html.push_str("<dl class=\"files\">\n");
        for file in &self.files.files {
            let _ = write!(
                html,
                "<div><dt><code>{}</code><small>{} lines</small></dt><dd>",
                escape_xml(&file.name),
                file.line_count
            );
            for unit in &file.units {
                let _ = write!(
                    html,
                    "<div class=\"line\" style=\"background:{}\" title=\"{}\"></div>",
                    unit.color,
                    escape_xml(&unit.line_type)
                );
            }
            html.push_str("</dd></div>\n");
        }
        html.push_str("</dl>\n</body>\n</html>\n");
        html
    }
}

/// 散布図の描画命令をSVG文字列に変換します
///
/// # 引数
///
/// - `frame`: 散布図の描画命令
/// - `selected`: 選択中のコミットID
/// - `opacity`: ホバーなどで変更された不透明度
pub fn render_svg(
    frame: &ScatterFrame,
    selected: &HashSet<String>,
    opacity: &HashMap<String, f64>,
) -> String {
    let layout = &frame.layout;
    let mut svg = String::with_capacity(frame.dots.len() * 160 + 2048);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" style="overflow:visible;font-family:system-ui,sans-serif;font-size:10px">"#,
        w = layout.width,
        h = layout.height,
    );

    svg.push_str(r#"<g class="gridlines">"#);
    for y in &frame.gridlines {
        let _ = write!(
            svg,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#ccc" stroke-opacity="0.5"/>"##,
            layout.left(),
            layout.right(),
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="x-axis">"#);
    let _ = write!(
        svg,
        r#"<line x1="{}" y1="{b}" x2="{}" y2="{b}" stroke="currentColor"/>"#,
        layout.left(),
        layout.right(),
        b = layout.bottom(),
    );
    for tick in &frame.x_ticks {
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
            tick.position,
            layout.bottom() + 16.0,
            escape_xml(&tick.label),
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="y-axis">"#);
    let _ = write!(
        svg,
        r#"<line x1="{l}" y1="{}" x2="{l}" y2="{}" stroke="currentColor"/>"#,
        layout.top(),
        layout.bottom(),
        l = layout.left(),
    );
    for tick in &frame.y_ticks {
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="end">{}</text>"#,
            layout.left() - 6.0,
            tick.position + 3.0,
            escape_xml(&tick.label),
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="dots">"#);
    for dot in &frame.dots {
        if matches!(dot.transition, Transition::Exit { .. }) {
            continue;
        }
        let is_selected = selected.contains(&dot.id);
        let _ = write!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{}"{}><title>{}</title></circle>"#,
            dot.target.cx,
            dot.target.cy,
            dot.target.r,
            if is_selected { SELECTED } else { ACCENT },
            opacity.get(&dot.id).copied().unwrap_or(dot.fill_opacity),
            if is_selected { r#" class="selected""# } else { "" },
            escape_xml(&dot.id),
        );
    }
    svg.push_str("</g></svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

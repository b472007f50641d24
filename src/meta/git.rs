//! Gitリポジトリから行単位のデータセットを生成するモジュール
//!
//! libgit2を使ってHEADのツリーにある各ファイルをblameし、
//! 「その行を最後に変更したコミット」を1行1レコードとして出力します。

use super::error::MetaError;
use super::record::RawRow;
use chrono::{DateTime, FixedOffset};
use git2::{BlameOptions, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use regex::Regex;
use std::io::Write;
use std::path::Path;

/// インデント1段あたりの桁数
const INDENT_UNIT: usize = 2;
const TAB_WIDTH: usize = 4;

/// Gitリポジトリへのアクセスを管理する構造体
///
/// # フィールド
///
/// - `repo`: libgit2のリポジトリハンドル
/// - `include_patterns`: 対象とするファイルパターン（空なら全ファイル）
/// - `exclude_patterns`: 除外するファイルパターン
pub struct GitRepository {
    repo: Repository,
    include_patterns: Vec<Regex>,
    exclude_patterns: Vec<Regex>,
}

impl GitRepository {
    /// 指定されたパスのGitリポジトリをオープンします
    ///
    /// # エラー
    ///
    /// 以下の場合にエラーを返します：
    /// - リポジトリのオープンに失敗
    /// - パターンの正規表現への変換に失敗
    pub fn open(
        path: impl AsRef<Path>,
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
    ) -> Result<Self, MetaError> {
        let repo = Repository::open(path)?;

        Ok(Self {
            repo,
            include_patterns: compile_patterns(include_patterns)?,
            exclude_patterns: compile_patterns(exclude_patterns)?,
        })
    }

    /// `origin`リモートがGitHubを指していれば`owner/name`を返します
    pub fn origin_slug(&self) -> Option<String> {
        let remote = self.repo.find_remote("origin").ok()?;
        slug_from_url(remote.url()?)
    }

    fn should_include_file(&self, file_path: &str) -> bool {
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(file_path))
        {
            return false;
        }

        if self.include_patterns.is_empty() {
            return true;
        }

        self.include_patterns
            .iter()
            .any(|pattern| pattern.is_match(file_path))
    }

    /// HEADのツリーにある対象ファイルのパスとblobのID
    fn tracked_files(&self) -> Result<Vec<(String, Oid)>, MetaError> {
        let tree = self.repo.head()?.peel_to_tree()?;
        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    let path = format!("{root}{name}");
                    if self.should_include_file(&path) {
                        files.push((path, entry.id()));
                    }
                }
            }
            TreeWalkResult::Ok
        })?;
        Ok(files)
    }

    /// 対象ファイルの全行をblameしてデータセットの行を作ります
    ///
    /// # 引数
    ///
    /// - `slug`: `owner/name` 形式のリポジトリ名
    ///
    /// バイナリファイルとUTF-8でないファイルは読み飛ばします。
    pub fn blame_rows(&self, slug: &str) -> Result<Vec<RawRow>, MetaError> {
        let mut rows = Vec::new();
        let files = self.tracked_files()?;

        for (path, blob_id) in &files {
            let blob = self.repo.find_blob(*blob_id)?;
            if blob.is_binary() {
                tracing::warn!(file = %path, "skipping binary file");
                continue;
            }
            let Ok(content) = std::str::from_utf8(blob.content()) else {
                tracing::warn!(file = %path, "skipping non UTF-8 file");
                continue;
            };

            let mut opts = BlameOptions::new();
            let blame = self.repo.blame_file(Path::new(path), Some(&mut opts))?;
            let line_type = line_type(path);

            for (index, text) in content.lines().enumerate() {
                let line_no = index + 1;
                let Some(hunk) = blame.get_line(line_no) else {
                    continue;
                };
                let signature = hunk.final_signature();
                let when = signature.when();
                let datetime = signature_time(when.seconds(), when.offset_minutes())?;

                rows.push(RawRow {
                    commit: hunk.final_commit_id().to_string(),
                    file: path.clone(),
                    line: line_no as u32,
                    depth: indent_depth(text),
                    length: text.chars().count() as u32,
                    date: datetime.format("%Y-%m-%d").to_string(),
                    time: datetime.format("%H:%M:%S").to_string(),
                    timezone: datetime.format("%:z").to_string(),
                    datetime: datetime.to_rfc3339(),
                    author: signature.name().unwrap_or("unknown").to_string(),
                    repo: slug.to_string(),
                    line_type: line_type.clone(),
                });
            }
        }

        tracing::info!(files = files.len(), lines = rows.len(), "dataset generated");
        Ok(rows)
    }
}

/// データセットの行をCSVとして書き出します
pub fn write_dataset<W: Write>(rows: &[RawRow], writer: W) -> Result<(), MetaError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn compile_patterns(patterns: Vec<String>) -> Result<Vec<Regex>, MetaError> {
    patterns
        .into_iter()
        .map(|p| Regex::new(&glob_to_regex(&p)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MetaError::InvalidPattern(e.to_string()))
}

fn slug_from_url(url: &str) -> Option<String> {
    let re = Regex::new(r"github\.com[:/]([^/]+)/([^/]+?)(?:\.git)?/?$").ok()?;
    let caps = re.captures(url)?;
    Some(format!("{}/{}", &caps[1], &caps[2]))
}

fn signature_time(seconds: i64, offset_minutes: i32) -> Result<DateTime<FixedOffset>, MetaError> {
    let invalid = || MetaError::InvalidRecord {
        row: 0,
        reason: format!("invalid commit time {seconds} {offset_minutes:+}"),
    };
    let offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(invalid)?;
    let utc = DateTime::from_timestamp(seconds, 0).ok_or_else(invalid)?;
    Ok(utc.with_timezone(&offset))
}

/// 行頭の空白の桁数（タブは4桁）をインデント段数に換算します
fn indent_depth(text: &str) -> u32 {
    let columns: usize = text
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    (columns / INDENT_UNIT) as u32
}

/// 拡張子（小文字）を行の種類とします。拡張子がなければファイル名
fn line_type(path: &str) -> String {
    let path = Path::new(path);
    path.extension()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // `**/` は0個以上のディレクトリにマッチする
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:.*/)?");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '/' => regex.push('/'),
            c if c.is_alphanumeric() => regex.push(c),
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    regex
}

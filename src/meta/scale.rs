//! 座標変換（スケール）を提供するモジュール
//!
//! 散布図とスライダーで使う4種類のスケールを持ちます。
//!
//! - `ProgressScale`: コミット期間を0〜100の進捗に対応付ける
//! - `TimeAxis`: 時刻をx座標へ（切りの良い範囲に丸める）
//! - `LinearScale`: 時刻(0〜24時)をy座標へ
//! - `SqrtScale`: 変更行数を円の半径へ

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

const SECOND: i64 = 1_000;
const MINUTE: i64 = SECOND * 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;
const WEEK: i64 = DAY * 7;
const MONTH: i64 = DAY * 30;
const YEAR: i64 = DAY * 365;

/// 定義域の両端が等しいときは値域の中央を返す線形補間
fn interpolate(x: f64, d0: f64, d1: f64, r0: f64, r1: f64) -> f64 {
    let t = if d1 == d0 { 0.5 } else { (x - d0) / (d1 - d0) };
    r0 + t * (r1 - r0)
}

/// 線形スケール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, x: f64) -> f64 {
        interpolate(x, self.domain.0, self.domain.1, self.range.0, self.range.1)
    }

    /// おおよそ`count`個の切りの良い目盛りを返します
    ///
    /// 刻み幅は1・2・5×10^nから選びます。
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if lo == hi || count == 0 {
            return vec![lo];
        }

        let step = tick_step(lo, hi, count);
        let start = (lo / step).ceil() as i64;
        let stop = (hi / step).floor() as i64;
        (start..=stop).map(|i| i as f64 * step).collect()
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count as f64;
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

/// 平方根スケール
///
/// 円の面積が値に比例するよう、半径には値の平方根を対応付けます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, x: f64) -> f64 {
        interpolate(
            x.sqrt(),
            self.domain.0.sqrt(),
            self.domain.1.sqrt(),
            self.range.0,
            self.range.1,
        )
    }
}

/// コミット期間 [最古, 最新] を進捗 [0, 100] に対応付けるスケール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressScale {
    min: DateTime<Utc>,
    max: DateTime<Utc>,
}

impl ProgressScale {
    pub fn new(min: DateTime<Utc>, max: DateTime<Utc>) -> Self {
        Self { min, max }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.min, self.max)
    }

    pub fn apply(&self, t: DateTime<Utc>) -> f64 {
        interpolate(
            t.timestamp_millis() as f64,
            self.min.timestamp_millis() as f64,
            self.max.timestamp_millis() as f64,
            0.0,
            100.0,
        )
    }

    /// 進捗値を時刻に戻します
    ///
    /// 入力は0〜100に丸め込み、100のときは必ず最新時刻と一致します。
    pub fn invert(&self, progress: f64) -> DateTime<Utc> {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 100.0) };
        let span = (self.max - self.min).num_milliseconds();
        let offset = (span as f64 * progress / 100.0).round() as i64;
        self.min + Duration::milliseconds(offset)
    }
}

/// 目盛りの間隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    Millis(i64),
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Week,
    Months(i64),
    Years(i64),
}

impl TickInterval {
    /// 目安となる間隔の長さでおおよそ`count`個の目盛りになる間隔を選びます
    fn choose(start: i64, stop: i64, count: usize) -> Self {
        const CANDIDATES: &[(TickInterval, i64)] = &[
            (TickInterval::Seconds(1), SECOND),
            (TickInterval::Seconds(5), 5 * SECOND),
            (TickInterval::Seconds(15), 15 * SECOND),
            (TickInterval::Seconds(30), 30 * SECOND),
            (TickInterval::Minutes(1), MINUTE),
            (TickInterval::Minutes(5), 5 * MINUTE),
            (TickInterval::Minutes(15), 15 * MINUTE),
            (TickInterval::Minutes(30), 30 * MINUTE),
            (TickInterval::Hours(1), HOUR),
            (TickInterval::Hours(3), 3 * HOUR),
            (TickInterval::Hours(6), 6 * HOUR),
            (TickInterval::Hours(12), 12 * HOUR),
            (TickInterval::Days(1), DAY),
            (TickInterval::Days(2), 2 * DAY),
            (TickInterval::Week, WEEK),
            (TickInterval::Months(1), MONTH),
            (TickInterval::Months(3), 3 * MONTH),
            (TickInterval::Years(1), YEAR),
        ];

        let span = (stop - start).abs() as f64;
        let target = span / count as f64;
        let i = CANDIDATES.partition_point(|(_, d)| (*d as f64) <= target);

        if i == CANDIDATES.len() {
            let step = tick_step(start as f64 / YEAR as f64, stop as f64 / YEAR as f64, count);
            return TickInterval::Years((step as i64).max(1));
        }
        if i == 0 {
            let step = tick_step(start as f64, stop as f64, count);
            return TickInterval::Millis((step as i64).max(1));
        }

        let (prev, prev_d) = CANDIDATES[i - 1];
        let (next, next_d) = CANDIDATES[i];
        if target / (prev_d as f64) < (next_d as f64) / target {
            prev
        } else {
            next
        }
    }

    /// `t`以下で最大の目盛り位置
    fn floor(&self, t: NaiveDateTime) -> NaiveDateTime {
        let ms = t.and_utc().timestamp_millis();
        let fixed = |unit: i64| from_millis(ms.div_euclid(unit) * unit);
        match *self {
            TickInterval::Millis(n) => fixed(n),
            TickInterval::Seconds(n) => fixed(n * SECOND),
            TickInterval::Minutes(n) => fixed(n * MINUTE),
            TickInterval::Hours(n) => fixed(n * HOUR),
            TickInterval::Days(n) => {
                let mut day = t.date();
                while (day.day() as i64 - 1) % n != 0 {
                    day = day.pred_opt().unwrap_or(day);
                }
                midnight(day)
            }
            TickInterval::Week => {
                let back = t.date().weekday().num_days_from_sunday() as i64;
                midnight(t.date() - Duration::days(back))
            }
            TickInterval::Months(n) => {
                let month0 = (t.month0() as i64 / n) * n;
                midnight(ymd(t.year(), month0 as u32 + 1, 1))
            }
            TickInterval::Years(n) => {
                let year = t.year().div_euclid(n as i32) * n as i32;
                midnight(ymd(year, 1, 1))
            }
        }
    }

    /// 目盛り位置`t`の次の目盛り位置
    fn next(&self, t: NaiveDateTime) -> NaiveDateTime {
        match *self {
            TickInterval::Millis(n) => t + Duration::milliseconds(n),
            TickInterval::Seconds(n) => t + Duration::seconds(n),
            TickInterval::Minutes(n) => t + Duration::minutes(n),
            TickInterval::Hours(n) => t + Duration::hours(n),
            TickInterval::Days(n) => {
                let mut day = t.date();
                loop {
                    day = day.succ_opt().unwrap_or(day);
                    if (day.day() as i64 - 1) % n == 0 {
                        return midnight(day);
                    }
                }
            }
            TickInterval::Week => t + Duration::days(7),
            TickInterval::Months(n) => {
                let months = t.year() as i64 * 12 + t.month0() as i64 + n;
                midnight(ymd(months.div_euclid(12) as i32, months.rem_euclid(12) as u32 + 1, 1))
            }
            TickInterval::Years(n) => midnight(ymd(t.year() + n as i32, 1, 1)),
        }
    }

    fn ceil(&self, t: NaiveDateTime) -> NaiveDateTime {
        let floor = self.floor(t);
        if floor < t {
            self.next(floor)
        } else {
            floor
        }
    }
}

fn from_millis(ms: i64) -> NaiveDateTime {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.naive_utc())
        .unwrap_or_default()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(0, 0, 0).unwrap_or_default()
}

/// 時刻をx座標に対応付けるスケール
///
/// `nice()`で定義域を目盛り間隔の境界まで広げます。計算はUTCで行います。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    pub domain: (DateTime<Utc>, DateTime<Utc>),
    pub range: (f64, f64),
}

impl TimeAxis {
    pub const DEFAULT_TICKS: usize = 10;

    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn nice(mut self) -> Self {
        let (start, stop) = self.domain;
        if start >= stop {
            return self;
        }
        let interval = TickInterval::choose(
            start.timestamp_millis(),
            stop.timestamp_millis(),
            Self::DEFAULT_TICKS,
        );
        self.domain = (
            interval.floor(start.naive_utc()).and_utc(),
            interval.ceil(stop.naive_utc()).and_utc(),
        );
        self
    }

    pub fn apply(&self, t: DateTime<Utc>) -> f64 {
        interpolate(
            t.timestamp_millis() as f64,
            self.domain.0.timestamp_millis() as f64,
            self.domain.1.timestamp_millis() as f64,
            self.range.0,
            self.range.1,
        )
    }

    /// 目盛りの時刻とラベル
    pub fn ticks(&self) -> Vec<(DateTime<Utc>, String)> {
        let (start, stop) = self.domain;
        if start >= stop {
            return vec![(start, tick_label(start.naive_utc()))];
        }
        let interval = TickInterval::choose(
            start.timestamp_millis(),
            stop.timestamp_millis(),
            Self::DEFAULT_TICKS,
        );

        let mut ticks = Vec::new();
        let mut t = interval.ceil(start.naive_utc());
        let end = stop.naive_utc();
        while t <= end {
            ticks.push((t.and_utc(), tick_label(t)));
            let next = interval.next(t);
            if next <= t {
                break;
            }
            t = next;
        }
        ticks
    }
}

/// 目盛りの細かさに応じて書式を切り替えます
fn tick_label(t: NaiveDateTime) -> String {
    let fmt = if t.nanosecond() != 0 {
        ".%3f"
    } else if t.second() != 0 {
        ":%S"
    } else if t.minute() != 0 {
        "%I:%M"
    } else if t.hour() != 0 {
        "%I %p"
    } else if t.day() != 1 {
        if t.weekday().num_days_from_sunday() != 0 {
            "%a %d"
        } else {
            "%b %d"
        }
    } else if t.month() != 1 {
        "%B"
    } else {
        "%Y"
    };
    t.format(fmt).to_string()
}

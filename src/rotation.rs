use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use time::{macros::time, Date, OffsetDateTime, Time, UtcOffset};

/// ログファイルを切り替える時刻（ローカル時刻の0時0分1秒）
pub const ROTATION_TIME: Time = time!(0:00:01);

/// 現在日時を提供する。
///
/// ログ行のタイムスタンプ、ログファイル名の日付、及び切り替え時刻の計算に使用する。
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// システム時計
///
/// ローカル時刻のオフセットは作成時に一度だけ取得する。
/// 取得できない場合は、UTCで動作する。
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// 指定したオフセットで動作するシステム時計を作成する。
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// 次にログファイルを切り替えるまでの時間を返却する。
///
/// `now`と同じ日の0時0分1秒を過ぎている場合は、翌日の0時0分1秒までの時間となる。
///
/// # 引数
///
/// - now: 現在日時。
///
/// # 戻り値
///
/// 次の切り替え時刻までの時間。
pub fn next_deadline(now: OffsetDateTime) -> Duration {
    let mut deadline = now.replace_time(ROTATION_TIME);
    if now >= deadline {
        deadline += time::Duration::DAY;
    }

    Duration::try_from(deadline - now).unwrap_or(Duration::ZERO)
}

/// 日毎のログファイル名を作成して、返却する。
///
/// ログファイル名は、`info_log_<year>_<month>_<day>.log`となる。月と日はゼロ埋めしない。
pub fn daily_log_filename(date: Date) -> String {
    format!(
        "info_log_{}_{}_{}.log",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// ディレクトリ内の日毎のログファイルパスを返却する。
pub fn daily_log_path(directory: &Path, date: Date) -> PathBuf {
    directory.join(daily_log_filename(date))
}

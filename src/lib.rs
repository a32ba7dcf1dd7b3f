//! Daily Rolling Logger
//!
//! ----------------------------------------------------------------------------
//!
//! このクレートは、ログをファイルに記録することを目的としている。
//! 任意のスレッドから受け取ったログ行を、容量付きのキューを経由して専用のライタースレッドに渡し、
//! ライタースレッドだけがログファイルに書き込む。
//!
//! ライタースレッドは、ローカル時刻の0時0分1秒になると、ログの記録を新しいファイルに切り替える。
//! ログファイル名は、`info_log_<year>_<month>_<day>.log`となる。
//!
//! ログ行の形式は、次のとおり。
//!
//! ```text
//! ======2024/03/09 10:15:42=====[DEBUG](app::handlers::login=[login.rs]:42) x=5
//! ```
//!
//! プロセス全体で共有するロガーは`start_log`で起動し、`debug!`などのマクロで記録する。
//! 独立したロガーが必要な場合は、`Logger::start`で起動したインスタンスを使用する。
//!
//! ```no_run
//! use daily_rolling_logger::{start_log, Severity};
//!
//! start_log("./logs", Severity::Debug).unwrap();
//! daily_rolling_logger::debug!("x={}", 5);
//! ```

mod appenders;
mod error;
pub mod format;
pub mod global;
pub mod logger;
pub mod redirect;
pub mod rotation;
pub mod severity;

pub use error::Error;
pub use format::{format_record, LogRecord, SourceLocation};
pub use global::{critical, debug, error, info, log, logger, start_log, start_log_with};
pub use logger::{FullQueuePolicy, LogSink, Logger, LoggerConfig, DEFAULT_QUEUE_CAPACITY};
pub use redirect::install_tracing_redirect;
pub use rotation::{daily_log_filename, next_deadline, Clock, SystemClock};
pub use severity::{ParseSeverityError, Severity};

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($severity:expr, $logger:expr => $($arg:tt)+) => {
        $logger.log(
            $severity,
            ::std::option::Option::Some(&$crate::source_location!()),
            ::std::format_args!($($arg)+),
        )
    };
    ($severity:expr, $($arg:tt)+) => {
        $crate::log(
            $severity,
            ::std::option::Option::Some(&$crate::source_location!()),
            ::std::format_args!($($arg)+),
        )
    };
}

/// デバッグのログを記録する。
///
/// `debug!("x={}", x)`はプロセス全体のロガーに、`debug!(logger => "x={}", x)`は
/// 指定したロガーに記録する。
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::__log!($crate::Severity::Debug, $($arg)+)
    };
}

/// 情報のログを記録する。
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__log!($crate::Severity::Info, $($arg)+)
    };
}

/// エラーのログを記録する。
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__log!($crate::Severity::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::__log!($crate::Severity::Critical, $($arg)+)
    };
}

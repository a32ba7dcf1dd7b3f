//! プロセス全体で共有するロガー
//!
//! `start_log`で一度だけ起動する。起動するまでのログ出力は、何もせずに破棄される。

use std::{
    fmt,
    path::Path,
    sync::{Mutex, OnceLock, PoisonError},
};

use crate::{
    error::Error,
    format::SourceLocation,
    logger::{Logger, LoggerConfig},
    severity::Severity,
};

static LOGGER: OnceLock<Logger> = OnceLock::new();
static START_LOCK: Mutex<()> = Mutex::new(());

/// プロセス全体で共有するロガーを起動する。
///
/// `tracing`の出力も同じログファイルに切り替える。
///
/// # 引数
///
/// - directory: ログファイルを作成するディレクトリ。
/// - threshold: 出力するログの重要度の閾値。
///
/// # 戻り値
///
/// 既に起動している場合は`Error::AlreadyStarted`。
pub fn start_log(directory: impl AsRef<Path>, threshold: Severity) -> Result<(), Error> {
    start_log_with(LoggerConfig::new(directory, threshold).with_tracing_redirect(true))
}

/// 設定を指定して、プロセス全体で共有するロガーを起動する。
///
/// 起動に失敗した場合、ロガーは設定されないので、原因を取り除いてから再度起動できる。
pub fn start_log_with(config: LoggerConfig) -> Result<(), Error> {
    let _guard = START_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if LOGGER.get().is_some() {
        return Err(Error::AlreadyStarted);
    }
    let logger = Logger::start(config)?;

    LOGGER.set(logger).map_err(|_| Error::AlreadyStarted)
}

/// 起動済みのロガーを返却する。
pub fn logger() -> Option<&'static Logger> {
    LOGGER.get()
}

pub fn log(severity: Severity, location: Option<&SourceLocation>, args: fmt::Arguments<'_>) {
    if let Some(logger) = LOGGER.get() {
        logger.log(severity, location, args);
    }
}

/// デバッグのログを記録する。
///
/// `#[track_caller]`で取得する呼び出し元の位置は関数名を持たないため、行の注記は
/// `([<file>]:<line>)`となる。`(<func>=[<file>]:<line>)`の注記が必要な場合は、
/// `debug!`などのマクロを使用する。
#[track_caller]
pub fn debug(args: fmt::Arguments<'_>) {
    log(Severity::Debug, Some(&SourceLocation::caller()), args);
}

/// 情報のログを記録する。関数名を含めるには`info!`マクロを使用する。
#[track_caller]
pub fn info(args: fmt::Arguments<'_>) {
    log(Severity::Info, Some(&SourceLocation::caller()), args);
}

/// エラーのログを記録する。関数名を含めるには`error!`マクロを使用する。
#[track_caller]
pub fn error(args: fmt::Arguments<'_>) {
    log(Severity::Error, Some(&SourceLocation::caller()), args);
}

/// 重大な障害のログを記録する。関数名を含めるには`critical!`マクロを使用する。
#[track_caller]
pub fn critical(args: fmt::Arguments<'_>) {
    log(Severity::Critical, Some(&SourceLocation::caller()), args);
}

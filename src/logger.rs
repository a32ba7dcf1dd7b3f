use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, Sender};

use crate::{
    appenders::{open_log_file, DailyFileWriter},
    error::Error,
    format::{format_record, LogRecord, SourceLocation},
    redirect::install_tracing_redirect,
    rotation::{daily_log_path, Clock, SystemClock},
    severity::Severity,
};

/// キューに格納できるログ行の既定の最大数
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// キューが満杯のときの振る舞い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullQueuePolicy {
    /// 空きができるまで待機する
    #[default]
    Block,
    /// 指定した時間だけ待機し、空きができなければログ行を破棄する
    BlockWithTimeout(Duration),
    /// 待機せずに、新しいログ行を破棄する
    DropNewest,
}

/// ロガーの設定
pub struct LoggerConfig {
    directory: PathBuf,
    threshold: Severity,
    queue_capacity: usize,
    full_queue_policy: FullQueuePolicy,
    clock: Arc<dyn Clock>,
    redirect_tracing: bool,
}

impl LoggerConfig {
    /// `LoggerConfig`を作成する。
    ///
    /// # 引数
    ///
    /// * directory: ログファイルを作成するディレクトリ。
    /// * threshold: 出力するログの重要度の閾値。
    pub fn new(directory: impl AsRef<Path>, threshold: Severity) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            threshold,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            full_queue_policy: FullQueuePolicy::default(),
            clock: Arc::new(SystemClock::new()),
            redirect_tracing: false,
        }
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_full_queue_policy(mut self, policy: FullQueuePolicy) -> Self {
        self.full_queue_policy = policy;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// `tracing`のイベントもログファイルに出力するかを設定する。
    ///
    /// `tracing`のサブスクライバーはキューの送信側を持ち続けるので、プロセス全体の
    /// ロガーだけが使用する。
    #[must_use]
    pub(crate) fn with_tracing_redirect(mut self, redirect: bool) -> Self {
        self.redirect_tracing = redirect;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }
}

/// ログ行をライターに渡すキューの送信側
///
/// 複製して、任意のスレッドから使用できる。
#[derive(Debug, Clone)]
pub struct LogSink {
    sender: Sender<LogRecord>,
    policy: FullQueuePolicy,
}

impl LogSink {
    pub(crate) fn new(sender: Sender<LogRecord>, policy: FullQueuePolicy) -> Self {
        Self { sender, policy }
    }

    /// ログ行をキューに追加する。
    ///
    /// # 戻り値
    ///
    /// キューに追加できた場合は`true`。
    /// キューが閉じられている場合、及び満杯で破棄した場合は`false`。
    pub fn enqueue(&self, record: LogRecord) -> bool {
        match self.policy {
            FullQueuePolicy::Block => self.sender.send(record).is_ok(),
            FullQueuePolicy::BlockWithTimeout(timeout) => {
                self.sender.send_timeout(record, timeout).is_ok()
            }
            FullQueuePolicy::DropNewest => self.sender.try_send(record).is_ok(),
        }
    }
}

/// 日毎にファイルを切り替えるロガー
///
/// `Logger::start`で起動すると、専用のスレッドでライターが動作する。
/// ログ出力のメソッドは、ログ行を作成してキューに追加するだけで、ファイルには触れない。
pub struct Logger {
    sink: LogSink,
    threshold: Severity,
    clock: Arc<dyn Clock>,
    writer: JoinHandle<()>,
}

impl Logger {
    /// ロガーを起動する。
    ///
    /// ログディレクトリを作成し、当日のログファイルを開いて、ライターのスレッドを起動する。
    ///
    /// # 引数
    ///
    /// * config: ロガーの設定。
    ///
    /// # 戻り値
    ///
    /// `Logger`インスタンス。
    pub fn start(config: LoggerConfig) -> Result<Logger, Error> {
        let LoggerConfig {
            directory,
            threshold,
            queue_capacity,
            full_queue_policy,
            clock,
            redirect_tracing,
        } = config;

        fs::create_dir_all(&directory).map_err(|source| Error::DirectoryCreate {
            path: directory.clone(),
            source,
        })?;
        let path = daily_log_path(&directory, clock.now().date());
        let file =
            open_log_file(&path).map_err(|source| Error::InitialFileOpen { path, source })?;

        let (sender, receiver) = bounded(queue_capacity);
        let writer = DailyFileWriter::new(directory, file, Arc::clone(&clock), threshold);
        let writer = thread::Builder::new()
            .name("daily-log-writer".to_string())
            .spawn(move || writer.run(receiver))
            .map_err(Error::WriterSpawn)?;

        let logger = Logger {
            sink: LogSink::new(sender, full_queue_policy),
            threshold,
            clock,
            writer,
        };
        if redirect_tracing {
            if let Err(err) = install_tracing_redirect(logger.sink()) {
                logger.log(
                    Severity::Info,
                    Some(&crate::source_location!()),
                    format_args!("{}", err),
                );
            }
        }

        Ok(logger)
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// 重要度`severity`のログが出力されるかを返却する。
    pub fn enabled(&self, severity: Severity) -> bool {
        severity.passes(self.threshold)
    }

    /// ロガーが所有するキューの送信側を返却する。
    pub fn sink(&self) -> LogSink {
        self.sink.clone()
    }

    /// ログを記録する。
    ///
    /// 閾値を超える重要度のログは、書式化する前に破棄する。
    ///
    /// # 引数
    ///
    /// * severity: ログの重要度。
    /// * location: 呼び出し元の位置。
    /// * args: メッセージ。
    pub fn log(
        &self,
        severity: Severity,
        location: Option<&SourceLocation>,
        args: fmt::Arguments<'_>,
    ) {
        if !self.enabled(severity) {
            return;
        }
        let record = format_record(severity, &self.clock.now(), location, args);
        self.sink.enqueue(record);
    }

    /// 関数名を含めるには、`debug!(logger => ...)`マクロを使用する。
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, Some(&SourceLocation::caller()), args);
    }

    /// 関数名を含めるには、`info!(logger => ...)`マクロを使用する。
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, Some(&SourceLocation::caller()), args);
    }

    /// 関数名を含めるには、`error!(logger => ...)`マクロを使用する。
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, Some(&SourceLocation::caller()), args);
    }

    /// 関数名を含めるには、`critical!(logger => ...)`マクロを使用する。
    #[track_caller]
    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Critical, Some(&SourceLocation::caller()), args);
    }

    /// キューを閉じ、ライターが残りのログ行を書き終えるまで待機する。
    ///
    /// `sink`で取得した送信側がすべて破棄されるまで、キューは閉じられない。
    /// `install_tracing_redirect`に渡した送信側は破棄されないため、その場合は戻らない。
    pub fn close(self) -> Result<(), Error> {
        let Logger { sink, writer, .. } = self;
        drop(sink);
        writer.join().map_err(|_| Error::WriterPanicked)
    }
}

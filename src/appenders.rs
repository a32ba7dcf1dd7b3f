use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crossbeam_channel::{after, select, Receiver};

use crate::{
    error::Error,
    format::{format_record, LogRecord, SourceLocation},
    rotation::{daily_log_path, next_deadline, Clock},
    severity::Severity,
};

/// 日毎にファイルを切り替えながらログ行を書き込むライター
///
/// ログファイルを開く、閉じる、書き込むのは、このライターだけである。
/// ライターは専用のスレッドで`run`を実行し、キューから受け取ったログ行を
/// 順に書き込む。ローカル時刻の0時0分1秒になると、その日付のファイルに切り替える。
pub(crate) struct DailyFileWriter {
    directory: PathBuf,
    file: File,
    clock: Arc<dyn Clock>,
    threshold: Severity,
}

impl DailyFileWriter {
    /// `DailyFileWriter`を作成する。
    ///
    /// # 引数
    ///
    /// - directory: ログファイルを作成するディレクトリ。
    /// - file: 書き込み中のログファイル。
    /// - clock: 現在日時を提供する時計。
    /// - threshold: ライター自身が記録するエラーに適用する閾値。
    pub(crate) fn new(
        directory: PathBuf,
        file: File,
        clock: Arc<dyn Clock>,
        threshold: Severity,
    ) -> Self {
        Self {
            directory,
            file,
            clock,
            threshold,
        }
    }

    /// キューが閉じられるまで、ログ行の書き込みとファイルの切り替えを繰り返す。
    pub(crate) fn run(mut self, records: Receiver<LogRecord>) {
        let mut rotation = self.arm();
        loop {
            let fired = select! {
                recv(records) -> record => match record {
                    Ok(record) => {
                        self.write(&record);
                        false
                    }
                    Err(_) => return,
                },
                recv(rotation) -> _ => true,
            };
            if fired {
                rotation = self.arm();
                self.rotate();
            }
        }
    }

    /// 次の切り替え時刻に一度だけ発火するタイマーを返却する。
    fn arm(&self) -> Receiver<Instant> {
        after(next_deadline(self.clock.now()))
    }

    fn write(&mut self, record: &LogRecord) {
        // 書き込みに失敗しても、呼び出し元には影響させない
        let _ = self.file.write_all(record.as_bytes());
    }

    /// 現在の日付のログファイルに切り替える。
    ///
    /// ファイルを開けなかった場合は、エラーを現在のファイルに記録して、書き込みを続ける。
    /// 再試行は、次の切り替え時刻まで行わない。
    fn rotate(&mut self) {
        let path = daily_log_path(&self.directory, self.clock.now().date());
        match open_log_file(&path) {
            Ok(file) => self.file = file,
            Err(source) => self.report(
                crate::source_location!(),
                &Error::RotationFileOpen { path, source },
            ),
        }
    }

    /// ライター自身のエラーを、エラーの重要度で現在のファイルに書き込む。
    ///
    /// キューを経由すると、キューが満杯のときにライター自身が待機してしまうため、直接書き込む。
    fn report(&mut self, location: SourceLocation, error: &Error) {
        if !Severity::Error.passes(self.threshold) {
            return;
        }
        let record = format_record(
            Severity::Error,
            &self.clock.now(),
            Some(&location),
            format_args!("{}", error),
        );
        self.write(&record);
    }
}

/// ログファイルを追記モードで開く。ファイルが存在しない場合は作成する。
///
/// # 引数
///
/// * path: ログファイルパス。
///
/// # 戻り値
///
/// `File`インスタンス。
pub(crate) fn open_log_file(path: &Path) -> io::Result<File> {
    let mut open_options = OpenOptions::new();
    open_options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open_options.mode(0o666);
    }

    open_options.open(path)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex, thread, time::Duration};

    use crossbeam_channel::bounded;
    use time::{macros::datetime, OffsetDateTime};

    use super::*;

    /// テストから現在日時を変更できる時計
    struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        fn new(now: OffsetDateTime) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn set(&self, now: OffsetDateTime) {
            *self.0.lock().unwrap() = now;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn record(text: &str) -> LogRecord {
        LogRecord::from_line(text)
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    /// 条件を満たすまで待機する。
    fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("condition was not met in time");
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info_log_2024_3_9.log");

        open_log_file(&path).unwrap().write_all(b"first\n").unwrap();
        open_log_file(&path).unwrap().write_all(b"second\n").unwrap();

        assert_eq!("first\nsecond\n", read(&path));
    }

    #[test]
    fn test_writer_exits_when_queue_is_closed() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(datetime!(2024-03-09 12:00:00 UTC));
        let path = daily_log_path(dir.path(), clock.now().date());
        let writer = DailyFileWriter::new(
            dir.path().to_path_buf(),
            open_log_file(&path).unwrap(),
            clock,
            Severity::Debug,
        );
        let (sender, receiver) = bounded(10);
        let handle = thread::spawn(move || writer.run(receiver));

        sender.send(record("one")).unwrap();
        sender.send(record("two")).unwrap();
        drop(sender);
        handle.join().unwrap();

        assert_eq!("one\ntwo\n", read(&path));
    }

    #[test]
    fn test_rotation_switches_to_file_of_new_date() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(datetime!(2024-03-09 23:59:59 UTC));
        let old_path = dir.path().join("info_log_2024_3_9.log");
        let new_path = dir.path().join("info_log_2024_3_10.log");
        let writer = DailyFileWriter::new(
            dir.path().to_path_buf(),
            open_log_file(&old_path).unwrap(),
            clock.clone(),
            Severity::Debug,
        );
        let (sender, receiver) = bounded(10);
        let handle = thread::spawn(move || writer.run(receiver));

        sender.send(record("before 1")).unwrap();
        sender.send(record("before 2")).unwrap();
        wait_until(|| read(&old_path) == "before 1\nbefore 2\n");

        // 2秒後にタイマーが発火するときには、翌日の日付を返す
        clock.set(datetime!(2024-03-10 00:00:01.5 UTC));
        wait_until(|| new_path.exists());

        sender.send(record("after")).unwrap();
        drop(sender);
        handle.join().unwrap();

        assert_eq!("before 1\nbefore 2\n", read(&old_path));
        assert_eq!("after\n", read(&new_path));
    }

    #[test]
    fn test_rotation_failure_keeps_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(datetime!(2024-03-09 23:59:59 UTC));
        let old_path = dir.path().join("info_log_2024_3_9.log");
        // 同名のディレクトリがあるため、新しいファイルは開けない
        let blocked_path = dir.path().join("info_log_2024_3_10.log");
        fs::create_dir(&blocked_path).unwrap();
        let writer = DailyFileWriter::new(
            dir.path().to_path_buf(),
            open_log_file(&old_path).unwrap(),
            clock.clone(),
            Severity::Error,
        );
        let (sender, receiver) = bounded(10);
        let handle = thread::spawn(move || writer.run(receiver));

        // 書き込みが見えれば、タイマーは前日の時刻で設定済み
        sender.send(record("armed")).unwrap();
        wait_until(|| read(&old_path) == "armed\n");

        clock.set(datetime!(2024-03-10 00:00:01.5 UTC));
        wait_until(|| read(&old_path).contains("failed to switch log file"));

        sender.send(record("still here")).unwrap();
        drop(sender);
        handle.join().unwrap();

        let content = read(&old_path);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(3, lines.len());
        assert_eq!("armed", lines[0]);
        assert!(lines[1].starts_with("======2024/03/10 00:00:01=====[Error]("));
        assert!(lines[1].contains("DailyFileWriter::rotate"));
        assert!(lines[1].contains("=[appenders.rs]:"));
        assert!(lines[1].contains("info_log_2024_3_10.log"));
        assert_eq!("still here", lines[2]);
        assert!(blocked_path.is_dir());
    }

    #[test]
    fn test_rotation_failure_is_silent_below_error_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(datetime!(2024-03-09 23:59:59 UTC));
        let old_path = dir.path().join("info_log_2024_3_9.log");
        fs::create_dir(dir.path().join("info_log_2024_3_10.log")).unwrap();
        let mut writer = DailyFileWriter::new(
            dir.path().to_path_buf(),
            open_log_file(&old_path).unwrap(),
            clock.clone(),
            Severity::Critical,
        );

        clock.set(datetime!(2024-03-10 00:00:01 UTC));
        writer.rotate();
        writer.write(&record("kept"));

        assert_eq!("kept\n", read(&old_path));
    }
}

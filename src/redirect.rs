use std::io;

use tracing_subscriber::fmt::MakeWriter;

use crate::{error::Error, format::LogRecord, logger::LogSink};

/// `tracing`から受け取った行の接頭語
pub const REDIRECT_PREFIX: &str = "[log] ";

/// `tracing`のイベント1件分を受け取るライター
///
/// 破棄されるときに、受け取った内容を1行のログ行としてキューに追加する。
pub struct SinkWriter {
    sink: LogSink,
    buffer: Vec<u8>,
}

impl io::Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut line = String::from(REDIRECT_PREFIX);
        line.push_str(&String::from_utf8_lossy(&self.buffer));
        self.sink.enqueue(LogRecord::from_line(line));
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            buffer: Vec::new(),
        }
    }
}

/// `tracing`の既定のサブスクライバーを、ログファイルに出力するものに設定する。
///
/// 行にはファイルパスと行番号、タイムスタンプが付与される。
/// 既に他のサブスクライバーが設定されている場合は、エラーを返却する。
///
/// # 引数
///
/// * sink: ロガーのキューの送信側。
pub fn install_tracing_redirect(sink: LogSink) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_writer(sink)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|err| Error::TracingRedirect(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crossbeam_channel::bounded;

    use super::*;
    use crate::logger::FullQueuePolicy;

    #[test]
    fn test_writer_enqueues_one_prefixed_line_per_event() {
        let (sender, receiver) = bounded(4);
        let sink = LogSink::new(sender, FullQueuePolicy::Block);

        {
            let mut writer = sink.make_writer();
            write!(writer, "2024-03-09T10:00:00Z  INFO ").unwrap();
            writeln!(writer, "app: started").unwrap();
        }
        drop(sink.make_writer());

        assert_eq!(
            "[log] 2024-03-09T10:00:00Z  INFO app: started\n",
            receiver.try_recv().unwrap().as_str()
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_subscriber_writes_events_into_sink() {
        let (sender, receiver) = bounded(4);
        let sink = LogSink::new(sender, FullQueuePolicy::Block);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hello from tracing");
        });

        let line = receiver.try_recv().unwrap().into_string();
        assert!(line.starts_with(REDIRECT_PREFIX), "{line}");
        assert!(line.contains("INFO"), "{line}");
        assert!(line.contains("redirect.rs:"), "{line}");
        assert!(line.ends_with("hello from tracing\n"), "{line}");
    }
}

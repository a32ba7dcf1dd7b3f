use std::{io, path::PathBuf};

/// ロガーのエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// ロガーが既に起動している
    #[error("file logger has already been started")]
    AlreadyStarted,

    /// ログディレクトリの作成に失敗した
    #[error("failed to create log directory {}: {source}", .path.display())]
    DirectoryCreate { path: PathBuf, source: io::Error },

    /// 起動時のログファイルを開けなかった
    #[error("failed to open log file {}: {source}", .path.display())]
    InitialFileOpen { path: PathBuf, source: io::Error },

    /// 日付が変わったときのログファイルを開けなかった
    ///
    /// 呼び出し元には返却されず、ログ自身に記録される。
    #[error("failed to switch log file to {}: {source}", .path.display())]
    RotationFileOpen { path: PathBuf, source: io::Error },

    #[error("failed to spawn log writer thread: {0}")]
    WriterSpawn(#[source] io::Error),

    #[error("log writer thread panicked")]
    WriterPanicked,

    /// `tracing`の出力先を切り替えられなかった
    #[error("failed to redirect tracing output: {0}")]
    TracingRedirect(String),
}

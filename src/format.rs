use std::{
    fmt::{self, Write},
    panic::Location,
    path::Path,
};

use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::severity::Severity;

/// ログ行の先頭に付与するタイムスタンプの書式
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("======[year]/[month]/[day] [hour]:[minute]:[second]=====");

/// ログを出力した呼び出し元の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    function: Option<&'static str>,
    file: &'static str,
    line: u32,
}

impl SourceLocation {
    /// 関数名を含む呼び出し元の位置を作成する。
    ///
    /// 通常は`source_location!`マクロを通じて作成する。
    pub fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function: Some(function),
            file,
            line,
        }
    }

    /// この関数を呼び出した位置を返却する。
    ///
    /// `#[track_caller]`で取得できるのはファイルと行番号だけなので、関数名は持たない。
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    pub fn function(&self) -> Option<&'static str> {
        self.function
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// ファイルパスのベース名。ベース名を取得できない場合はパス全体。
    pub fn file_name(&self) -> &'static str {
        Path::new(self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.file)
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            function: None,
            file: location.file(),
            line: location.line(),
        }
    }
}

/// マクロを展開した位置の`SourceLocation`を作成する。
///
/// 関数名は、展開位置に定義したローカル関数の型名から求める。
#[macro_export]
macro_rules! source_location {
    () => {
        $crate::SourceLocation::new(
            {
                fn f() {}
                fn type_name_of<T>(_: T) -> &'static str {
                    ::std::any::type_name::<T>()
                }
                let name = type_name_of(f);
                name.strip_suffix("::f").unwrap_or(name)
            },
            ::std::file!(),
            ::std::line!(),
        )
    };
}

/// 書式化済みのログ行
///
/// 末尾に改行を含む。一度作成したら変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord(String);

impl LogRecord {
    /// 任意の文字列からログ行を作成する。末尾に改行がなければ付与する。
    pub fn from_line(line: impl Into<String>) -> Self {
        let mut line = line.into();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        Self(line)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// タイムスタンプ部分を書式化する。
pub(crate) fn format_timestamp(at: &OffsetDateTime) -> String {
    // OffsetDateTimeはすべての構成要素を持つので、書式化は失敗しない
    at.format(TIMESTAMP_FORMAT).unwrap_or_default()
}

/// ログ行を作成する。
///
/// 行の形式は、`<timestamp>[<LEVEL>](<func>=[<file>]:<line>) <message>\n`となる。
/// 呼び出し元の位置がない場合、括弧部分は省略される。
///
/// # 引数
///
/// - severity: ログの重要度。
/// - at: ログを記録する日時。
/// - location: 呼び出し元の位置。
/// - args: メッセージ。
///
/// # 戻り値
///
/// ログ行。
pub fn format_record(
    severity: Severity,
    at: &OffsetDateTime,
    location: Option<&SourceLocation>,
    args: fmt::Arguments<'_>,
) -> LogRecord {
    let mut line = format_timestamp(at);
    // Stringへの書き込みは失敗しない
    let _ = write!(line, "[{}]", severity.label());
    if let Some(location) = location {
        let _ = match location.function() {
            Some(function) => write!(
                line,
                "({}=[{}]:{})",
                function,
                location.file_name(),
                location.line()
            ),
            None => write!(line, "([{}]:{})", location.file_name(), location.line()),
        };
    }
    let _ = writeln!(line, " {}", args);

    LogRecord(line)
}

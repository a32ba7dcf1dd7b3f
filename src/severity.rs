use std::{fmt, str::FromStr};

/// ログの重要度
///
/// 値が大きいほど冗長なログを表す。
/// 設定された閾値以下の重要度を持つメッセージのみが出力される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// システムの継続が困難な障害
    Critical = 1,
    /// エラー
    Error = 2,
    /// 情報
    Info = 3,
    /// デバッグ
    Debug = 4,
}

/// 重要度の解析に失敗したときのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid severity: {0:?}")]
pub struct ParseSeverityError(String);

impl Severity {
    /// 冗長さの昇順に並べたすべての重要度
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Error,
        Severity::Info,
        Severity::Debug,
    ];

    /// ログ行に埋め込むラベルを返却する。
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "Error",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// この重要度のメッセージが、閾値`threshold`のもとで出力されるかを返却する。
    ///
    /// # 引数
    ///
    /// - threshold: 設定された閾値。
    ///
    /// # 戻り値
    ///
    /// 出力される場合は`true`。
    pub fn passes(self, threshold: Severity) -> bool {
        self <= threshold
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: u8) -> Result<Self, ParseSeverityError> {
        match value {
            1 => Ok(Severity::Critical),
            2 => Ok(Severity::Error),
            3 => Ok(Severity::Info),
            4 => Ok(Severity::Debug),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// 重要度の名前（大文字小文字を区別しない）、または`1`から`4`の数値を解析する。
impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Severity::try_from(value).map_err(|_| ParseSeverityError(s.to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "error" => Ok(Severity::Error),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

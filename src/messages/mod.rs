//! User-facing diagnostic strings in the configured language.

use std::{fmt, str::FromStr, time::Duration};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja_jp" | "ja-jp" | "japanese" => Ok(Self::Ja),
            "en" | "en_us" | "en-us" | "english" => Ok(Self::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ja => "ja",
            Self::En => "en",
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn timed_out(&self, limit: Duration) -> String {
        let secs = limit.as_secs();
        match self.locale {
            Locale::Ja => format!("実行がタイムアウトしました（{}秒）", secs),
            Locale::En => format!("Execution timed out ({}s)", secs),
        }
    }

    pub fn tool_missing(&self) -> String {
        match self.locale {
            Locale::Ja => "Lean4がインストールされていません。インストール手順については README.md を参照してください。".into(),
            Locale::En => "Lean 4 is not installed. See README.md for installation instructions.".into(),
        }
    }

    pub fn execution_error(&self, detail: &str) -> String {
        match self.locale {
            Locale::Ja => format!("実行エラー: {}", detail),
            Locale::En => format!("Execution error: {}", detail),
        }
    }

    pub fn invalid_filename(&self) -> String {
        match self.locale {
            Locale::Ja => "無効なファイル名です".into(),
            Locale::En => "Invalid filename".into(),
        }
    }

    pub fn file_not_found(&self) -> String {
        match self.locale {
            Locale::Ja => "ファイルが見つかりません".into(),
            Locale::En => "File not found".into(),
        }
    }

    pub fn saved(&self, filename: &str) -> String {
        match self.locale {
            Locale::Ja => format!("ファイル '{}' を保存しました", filename),
            Locale::En => format!("Saved file '{}'", filename),
        }
    }

    pub fn save_error(&self, detail: &str) -> String {
        match self.locale {
            Locale::Ja => format!("保存エラー: {}", detail),
            Locale::En => format!("Save error: {}", detail),
        }
    }

    pub fn load_error(&self, detail: &str) -> String {
        match self.locale {
            Locale::Ja => format!("読み込みエラー: {}", detail),
            Locale::En => format!("Load error: {}", detail),
        }
    }

    pub fn missing_api_key(&self) -> String {
        match self.locale {
            Locale::Ja => "エラー: ANTHROPIC_API_KEY環境変数が設定されていません".into(),
            Locale::En => "Error: the ANTHROPIC_API_KEY environment variable is not set".into(),
        }
    }

    pub fn chat_error(&self, detail: &str) -> String {
        match self.locale {
            Locale::Ja => format!("AIチャットエラー: {}", detail),
            Locale::En => format!("AI chat error: {}", detail),
        }
    }
}

//! System instruction and user-turn text for the advisory chat.

use crate::messages::Locale;

pub fn system_text(locale: Locale) -> String {
    match locale {
        Locale::Ja => "あなたはLean4の証明支援エキスパートです。\nユーザーのLean4コードに関する質問に、わかりやすく日本語で回答してください。\nコードのエラー、証明の進め方、型の問題などについてアドバイスを提供してください。".to_string(),
        Locale::En => "You are an expert in the Lean 4 proof assistant.\nAnswer the user's questions about their Lean 4 code clearly and in English.\nGive advice on errors in the code, how to proceed with proofs, type problems and similar issues.".to_string(),
    }
}

/// Embed the code and question into one user turn. `context` is appended
/// only when it is non-empty.
pub fn user_text(locale: Locale, code: &str, question: &str, context: Option<&str>) -> String {
    let (intro, q_label, ctx_label) = match locale {
        Locale::Ja => (
            "以下のLean4コードについて質問があります：",
            "質問",
            "追加のコンテキスト",
        ),
        Locale::En => (
            "I have a question about the following Lean 4 code:",
            "Question",
            "Additional context",
        ),
    };
    let mut text = format!("{intro}\n\n```lean\n{code}\n```\n\n{q_label}: {question}\n");
    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        text.push_str(&format!("\n\n{ctx_label}: {ctx}"));
    }
    text
}

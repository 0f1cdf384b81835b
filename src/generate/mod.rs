/// Level generation from a free-text prompt.
///
/// `Generator` composes the system instruction, sends it with the user's
/// prompt through a `TextGenerator`, and passes the reply through `repair`.
/// One outbound call per `generate`, bounded by the configured timeout.
/// Replies vary between calls (non-zero temperature).

pub mod client;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::grid::{Grid, LevelProfile};
use crate::error::LevelError;
use crate::repair::{repair, Repaired};

pub use client::AnthropicClient;

// ══════════════════════════════════════════════════════════════
// Backend seam
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Any non-text segment (tool calls, images...).
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub segments: Vec<Segment>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Completion { segments: vec![Segment::Text(text.into())] }
    }

    /// The first segment, which must be text.
    pub fn first_text(&self) -> Result<&str, LevelError> {
        match self.segments.first() {
            Some(Segment::Text(t)) => Ok(t),
            Some(Segment::Other) => Err(LevelError::Generation("unexpected response type".into())),
            None => Err(LevelError::Generation("empty response".into())),
        }
    }
}

/// A text-generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LevelError>;
}

// ══════════════════════════════════════════════════════════════
// Settings
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        GeneratorSettings {
            endpoint: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-3-5-sonnet-20241022".into(),
            api_key_env: "ANTHROPIC_API_KEY".into(),
            api_version: "2023-06-01".into(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

// ══════════════════════════════════════════════════════════════
// Generator
// ══════════════════════════════════════════════════════════════

pub struct Generator<G> {
    backend: G,
    profile: LevelProfile,
    settings: GeneratorSettings,
}

impl<G: TextGenerator> Generator<G> {
    pub fn new(backend: G, profile: LevelProfile, settings: GeneratorSettings) -> Self {
        Generator { backend, profile, settings }
    }

    pub fn profile(&self) -> &LevelProfile {
        &self.profile
    }

    pub async fn generate(&self, prompt: &str) -> Result<Grid, LevelError> {
        self.generate_with_warnings(prompt).await.map(|r| r.grid)
    }

    /// Like `generate`, keeping the repair warnings for callers that show them.
    pub async fn generate_with_warnings(&self, prompt: &str) -> Result<Repaired, LevelError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(LevelError::Generation("prompt is required".into()));
        }

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: prompt::system_prompt(&self.profile),
            prompt: prompt.to_string(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        tracing::info!(model = %request.model, width = self.profile.width(), height = self.profile.height(), "requesting level");
        let completion = tokio::time::timeout(self.settings.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| {
                LevelError::Generation(format!("no response within {}s", self.settings.timeout.as_secs_f32()))
            })??;

        let lines = reply_lines(completion.first_text()?);
        if lines.is_empty() {
            return Err(LevelError::Generation("response contained no level".into()));
        }

        let repaired = repair(&lines, &self.profile)?;
        for w in &repaired.warnings {
            tracing::warn!(warning = %w, "repaired generated level");
        }
        Ok(repaired)
    }
}

/// Split a reply into grid lines.
///
/// Only line breaks are trimmed from the ends: leading spaces on the first
/// row and trailing spaces on the last row are cells. A surrounding code
/// fence is dropped.
fn reply_lines(text: &str) -> Vec<&str> {
    let text = text.trim_matches(|c| c == '\n' || c == '\r');
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Dimensions;
    use crate::domain::symbol::Symbol;
    use crate::repair::Warning;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned completions and records the requests it saw.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<Completion, LevelError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<Completion, LevelError>>) -> Self {
            ScriptedGenerator { replies: Mutex::new(replies.into()), seen: Mutex::new(vec![]), delay: None }
        }

        fn text(reply: &str) -> Self {
            Self::new(vec![Ok(Completion::text(reply))])
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LevelError> {
            self.seen.lock().push(request.clone());
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(LevelError::Generation("script exhausted".into())))
        }
    }

    fn generator(backend: ScriptedGenerator) -> Generator<ScriptedGenerator> {
        Generator::new(backend, LevelProfile::LEDGER, GeneratorSettings::default())
    }

    fn valid_rows() -> Vec<String> {
        let mut rows = vec![" ".repeat(27); 11];
        rows[1] = format!("{}@ ", " ".repeat(25));
        rows[10] = "=".repeat(27);
        rows
    }

    #[tokio::test]
    async fn clean_reply_becomes_grid() {
        let gen = generator(ScriptedGenerator::text(&valid_rows().join("\n")));
        let repaired = gen.generate_with_warnings("a quiet meadow").await.unwrap();
        assert!(repaired.is_clean());
        assert_eq!(repaired.grid.dims(), Dimensions::LEDGER);
        assert_eq!(repaired.grid.get(1, 25), Some(Symbol::Portal));

        let seen = gen.backend.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, "a quiet meadow");
        assert_eq!(seen[0].max_tokens, 1000);
        assert!(seen[0].system.contains("27 characters wide"));
    }

    #[tokio::test]
    async fn nine_lines_is_a_row_count_error() {
        let rows = valid_rows();
        let gen = generator(ScriptedGenerator::text(&rows[..9].join("\n")));
        match gen.generate("short").await {
            Err(LevelError::RowCount { expected: 11, actual: 9 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_first_row_survives_trimming() {
        let text = format!("\n{}\n", valid_rows().join("\n"));
        let grid = generator(ScriptedGenerator::text(&text)).generate("x").await.unwrap();
        assert_eq!(grid.height(), 11);
        assert!(grid.row(0).iter().all(|s| *s == Symbol::Empty));
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let text = format!("```\n{}\n```", valid_rows().join("\n"));
        assert!(generator(ScriptedGenerator::text(&text)).generate("x").await.is_ok());
    }

    #[tokio::test]
    async fn repairs_are_reported() {
        let mut rows = valid_rows();
        rows[1] = " ".repeat(20);
        let gen = generator(ScriptedGenerator::text(&rows.join("\n")));
        let repaired = gen.generate_with_warnings("x").await.unwrap();
        assert!(repaired.warnings.contains(&Warning::RowLength { row: 1, original: 20, corrected: 27 }));
        assert!(repaired.warnings.iter().any(|w| matches!(w, Warning::ExitInserted { .. })));
    }

    #[tokio::test]
    async fn non_text_or_empty_replies_fail() {
        let gen = generator(ScriptedGenerator::new(vec![
            Ok(Completion { segments: vec![Segment::Other, Segment::Text("===".into())] }),
            Ok(Completion::default()),
            Ok(Completion::text("\n\n")),
        ]));
        for _ in 0..3 {
            assert!(matches!(gen.generate("x").await, Err(LevelError::Generation(_))));
        }
    }

    #[tokio::test]
    async fn empty_prompt_makes_no_request() {
        let gen = generator(ScriptedGenerator::text("unused"));
        assert!(matches!(gen.generate("   ").await, Err(LevelError::Generation(_))));
        assert!(gen.backend.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let mut backend = ScriptedGenerator::text(&valid_rows().join("\n"));
        backend.delay = Some(Duration::from_secs(5));
        let settings = GeneratorSettings { timeout: Duration::from_millis(50), ..GeneratorSettings::default() };
        let gen = Generator::new(backend, LevelProfile::LEDGER, settings);
        assert!(matches!(gen.generate("x").await, Err(LevelError::Generation(_))));
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let s = GeneratorSettings::default();
        let text = toml::to_string(&s).unwrap();
        assert!(text.contains("timeout = 60"));
        let back: GeneratorSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, s);
    }
}

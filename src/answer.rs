//! Answer extraction over retrieved passages.
//!
//! The lexical strategy needs no model: it scores sentences by overlap
//! with the question's content words. The model strategy delegates each
//! retrieved chunk to an extractive question-answering endpoint behind
//! the [`QaProvider`] trait.

use std::cmp::Ordering;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::models::{Answer, SearchResult};
use crate::text::{collapse_whitespace, excerpt_around, split_sentences, truncate_chars};

/// Placeholder answer text when no passage matches.
pub const NO_ANSWER_TEXT: &str = "No relevant information found in the document.";

/// Characters kept in the final answer text.
const ANSWER_CHARS: usize = 200;

/// Characters kept in a model answer's context excerpt when the answer
/// span cannot be located in the chunk.
const CONTEXT_CHARS: usize = 230;

/// Question words that carry no content.
const STOPWORDS: [&str; 16] = [
    "what", "which", "where", "when", "that", "this", "with", "from", "into", "about", "does",
    "is", "are", "the", "and", "for",
];

/// A candidate text to extract an answer from, tagged with where it came
/// from (a chunk id, or a doc id in whole-document mode).
pub struct Passage {
    pub source: String,
    pub text: String,
}

/// Lower-cased ASCII-alphabetic word tokens of length three or more.
///
/// Tokens are maximal word-character runs; a run containing digits or
/// non-ASCII letters is dropped entirely rather than split.
fn word_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|run| run.len() >= 3 && run.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_lowercase)
        .collect()
}

/// The question's content words: tokens minus stop words, deduplicated
/// in order of first appearance.
fn content_words(question: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for token in word_tokens(question) {
        if STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if !words.contains(&token) {
            words.push(token);
        }
    }
    words
}

/// How many of the question's content words appear in the sentence.
fn sentence_score(words: &[String], sentence: &str) -> usize {
    let sentence_words = word_tokens(sentence);
    words
        .iter()
        .filter(|word| sentence_words.contains(word))
        .count()
}

fn no_answer() -> Answer {
    Answer {
        text: NO_ANSWER_TEXT.to_string(),
        score: 0.0,
        source: None,
        context: String::new(),
    }
}

/// Extracts the best-matching sentence from each passage.
///
/// Per passage the highest-scoring sentence wins, ties going to the
/// earliest one; passages with no positive-scoring sentence contribute
/// nothing. Answers are ordered by descending score, and a single
/// placeholder is returned when every passage strikes out. Answer text
/// is whitespace-collapsed and capped at [`ANSWER_CHARS`] characters.
pub fn extract_lexical(question: &str, passages: &[Passage]) -> Vec<Answer> {
    let words = content_words(question);

    let mut answers = Vec::new();
    for passage in passages {
        let mut best: Option<(usize, usize, &str)> = None;
        for (offset, sentence) in split_sentences(&passage.text) {
            let score = sentence_score(&words, sentence);
            if score > 0 && best.map_or(true, |(top, _, _)| score > top) {
                best = Some((score, offset, sentence));
            }
        }
        if let Some((score, offset, sentence)) = best {
            let collapsed = collapse_whitespace(sentence);
            answers.push(Answer {
                text: truncate_chars(&collapsed, ANSWER_CHARS).to_string(),
                score: score as f32,
                source: Some(passage.source.clone()),
                context: excerpt_around(&passage.text, offset).to_string(),
            });
        }
    }

    answers.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    if answers.is_empty() {
        answers.push(no_answer());
    }
    answers
}

/// An extractive question-answering backend.
#[async_trait]
pub trait QaProvider: Send + Sync {
    /// Returns the extracted answer span and its confidence.
    async fn answer(&self, question: &str, context: &str) -> anyhow::Result<(String, f32)>;
}

/// Runs the QA provider over each retrieved chunk.
///
/// A chunk whose provider call fails is logged and skipped so one bad
/// call never sinks the whole request. Results are ordered by descending
/// confidence, with the placeholder standing in when nothing survives.
pub async fn extract_model(
    provider: &dyn QaProvider,
    question: &str,
    hits: &[SearchResult],
) -> Vec<Answer> {
    let mut answers = Vec::new();
    for hit in hits {
        match provider.answer(question, &hit.text).await {
            Ok((text, score)) => {
                let context = match hit.text.find(&text) {
                    Some(idx) => excerpt_around(&hit.text, idx).to_string(),
                    None => truncate_chars(&hit.text, CONTEXT_CHARS).to_string(),
                };
                answers.push(Answer {
                    text,
                    score,
                    source: Some(hit.chunk_id.clone()),
                    context,
                });
            }
            Err(error) => {
                warn!(chunk_id = %hit.chunk_id, %error, "QA provider failed, skipping chunk");
            }
        }
    }

    answers.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    if answers.is_empty() {
        answers.push(no_answer());
    }
    answers
}

/// Extractive QA over an HTTP inference endpoint.
///
/// Posts `{question, context}` and expects `{answer, score}` back, the
/// shape served by hosted question-answering pipelines. Reads an optional
/// bearer token from `HF_API_TOKEN`.
pub struct HfQaProvider {
    endpoint: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HfQaProvider {
    pub fn new(endpoint: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            endpoint,
            api_token: std::env::var("HF_API_TOKEN").ok(),
            client,
        })
    }
}

fn parse_qa_response(value: &Value) -> anyhow::Result<(String, f32)> {
    let answer = value
        .get("answer")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("QA response missing 'answer' field"))?;
    let score = value.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    Ok((answer.to_string(), score))
}

#[async_trait]
impl QaProvider for HfQaProvider {
    async fn answer(&self, question: &str, context: &str) -> anyhow::Result<(String, f32)> {
        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "question": question,
            "context": context,
        }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("QA request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("QA endpoint returned {status}: {body}");
        }

        let value: Value = response.json().await.context("invalid QA response body")?;
        parse_qa_response(&value)
    }
}

/// Builds the QA provider the configured strategy needs, `None` for the
/// lexical strategy.
pub fn create_qa_provider(config: &Config) -> anyhow::Result<Option<Box<dyn QaProvider>>> {
    if config.qa.strategy != "model" {
        return Ok(None);
    }
    let endpoint = config
        .qa
        .endpoint
        .clone()
        .ok_or_else(|| anyhow::anyhow!("qa.strategy = \"model\" requires qa.endpoint"))?;
    let provider = HfQaProvider::new(endpoint, config.qa.timeout_secs)?;
    Ok(Some(Box::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn passage(source: &str, text: &str) -> Passage {
        Passage {
            source: source.to_string(),
            text: text.to_string(),
        }
    }

    fn hit(chunk_id: &str, text: &str) -> SearchResult {
        SearchResult {
            chunk_id: chunk_id.to_string(),
            doc_id: "doc".to_string(),
            start: 0,
            end: text.len(),
            score: 1.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_word_tokens_keep_alpha_runs() {
        let tokens = word_tokens("Net30 fees ARE due; pay $500 por café ok");
        assert_eq!(tokens, vec!["fees", "are", "due", "pay", "por"]);
    }

    #[test]
    fn test_content_words_drop_stopwords_and_dupes() {
        let words = content_words("What is the notice period for termination notice?");
        assert_eq!(words, vec!["notice", "period", "termination"]);
    }

    #[test]
    fn test_lexical_picks_highest_overlap_sentence() {
        let passages = [passage(
            "msa_0",
            "Fees are payable monthly. Either party may terminate upon thirty days written notice.",
        )];
        let answers = extract_lexical("What is the notice period for termination?", &passages);
        assert_eq!(answers.len(), 1);
        assert!(answers[0].text.contains("thirty days written notice"));
        assert_eq!(answers[0].source.as_deref(), Some("msa_0"));
        assert!(answers[0].score >= 1.0);
    }

    #[test]
    fn test_lexical_tie_prefers_first_sentence() {
        let passages = [passage(
            "msa_0",
            "Notice must be written. Notice may be electronic.",
        )];
        let answers = extract_lexical("How is notice given?", &passages);
        assert_eq!(answers[0].text, "Notice must be written.");
    }

    #[test]
    fn test_lexical_skips_unmatched_passages() {
        let passages = [
            passage("a_0", "The quick brown fox jumps over hedges."),
            passage("b_0", "Payment is due within thirty days."),
        ];
        let answers = extract_lexical("When is payment due?", &passages);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].source.as_deref(), Some("b_0"));
    }

    #[test]
    fn test_lexical_orders_by_score() {
        let passages = [
            passage("low", "Payment matters here."),
            passage("high", "Payment of the renewal fee is due at each renewal date."),
        ];
        let answers = extract_lexical("When is the renewal payment fee due?", &passages);
        assert_eq!(answers[0].source.as_deref(), Some("high"));
        assert!(answers[0].score > answers[1].score);
    }

    #[test]
    fn test_lexical_placeholder_when_nothing_matches() {
        let passages = [passage("a_0", "Entirely unrelated gardening notes.")];
        let answers = extract_lexical("What is the indemnity cap?", &passages);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].text, NO_ANSWER_TEXT);
        assert_eq!(answers[0].score, 0.0);
        assert!(answers[0].source.is_none());
    }

    #[test]
    fn test_lexical_answer_collapsed_and_truncated() {
        let long_tail = "w".repeat(250);
        let text = format!("Payment   is\n due  {long_tail}.");
        let passages = [passage("a_0", &text)];
        let answers = extract_lexical("When is payment due?", &passages);
        assert!(!answers[0].text.contains('\n'));
        assert!(!answers[0].text.contains("  "));
        assert_eq!(answers[0].text.chars().count(), 200);
    }

    #[test]
    fn test_parse_qa_response() {
        let value = serde_json::json!({"answer": "thirty days", "score": 0.91});
        let (text, score) = parse_qa_response(&value).unwrap();
        assert_eq!(text, "thirty days");
        assert!((score - 0.91).abs() < 1e-6);

        let missing = serde_json::json!({"score": 0.5});
        assert!(parse_qa_response(&missing).is_err());
    }

    #[tokio::test]
    async fn test_hf_provider_parses_answer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/qa");
                then.status(200)
                    .json_body(serde_json::json!({"answer": "thirty days", "score": 0.9}));
            })
            .await;

        let provider = HfQaProvider::new(format!("{}/qa", server.base_url()), 5).unwrap();
        let (text, score) = provider
            .answer("What is the notice period?", "Thirty days notice is required.")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(text, "thirty days");
        assert!(score > 0.8);
    }

    #[tokio::test]
    async fn test_hf_provider_reports_http_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/qa");
                then.status(503).body("loading");
            })
            .await;

        let provider = HfQaProvider::new(format!("{}/qa", server.base_url()), 5).unwrap();
        let err = provider
            .answer("Question?", "Context.")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_model_extraction_skips_failing_chunks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/qa")
                    .json_body_partial(r#"{"context": "good context with thirty days"}"#);
                then.status(200)
                    .json_body(serde_json::json!({"answer": "thirty days", "score": 0.8}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/qa");
                then.status(500).body("boom");
            })
            .await;

        let provider = HfQaProvider::new(format!("{}/qa", server.base_url()), 5).unwrap();
        let hits = [
            hit("doc_0", "bad context"),
            hit("doc_1", "good context with thirty days"),
        ];
        let answers = extract_model(&provider, "What is the notice period?", &hits).await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].source.as_deref(), Some("doc_1"));
        assert_eq!(answers[0].text, "thirty days");
    }

    #[tokio::test]
    async fn test_model_extraction_placeholder_when_all_fail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/qa");
                then.status(500).body("boom");
            })
            .await;

        let provider = HfQaProvider::new(format!("{}/qa", server.base_url()), 5).unwrap();
        let hits = [hit("doc_0", "some context")];
        let answers = extract_model(&provider, "Anything?", &hits).await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].text, NO_ANSWER_TEXT);
    }
}

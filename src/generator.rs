use crate::error::PostError;
use crate::error_code::ErrorCode;
use crate::http_client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Produces the Markdown text of one article.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    /// Returns `Ok(None)` when the service answered without usable text.
    async fn generate(&self, recent: &[ErrorCode]) -> Result<Option<String>>;
}

/// Builds the prompt for one article. `recent` lists codes the model is asked
/// to avoid; it is a hint only.
pub fn build_prompt(recent: &[ErrorCode], language: &str) -> String {
    let recent_list = if recent.is_empty() {
        "none yet".to_string()
    } else {
        recent
            .iter()
            .map(ErrorCode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Pick exactly ONE real Oracle database error code at random and write a blog article about it in Markdown.

RULES:
1. State one real Oracle error code in the ORA-xxxxx format (for example ORA-00001).
2. The very first line must be \"# ORA-xxxxx - <short summary of the error>\".
3. Put the date (YYYY-MM-DD) right below the title.
4. Follow the section structure below.

CONDITIONS:
- Do not pick a recently used code: {recent}.
- Do not lean towards famous codes such as ORA-01722 or ORA-00001; minor but real codes (ORA-01403, ORA-02292, ORA-06550, ORA-01843, ...) are equally good candidates.
- Choose a different real code every time, uniformly at random. Invented codes are forbidden.
- Every section must be at least 200 characters; the whole article at least 3000 characters.
- Use tables, code and external links where they help.
- Put SQL in fenced code blocks (```sql).
- Keep the heading hierarchy clean and stick to what the real error means.
- Write the article in {language}.

STRUCTURE:
1. ORA-xxxxx - overview of the error
2. Cause
3. Resolution
4. Differences from similar errors
5. Lessons learned
6. Preventing recurrence
7. Related links and references (where possible)",
        recent = recent_list,
        language = language,
    )
}

/// Calls the Gemini `generateContent` endpoint.
pub struct GeminiGenerator<C: HttpClient> {
    client: C,
    api_url: String,
    api_key: String,
    language: String,
}

impl<C: HttpClient> GeminiGenerator<C> {
    pub fn new(client: C, api_url: &str, api_key: &str, language: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
        }
    }
}

/// First text part of the first candidate, trimmed. `None` if the body has no
/// such part or it is blank.
pub fn parse_generated_text(body: &str) -> Option<String> {
    let response: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to parse generation response: {}", e);
            return None;
        }
    };

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        warn!("Generation response contained no text");
        None
    } else {
        Some(text.to_string())
    }
}

#[async_trait]
impl<C: HttpClient> ArticleGenerator for GeminiGenerator<C> {
    async fn generate(&self, recent: &[ErrorCode]) -> Result<Option<String>> {
        let prompt = build_prompt(recent, &self.language);
        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        info!("Requesting article from {}", self.api_url);
        let response = self
            .client
            .post_json(
                &self.api_url,
                &[("key", self.api_key.as_str())],
                &[("Content-Type", "application/json")],
                &body,
            )
            .await?;

        if !response.is_success() {
            return Err(PostError::RemoteService {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        debug!("Generation response: {} bytes", response.body.len());
        Ok(parse_generated_text(&response.body))
    }
}

const MOCK_CATALOGUE: &[(&str, &str)] = &[
    ("ORA-00001", "unique constraint violated"),
    ("ORA-00054", "resource busy and acquire with NOWAIT specified"),
    ("ORA-00060", "deadlock detected while waiting for resource"),
    ("ORA-00904", "invalid identifier"),
    ("ORA-00907", "missing right parenthesis"),
    ("ORA-00918", "column ambiguously defined"),
    ("ORA-00933", "SQL command not properly ended"),
    ("ORA-00936", "missing expression"),
    ("ORA-00942", "table or view does not exist"),
    ("ORA-01017", "invalid username/password; logon denied"),
    ("ORA-01400", "cannot insert NULL"),
    ("ORA-01403", "no data found"),
    ("ORA-01422", "exact fetch returns more than requested number of rows"),
    ("ORA-01427", "single-row subquery returns more than one row"),
    ("ORA-01438", "value larger than specified precision allowed for this column"),
    ("ORA-01476", "divisor is equal to zero"),
    ("ORA-01555", "snapshot too old"),
    ("ORA-01722", "invalid number"),
    ("ORA-01843", "not a valid month"),
    ("ORA-02291", "integrity constraint violated - parent key not found"),
    ("ORA-02292", "integrity constraint violated - child record found"),
    ("ORA-04091", "table is mutating, trigger/function may not see it"),
    ("ORA-06502", "PL/SQL: numeric or value error"),
    ("ORA-06550", "PL/SQL compilation error"),
    ("ORA-12154", "TNS: could not resolve the connect identifier specified"),
];

/// Offline generator used when `ORAPOST_USE_MOCK` is set.
///
/// Cycles through the catalogue codes not in `recent`, starting with the
/// first one, and returns `None` once every catalogue code is recent.
pub struct MockGenerator {
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn mock_article(code: &str, summary: &str) -> String {
        format!(
            "# {code} - {summary}\n\
             \n\
             ## Overview\n\
             \n\
             {code} ({summary}) is raised by the Oracle database.\n\
             \n\
             ## Cause\n\
             \n\
             The statement violated the condition described by {code}.\n\
             \n\
             ## Resolution\n\
             \n\
             ```sql\n\
             SELECT * FROM user_errors;\n\
             ```\n"
        )
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleGenerator for MockGenerator {
    async fn generate(&self, recent: &[ErrorCode]) -> Result<Option<String>> {
        let candidates: Vec<&(&str, &str)> = MOCK_CATALOGUE
            .iter()
            .filter(|(code, _)| !recent.iter().any(|r| r.as_str() == *code))
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let (code, summary) = candidates[call % candidates.len()];
        Ok(Some(Self::mock_article(code, summary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::extract_error_code;
    use crate::http_client::HttpResponse;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        url: String,
        query: Vec<(String, String)>,
        headers: Vec<(String, String)>,
        body: serde_json::Value,
    }

    fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Records the last request and returns a canned response.
    struct MockHttpClient {
        response: HttpResponse,
        last_request: Mutex<Option<RecordedRequest>>,
    }

    impl MockHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            query: &[(&str, &str)],
            headers: &[(&str, &str)],
            body: &serde_json::Value,
        ) -> Result<HttpResponse> {
            *self.last_request.lock().unwrap() = Some(RecordedRequest {
                url: url.to_string(),
                query: owned_pairs(query),
                headers: owned_pairs(headers),
                body: body.clone(),
            });
            Ok(self.response.clone())
        }
    }

    fn codes(list: &[&str]) -> Vec<ErrorCode> {
        list.iter().map(|c| c.parse().unwrap()).collect()
    }

    fn gemini_body(text: &str) -> String {
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ], "role": "model" } }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_prompt_lists_recent_codes_and_language() {
        let prompt = build_prompt(&codes(&["ORA-01403", "ORA-02292"]), "Japanese");
        assert!(prompt.contains("ORA-01403, ORA-02292"));
        assert!(prompt.contains("Write the article in Japanese."));
        assert!(prompt.contains("# ORA-xxxxx - "));
    }

    #[test]
    fn test_prompt_without_history() {
        let prompt = build_prompt(&[], "English");
        assert!(prompt.contains("recently used code: none yet"));
    }

    #[test]
    fn test_parse_first_text_part() {
        let body = gemini_body("  # ORA-00942 - missing table\n\nbody  \n");
        assert_eq!(
            parse_generated_text(&body).as_deref(),
            Some("# ORA-00942 - missing table\n\nbody")
        );
    }

    #[test]
    fn test_parse_empty_or_malformed_is_none() {
        assert!(parse_generated_text("not json").is_none());
        assert!(parse_generated_text("{}").is_none());
        assert!(parse_generated_text(r#"{"candidates": []}"#).is_none());
        assert!(parse_generated_text(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).is_none());
        assert!(parse_generated_text(r#"{"candidates": [{"content": {"parts": []}}]}"#).is_none());
        assert!(parse_generated_text(&gemini_body("   ")).is_none());
    }

    #[tokio::test]
    async fn test_gemini_sends_prompt_key_and_json_content_type() {
        let client = MockHttpClient::new(200, &gemini_body("# ORA-06550 - PL/SQL"));
        let generator =
            GeminiGenerator::new(client, "https://example.test/generate", "k3y", "Japanese");

        let text = generator.generate(&codes(&["ORA-00001"])).await.unwrap();
        assert_eq!(text.as_deref(), Some("# ORA-06550 - PL/SQL"));

        let request = generator.client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.url, "https://example.test/generate");
        assert_eq!(request.query, vec![("key".to_string(), "k3y".to_string())]);
        assert!(
            request
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v == "application/json"),
            "headers: {:?}",
            request.headers
        );
        let prompt = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("ORA-00001"));
    }

    #[tokio::test]
    async fn test_gemini_non_success_is_remote_service_error() {
        let client = MockHttpClient::new(429, "quota exceeded");
        let generator = GeminiGenerator::new(client, "https://example.test", "k", "Japanese");

        let err = generator.generate(&[]).await.unwrap_err();
        match err.downcast_ref::<PostError>() {
            Some(PostError::RemoteService { status, body }) => {
                assert_eq!(*status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates_is_none() {
        let client = MockHttpClient::new(200, r#"{"candidates": []}"#);
        let generator = GeminiGenerator::new(client, "https://example.test", "k", "Japanese");
        assert!(generator.generate(&[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_generator_skips_recent_codes() {
        let generator = MockGenerator::new();
        let article = generator
            .generate(&codes(&["ORA-00001", "ORA-00054"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(extract_error_code(&article).unwrap().as_str(), "ORA-00060");
        assert!(article.contains("```sql"));
    }

    #[tokio::test]
    async fn test_mock_generator_moves_on_between_calls() {
        let generator = MockGenerator::new();
        let first = generator.generate(&[]).await.unwrap().unwrap();
        let second = generator.generate(&[]).await.unwrap().unwrap();
        assert_eq!(extract_error_code(&first).unwrap().as_str(), "ORA-00001");
        assert_eq!(extract_error_code(&second).unwrap().as_str(), "ORA-00054");
    }

    #[tokio::test]
    async fn test_mock_generator_exhausted_catalogue() {
        let all: Vec<&str> = MOCK_CATALOGUE.iter().map(|(c, _)| *c).collect();
        let generator = MockGenerator::new();
        assert!(generator.generate(&codes(&all)).await.unwrap().is_none());
    }
}

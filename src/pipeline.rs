//! One run: generate, extract, check uniqueness, write, record.

use crate::config::Config;
use crate::error::PostError;
use crate::error_code::{extract_error_code, ErrorCode};
use crate::generator::ArticleGenerator;
use crate::ledger::UsedCodeLedger;
use crate::markdown;
use crate::post_writer::PostWriter;
use crate::providers::DateProvider;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GeneratedArticle {
    pub code: ErrorCode,
    pub date: NaiveDate,
    pub path: PathBuf,
    pub attempts: u32,
}

/// Why an attempt was thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyResponse,
    NoErrorCode,
    AlreadyUsed(ErrorCode),
}

pub struct PostPipeline {
    generator: Box<dyn ArticleGenerator>,
    dates: Box<dyn DateProvider>,
    writer: PostWriter,
    ledger_path: PathBuf,
    max_attempts: u32,
    recent_window: usize,
    convert_html: bool,
}

impl PostPipeline {
    pub fn new(
        config: &Config,
        generator: Box<dyn ArticleGenerator>,
        dates: Box<dyn DateProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            dates,
            writer: PostWriter::new(&config.output_dir),
            ledger_path: config.ledger_path.clone(),
            max_attempts: config.max_attempts,
            recent_window: config.recent_window,
            convert_html: config.convert_html,
        })
    }

    /// Checks one generated text against the ledger, handing back the
    /// accepted text together with its code.
    pub fn screen(
        content: Option<String>,
        ledger: &UsedCodeLedger,
    ) -> Result<(ErrorCode, String), Rejection> {
        let content = content.ok_or(Rejection::EmptyResponse)?;
        let code = extract_error_code(&content).ok_or(Rejection::NoErrorCode)?;
        if ledger.contains(&code) {
            return Err(Rejection::AlreadyUsed(code));
        }
        Ok((code, content))
    }

    /// Generates and files one post.
    ///
    /// Attempts that return no text, no extractable code or an already used
    /// code are discarded, up to the configured bound. Errors from the
    /// generation endpoint abort immediately. The ledger and the output
    /// directory are only touched by a successful attempt.
    pub async fn run(&self) -> Result<GeneratedArticle> {
        let mut ledger = UsedCodeLedger::load(&self.ledger_path)?;

        for attempt in 1..=self.max_attempts {
            let content = self
                .generator
                .generate(ledger.recent(self.recent_window))
                .await?;
            info!("Received generation response (attempt {}/{})", attempt, self.max_attempts);

            let (code, content) = match Self::screen(content, &ledger) {
                Ok(accepted) => accepted,
                Err(rejection) => {
                    warn!(
                        "Discarding attempt {}/{}: {:?}",
                        attempt, self.max_attempts, rejection
                    );
                    continue;
                }
            };
            info!("Extracted unused error code {}", code);

            let body = if self.convert_html {
                markdown::to_html(&content)
            } else {
                content
            };

            let date = self.dates.today();
            let path = self.writer.write(&body, &code, date)?;
            ledger.append(code.clone())?;
            ledger.save()?;

            return Ok(GeneratedArticle {
                code,
                date,
                path,
                attempts: attempt,
            });
        }

        Err(PostError::ExhaustedRetries {
            attempts: self.max_attempts,
        }
        .into())
    }
}

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::debug;

use super::{Judge, JudgeRequest, JudgeVerdict, Solver};
use crate::error::{JudgeError, SolveError};
use crate::openai::types::{ChatMessage, ChatRequest, ContentPart, ResponseFormat};
use crate::openai::OpenAiClient;

const SOLVER_PROMPT: &str = "You are a math tutor. Solve the problem shown in the image.\n\
Show your work and give the final answer clearly at the end.";

const LABEL_GLOSSARY: &str = r#"Interpret these labels as:
- "Step-by-Step": The answer shows clear, logical steps.
- "Complete": The answer may or may not show every step, but includes all required info (equation, vertex/focus/etc. as requested).
- "Incomplete": Missing required parts or steps.
- "Wrong Answer": The math result is incorrect."#;

const VERDICT_SHAPE: &str = r#"Return a JSON object with exactly these keys:
- "pass": true or false
- "reason": short explanation (1-2 sentences)
- "style_label": one of ["Step-by-Step", "Complete", "Accurate"] if "pass" is true, otherwise one of ["Incomplete", "Wrong Answer", "Clarification Needed"]
- "correct_math": true or false"#;

pub struct OpenAiSolver {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiSolver {
    pub fn new(client: OpenAiClient, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl Solver for OpenAiSolver {
    async fn solve(&self, problem_image: &Path) -> Result<String, SolveError> {
        let image = encode_image(problem_image)
            .await
            .map_err(|source| SolveError::Image {
                path: problem_image.to_path_buf(),
                source,
            })?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(vec![
                ContentPart::text(SOLVER_PROMPT),
                ContentPart::image(image),
            ])],
            max_completion_tokens: self.max_tokens,
            response_format: None,
        };

        let answer = self.client.complete(&request).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SolveError::EmptyAnswer);
        }
        Ok(answer.to_string())
    }
}

pub struct OpenAiJudge {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiJudge {
    pub fn new(client: OpenAiClient, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl Judge for OpenAiJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<JudgeVerdict, JudgeError> {
        let problem_image = encode_image(request.problem_image)
            .await
            .map_err(|source| JudgeError::Image {
                path: request.problem_image.to_path_buf(),
                source,
            })?;
        let answer_image = encode_image(request.answer_image)
            .await
            .map_err(|source| JudgeError::Image {
                path: request.answer_image.to_path_buf(),
                source,
            })?;

        let chat = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(vec![
                ContentPart::image(problem_image),
                ContentPart::image(answer_image),
                ContentPart::text(judge_prompt(&request)),
            ])],
            max_completion_tokens: self.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        };

        let content = self.client.complete(&chat).await?;
        debug!(bytes = content.len(), "Judge replied");
        JudgeVerdict::parse(&content)
    }
}

fn judge_prompt(request: &JudgeRequest<'_>) -> String {
    let mut prompt = format!(
        "You are grading another AI's answer to a math problem given as an image.\n\n\
         You are given:\n\
         - The original problem image.\n\
         - The expected correct answer image.\n\
         - The other AI's generated answer text.\n\n\
         Instructions: You must\n\
         1. Re-solve the problem yourself (based on the problem image).\n\
         2. Compare the expected answer image to the solver's answer.\n\
         3. Determine if the solver's math is correct AND its structure matches the expected style.\n\n\
         Expected valid style label: {}\n\
         Expected invalid style label: {}\n\n\
         {}\n\n\
         {}\n\n",
        request.expected_valid, request.expected_invalid, LABEL_GLOSSARY, VERDICT_SHAPE
    );
    if let Some(problem) = request.problem {
        prompt.push_str(&format!("Problem description: {}\n\n", problem));
    }
    prompt.push_str(&format!("Other AI's answer:\n{}\n", request.answer_text));
    prompt
}

async fn encode_image(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(format!(
        "data:{};base64,{}",
        image_mime(path),
        STANDARD.encode(bytes)
    ))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

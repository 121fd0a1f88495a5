use serde_json::Value;
use tracing::{info, warn};

use crate::{
    chat::{
        client::CompletionClient,
        dto::{CompletionRequest, Message},
    },
    config::ChatConfig,
    error::{AppError, AppResult},
};

pub const MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.4;

pub const PERSONA: &str = "You are Afyadada, a warm, supportive women's wellness companion. \
Offer helpful, evidence-informed guidance for menstrual health, pregnancy, postpartum, \
mental wellness, nutrition, fitness, breastfeeding, contraception, and safety. \
Keep answers short (4-7 sentences), practical, and respectful. \
Remind users to seek professional care for emergencies.";

fn prompt_text(prompt: Option<Value>) -> AppResult<String> {
    match prompt {
        Some(Value::String(text)) if !text.is_empty() => Ok(text),
        _ => Err(AppError::Validation("Missing prompt")),
    }
}

pub fn build_request(prompt: String) -> CompletionRequest {
    CompletionRequest {
        model: MODEL.into(),
        temperature: TEMPERATURE,
        messages: vec![Message::system(PERSONA), Message::user(prompt)],
    }
}

/// Relay one prompt to the provider and return its trimmed reply.
pub async fn ask(
    client: &dyn CompletionClient,
    cfg: &ChatConfig,
    prompt: Option<Value>,
) -> AppResult<String> {
    let prompt = prompt_text(prompt)?;
    let api_key = cfg
        .api_key
        .as_deref()
        .ok_or(AppError::Config("OPENAI_API_KEY"))?;

    let completion = client
        .complete(api_key, &build_request(prompt))
        .await
        .map_err(AppError::Upstream)?;

    match completion.first_text() {
        Some(text) => {
            info!(reply_len = text.len(), "chat reply relayed");
            Ok(text.to_owned())
        }
        None => {
            warn!(choices = completion.choices.len(), "provider returned no text");
            Err(AppError::UpstreamEmpty)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::fakes::StubCompletion;

    fn cfg(api_key: Option<&str>) -> ChatConfig {
        ChatConfig {
            api_key: api_key.map(str::to_owned),
            base_url: "http://unused.invalid".into(),
            timeout_secs: None,
        }
    }

    #[tokio::test]
    async fn empty_or_non_string_prompt_is_rejected() {
        let stub = StubCompletion::replying("hello");
        for prompt in [None, Some(json!("")), Some(json!(42)), Some(json!(["hi"])), Some(Value::Null)] {
            let err = ask(&stub, &cfg(Some("sk")), prompt).await.unwrap_err();
            assert!(matches!(err, AppError::Validation("Missing prompt")));
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn missing_key_is_config_error_without_calling_provider() {
        let stub = StubCompletion::replying("hello");
        let err = ask(&stub, &cfg(None), Some(json!("hi"))).await.unwrap_err();
        assert!(matches!(err, AppError::Config("OPENAI_API_KEY")));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn reply_is_trimmed_first_choice() {
        let stub = StubCompletion::replying("\n  Rest and hydrate.  ");
        let reply = ask(&stub, &cfg(Some("sk")), Some(json!("tired"))).await.unwrap();
        assert_eq!(reply, "Rest and hydrate.");
    }

    #[tokio::test]
    async fn exchange_is_persona_then_prompt() {
        let stub = StubCompletion::replying("ok");
        ask(&stub, &cfg(Some("sk-live")), Some(json!("what should I eat?"))).await.unwrap();

        let (key, req) = stub.last_request().expect("provider called");
        assert_eq!(key, "sk-live");
        assert_eq!(req.model, MODEL);
        assert_eq!(req.temperature, TEMPERATURE);
        assert_eq!(
            req.messages,
            vec![Message::system(PERSONA), Message::user("what should I eat?")]
        );
    }

    #[tokio::test]
    async fn no_choices_is_upstream_empty() {
        let stub = StubCompletion::empty();
        let err = ask(&stub, &cfg(Some("sk")), Some(json!("hi"))).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamEmpty));
    }

    #[tokio::test]
    async fn provider_failure_is_upstream_error() {
        let stub = StubCompletion::failing();
        let err = ask(&stub, &cfg(Some("sk")), Some(json!("hi"))).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}

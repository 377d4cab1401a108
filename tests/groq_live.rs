//! Live round-trip against the Groq API.
//!
//! Requires GROQ_API_KEY in the environment.
//!
//! Run with: cargo test --features integ_test --test groq_live

#[cfg(feature = "integ_test")]
mod tests {
    use std::time::Duration;

    use lingua_relay::bot::prompt::build_prompt;
    use lingua_relay::groq::{Client, Completer};

    const ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

    fn client() -> Option<Client> {
        let Ok(key) = std::env::var("GROQ_API_KEY") else {
            eprintln!("Skipping test: GROQ_API_KEY not set");
            return None;
        };
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| "llama3-8b-8192".to_string());
        Some(Client::new(key, ENDPOINT.to_string(), model, Duration::from_secs(60)).expect("client"))
    }

    #[tokio::test]
    async fn test_completion_returns_text() {
        let Some(client) = client() else { return };

        let reply = client
            .complete(&build_prompt("Say the word 'pong' and nothing else.", "en"))
            .await
            .expect("completion failed");

        println!("Reply: {reply}");
        assert!(reply.to_lowercase().contains("pong"));
    }

    #[tokio::test]
    async fn test_bad_key_is_status_error() {
        let client = Client::new(
            "gsk_invalid".to_string(),
            ENDPOINT.to_string(),
            "llama3-8b-8192".to_string(),
            Duration::from_secs(60),
        )
        .unwrap();

        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, lingua_relay::groq::CompletionError::Status { status: 401, .. }), "got {err:?}");
    }
}

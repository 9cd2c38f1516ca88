//! End-to-end adapter flows against a mock provider
//!
//! Exercises the full caller path: config snapshot -> factory -> strategy ->
//! transport -> response projection, plus the streaming text path.

use canvasgen::{
    ApiFormat, ChatRequest, GenError, GenerationParams, ImageGenerationCapability, ModelConfig,
    ProviderConfig, ReferenceImage, collect_text, create_adapter, stream_chat_completions,
};

fn provider(base_url: &str, models: Vec<ModelConfig>) -> ProviderConfig {
    ProviderConfig {
        id: "test-provider".to_string(),
        name: None,
        base_url: base_url.to_string(),
        api_key: "sk-test".to_string(),
        models,
    }
}

#[tokio::test]
async fn openai_flow_via_factory() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_header("authorization", "Bearer sk-test")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "dall-e-3",
            "prompt": "a red fox",
            "n": 1,
            "response_format": "url",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"data\":[{\"url\":\"https://img.example/fox.png\"}]}")
        .create_async()
        .await;

    let config = provider(&server.url(), vec![ModelConfig::image("dall-e-3")]);
    let adapter = create_adapter(&config, "dall-e-3").unwrap();
    let images = adapter
        .generate_image(GenerationParams::new("dall-e-3", "a red fox"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(images[0].url, "https://img.example/fox.png");
}

#[tokio::test]
async fn doubao_flow_forwards_reference_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "doubao-seedream-4-5-251128",
            "image_url": "https://example.com/ref.png",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"data\":[{\"url\":\"https://img.example/out.png\"}]}")
        .create_async()
        .await;

    let model = ModelConfig {
        api_format: ApiFormat::Doubao,
        ..ModelConfig::image("doubao-seedream-4-5-251128")
    };
    let config = provider(&server.url(), vec![model]);
    let adapter = create_adapter(&config, "doubao-seedream-4-5-251128").unwrap();

    let mut params = GenerationParams::new("doubao-seedream-4-5-251128", "a lighthouse");
    // Both set: the URL must win over base64.
    params.reference_images = vec![ReferenceImage {
        url: Some("https://example.com/ref.png".to_string()),
        base64: Some("data:image/png;base64,QUJD".to_string()),
    }];

    let images = adapter.generate_image(params).await.unwrap();
    mock.assert_async().await;
    assert_eq!(images[0].url, "https://img.example/out.png");
}

#[tokio::test]
async fn gemini_flow_via_factory() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/models/gemini-img:generateContent")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "contents": [{ "role": "user" }],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            "{\"candidates\":[{\"content\":{\"parts\":[{\"inlineData\":{\"mimeType\":\"image/png\",\"data\":\"QUJD\"}}]}}]}",
        )
        .create_async()
        .await;

    let model = ModelConfig {
        api_format: ApiFormat::Gemini,
        ..ModelConfig::image("gemini-img")
    };
    let config = provider(&server.url(), vec![model]);
    let adapter = create_adapter(&config, "gemini-img").unwrap();
    let images = adapter
        .generate_image(GenerationParams::new("gemini-img", "a koi pond"))
        .await
        .unwrap();

    assert_eq!(images[0].url, "data:image/png;base64,QUJD");
}

#[tokio::test]
async fn unknown_model_goes_through_openai_default() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"data\":[{\"url\":\"https://img.example/x.png\"}]}")
        .create_async()
        .await;

    let config = provider(&server.url(), vec![]);
    let adapter = create_adapter(&config, "never-seen-before").unwrap();
    assert_eq!(adapter.api_format(), ApiFormat::OpenAi);

    adapter
        .generate_image(GenerationParams::new("never-seen-before", "anything"))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn http_failures_map_to_guidance() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/images/generations")
        .with_status(429)
        .with_body("too many requests")
        .create_async()
        .await;

    let config = provider(&server.url(), vec![ModelConfig::image("dall-e-3")]);
    let adapter = create_adapter(&config, "dall-e-3").unwrap();
    let err = adapter
        .generate_image(GenerationParams::new("dall-e-3", "a red fox"))
        .await
        .expect_err("429 expected");

    assert_eq!(err.status_code(), Some(429));
    assert_eq!(
        err.user_friendly_message(),
        "Rate limited. Too many requests, try again later."
    );
}

#[tokio::test]
async fn streaming_text_flow() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "stream": true,
            "messages": [
                { "role": "system", "content": "be terse" },
                { "role": "user", "content": "hello" },
            ],
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n\
             data: [DONE]\n\n",
        )
        .create_async()
        .await;

    let config = provider(&server.url(), vec![]);
    let request = ChatRequest::new("gpt-4o-mini", "hello").with_system_prompt("be terse");
    let handle = stream_chat_completions(&config, &request).unwrap();
    let text = collect_text(handle.stream).await.unwrap();
    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn params_are_checked_before_the_network() {
    // Unroutable base URL: if validation did not run first, this would
    // surface as a network error instead.
    let config = provider("http://127.0.0.1:1", vec![ModelConfig::image("dall-e-3")]);
    let adapter = create_adapter(&config, "dall-e-3").unwrap();
    let err = adapter
        .generate_image(GenerationParams {
            prompt: String::new(),
            model: "dall-e-3".to_string(),
            ..Default::default()
        })
        .await
        .expect_err("validation error expected");
    assert!(matches!(err, GenError::Validation(_)));
}

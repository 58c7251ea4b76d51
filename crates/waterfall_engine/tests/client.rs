use futures_util::stream;
use serde_json::json;
use waterfall_core::{AspectRatio, GenerationParams, Preset, Resolution, VideoLength};
use waterfall_engine::{
    accumulate, ClientSettings, Credential, EngineConfig, FailureKind, GenerationClient,
    GenerationError, GenerationRequest, GenerationResponse, ReqwestGenerationClient,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestGenerationClient {
    let config = EngineConfig {
        base_url: format!("{}/", server.uri()),
        ..EngineConfig::default()
    };
    ReqwestGenerationClient::new(ClientSettings::from(&config)).expect("client builds")
}

fn request(stream: bool) -> GenerationRequest {
    GenerationRequest {
        prompt: "a lighthouse in a storm".to_string(),
        params: GenerationParams {
            aspect_ratio: AspectRatio::Portrait9x16,
            video_length: VideoLength::Fifteen,
            resolution: Resolution::P720,
            preset: Preset::Normal,
        },
        stream,
    }
}

async fn collect(response: GenerationResponse) -> Result<String, GenerationError> {
    match response {
        GenerationResponse::Complete(text) => Ok(text),
        GenerationResponse::Stream(stream) => accumulate(stream, |_| {}).await,
    }
}

#[tokio::test]
async fn streaming_request_is_accumulated() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"https://cdn.example/\"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"v.mp4\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "grok-imagine-1.0-video",
            "stream": true,
            "messages": [{"role": "user", "content": "a lighthouse in a storm"}],
            "video_config": {
                "aspect_ratio": "9:16",
                "video_length": 15,
                "resolution_name": "720p",
                "preset": "normal"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .generate(&request(true), &Credential::new("sk-test"))
        .await
        .expect("request ok");
    assert!(matches!(response, GenerationResponse::Stream(_)));
    assert_eq!(collect(response).await.unwrap(), "https://cdn.example/v.mp4");
}

#[tokio::test]
async fn non_streaming_request_reads_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "<video src=\"https://cdn.example/x.mp4\"></video>"}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .generate(&request(false), &Credential::new("sk-test"))
        .await
        .expect("request ok");
    assert_eq!(
        collect(response).await.unwrap(),
        "<video src=\"https://cdn.example/x.mp4\"></video>"
    );
}

#[tokio::test]
async fn error_status_carries_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate(&request(true), &Credential::new("sk-test"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(429));
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.message, "rate limited");
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&request(false), &Credential::new("sk-test"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "HTTP 500");
}

#[tokio::test]
async fn unreachable_service_is_a_network_failure() {
    let config = EngineConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..EngineConfig::default()
    };
    let client = ReqwestGenerationClient::new(ClientSettings::from(&config)).unwrap();
    let err = client
        .generate(&request(true), &Credential::new("sk-test"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn transport_error_mid_stream_aborts_accumulation() {
    let chunks = vec![
        Ok(bytes::Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"part\"}}]}\n",
        )),
        Err(GenerationError::new(FailureKind::Network, "connection reset")),
    ];
    let mut seen = Vec::new();
    let err = accumulate(stream::iter(chunks), |text| seen.push(text.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
    assert_eq!(seen, vec!["part".to_string()]);
}

use grelay_protocol::openai::{ChatCompletionRequest, ChatMessage, StreamOptions};
use grelay_provider_core::{
    ApiType, ChannelRegistry, RelayError, RelayInfo, RelayMeta, channel_type,
};

fn meta(channel: i32) -> RelayMeta {
    RelayMeta {
        channel_type: channel,
        api_key: "Bearer sk-test".to_string(),
        request_path: "/v1/chat/completions".to_string(),
        ..Default::default()
    }
}

#[test]
fn base_url_falls_back_to_channel_default() {
    let info = RelayInfo::build(meta(channel_type::ANTHROPIC), &ChannelRegistry::with_builtin())
        .unwrap();
    assert_eq!(info.base_url, "https://api.anthropic.com");
    assert_eq!(info.api_type, ApiType::Anthropic);
    assert_eq!(info.api_key, "sk-test");
    assert!(info.support_stream_options);
}

#[test]
fn explicit_base_url_wins() {
    let mut meta = meta(channel_type::OPENAI);
    meta.base_url = Some("https://proxy.example/".to_string());
    let info = RelayInfo::build(meta, &ChannelRegistry::with_builtin()).unwrap();
    assert_eq!(info.base_url, "https://proxy.example");
}

#[test]
fn unknown_channel_is_a_config_error() {
    let err = RelayInfo::build(meta(4242), &ChannelRegistry::with_builtin()).unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config {
            code: "channel_not_found",
            ..
        }
    ));
}

#[test]
fn channel_without_default_base_url_needs_override() {
    let err = RelayInfo::build(meta(channel_type::AZURE), &ChannelRegistry::with_builtin())
        .unwrap_err();
    assert_eq!(err.code(), "base_url_missing");
}

#[test]
fn first_response_time_is_set_once() {
    let mut info =
        RelayInfo::build(meta(channel_type::OPENAI), &ChannelRegistry::with_builtin()).unwrap();
    assert!(info.first_response_time < info.start_time);
    info.set_first_response_time();
    let first = info.first_response_time;
    assert!(first >= info.start_time);
    std::thread::sleep(std::time::Duration::from_millis(5));
    info.set_first_response_time();
    assert_eq!(info.first_response_time, first);
}

#[test]
fn include_usage_requires_supporting_channel() {
    let mut request = ChatCompletionRequest::new("m", vec![ChatMessage::text("user", "hi")]);
    request.stream = true;
    request.stream_options = Some(StreamOptions {
        include_usage: true,
    });

    let registry = ChannelRegistry::with_builtin();
    let mut info = RelayInfo::build(meta(channel_type::OPENAI), &registry).unwrap();
    info.bind_request(&request);
    assert!(info.is_stream);
    assert!(info.should_include_usage);

    let mut info = RelayInfo::build(meta(channel_type::DOUBAO), &registry).unwrap();
    info.bind_request(&request);
    assert!(!info.should_include_usage);
}

use grelay_provider_core::{Channel, ChannelRegistry, builtin_channels, channel_type};

#[test]
fn lookup_returns_loaded_channels() {
    let registry = ChannelRegistry::with_builtin();
    for channel in builtin_channels() {
        assert_eq!(registry.lookup(channel.channel_type), Some(channel));
    }
    assert_eq!(registry.lookup(9999), None);
}

#[test]
fn load_replaces_whole_table() {
    let registry = ChannelRegistry::with_builtin();
    registry.load(vec![Channel::new(42, "https://only.example")]);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup(channel_type::OPENAI), None);
    assert_eq!(
        registry.lookup(42).map(|channel| channel.base_url),
        Some("https://only.example".to_string())
    );
}

#[test]
fn builtin_channel_types_are_unique() {
    let channels = builtin_channels();
    let mut types: Vec<i32> = channels.iter().map(|channel| channel.channel_type).collect();
    types.sort_unstable();
    types.dedup();
    assert_eq!(types.len(), channels.len());
}

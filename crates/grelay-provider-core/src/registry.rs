use std::collections::HashMap;
use std::sync::Arc;

use crate::Adaptor;
use crate::api_type::ApiType;
use crate::errors::{RelayError, RelayResult};
use crate::relay_info::RelayInfo;

/// Adaptor lookup: a channel-specific entry wins over the API-type entry.
#[derive(Default)]
pub struct AdaptorRegistry {
    by_channel: HashMap<i32, Arc<dyn Adaptor>>,
    by_api_type: HashMap<ApiType, Arc<dyn Adaptor>>,
}

impl AdaptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_api_type(&mut self, api_type: ApiType, adaptor: Arc<dyn Adaptor>) {
        self.by_api_type.insert(api_type, adaptor);
    }

    pub fn register_channel(&mut self, channel_type: i32, adaptor: Arc<dyn Adaptor>) {
        self.by_channel.insert(channel_type, adaptor);
    }

    pub fn get(&self, channel_type: i32, api_type: ApiType) -> Option<Arc<dyn Adaptor>> {
        self.by_channel
            .get(&channel_type)
            .or_else(|| self.by_api_type.get(&api_type))
            .cloned()
    }

    pub fn resolve(&self, info: &RelayInfo) -> RelayResult<Arc<dyn Adaptor>> {
        self.get(info.channel_type, info.api_type).ok_or_else(|| {
            RelayError::config(
                "adaptor_not_found",
                format!(
                    "no adaptor for channel {} (api type {})",
                    info.channel_type,
                    info.api_type.as_str()
                ),
            )
        })
    }
}

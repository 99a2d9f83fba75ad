//! Codec configuration.

use grove_wire::MAX_INDEXED_PROPERTIES;

/// Configuration for a [`Codec`](crate::Codec).
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Application id stamped into key references whose key carries
    /// none of its own.
    pub app_id: String,

    /// Upper bound on the number of indexed properties one entity
    /// may carry. Exceeding it is a hard encode failure.
    pub max_indexed_properties: usize,

    /// Capacity of the bounded property channel used for streaming
    /// load/save calls.
    pub stream_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            max_indexed_properties: MAX_INDEXED_PROPERTIES,
            stream_capacity: 32,
        }
    }
}

impl CodecConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default application id.
    #[must_use]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Sets the indexed-property limit.
    #[must_use]
    pub const fn max_indexed_properties(mut self, limit: usize) -> Self {
        self.max_indexed_properties = limit;
        self
    }

    /// Sets the streaming channel capacity.
    #[must_use]
    pub const fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }
}

pub const APP_NAME: &str = "Bazaar";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const MIN_SEARCH_QUERY_LENGTH: usize = 2;
pub const MAX_SEARCH_QUERY_LENGTH: usize = 64;

// Conversation polling
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// Distance from the newest message (in px) that still counts as "at the bottom"
pub const DEFAULT_SCROLL_THRESHOLD_PX: f32 = 100.0;

// Optimistic messages
pub const TEMP_MESSAGE_ID_PREFIX: &str = "temp-";

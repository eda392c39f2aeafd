//! Centralized constants for the Roy lead agent
//!
//! Single source of truth for conversation limits, fixed copy and provider endpoints.

/// Conversation limits
pub mod limits {
    /// Hard ceiling on messages in one session (both parties)
    pub const MAX_MESSAGES: usize = 40;

    /// Message count at which Roy offers a phone call
    pub const CALL_PROMPT_THRESHOLD: usize = 30;

    /// Minimum message count before the lead-collection form appears
    pub const LEAD_FORM_MIN_MESSAGES: usize = 15;

    /// Window used for recency-sensitive extraction when enabled
    pub const RECENT_WINDOW: usize = 6;

    /// Listings shown to a renter
    pub const MAX_LISTING_RESULTS: usize = 3;
}

/// Reply pacing (emulated typing)
pub mod pacing {
    pub const MS_PER_CHAR: u64 = 15;
    pub const MAX_TYPING_MS: u64 = 2000;
    pub const BETWEEN_FRAGMENTS_MS: u64 = 500;
}

/// Fixed copy shown to visitors
pub mod messages {
    pub const WELCOME: &str = "Hey there! Are you excited to embark on your search for a new home? I am Roy, I will be your local real estate expert. How can I help you today?";

    pub const REPLY_FALLBACK: &str =
        "I'm having trouble connecting right now. Could you try again in a moment?";

    /// `{phone}` is replaced with the number being called
    pub const CALL_STARTED: &str = "Perfect! I'm calling you now at {phone}. Please answer your phone - I'll be calling you within the next minute to discuss your options and show you some amazing listings!";

    pub const CALL_FAILED: &str = "I'm having trouble initiating the call right now. Please try again in a moment, or feel free to call me directly!";
}

/// Service endpoints
pub mod endpoints {
    pub const ANTHROPIC_DEFAULT: &str = "https://api.anthropic.com";
    pub const ELEVENLABS_DEFAULT: &str = "https://api.elevenlabs.io";
    pub const CLAUDE_MODEL_DEFAULT: &str = "claude-3-5-sonnet-20241022";
}

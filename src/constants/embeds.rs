use serenity::all::{Colour, CreateEmbed};

// ============================================================================
// Color Palette
// ============================================================================

/// Success color - Emerald green
pub const SUCCESS_COLOR: Colour = Colour::from_rgb(16, 185, 129);

/// Error color - Rose red
pub const ERROR_COLOR: Colour = Colour::from_rgb(244, 63, 94);

/// Warning color - Amber, used when a batch partly failed
pub const WARNING_COLOR: Colour = Colour::from_rgb(245, 158, 11);

/// Info/neutral color - Slate, used for direct messages
pub const INFO_COLOR: Colour = Colour::from_rgb(100, 116, 139);

/// Bullet point character
pub const BULLET: &str = "•";

// ============================================================================
// Embed Builders
// ============================================================================

pub fn success_embed() -> CreateEmbed {
    CreateEmbed::new().color(SUCCESS_COLOR)
}

pub fn error_embed() -> CreateEmbed {
    CreateEmbed::new().color(ERROR_COLOR)
}

pub fn warning_embed() -> CreateEmbed {
    CreateEmbed::new().color(WARNING_COLOR)
}

pub fn info_embed() -> CreateEmbed {
    CreateEmbed::new().color(INFO_COLOR)
}

// ============================================================================
// Text Helpers
// ============================================================================

/// Format a list of items with bullet points
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("{} {}", BULLET, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

use serde::Serialize;
use std::sync::OnceLock;

use super::types::StylerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleIcon {
    BookOpen,
    Sparkles,
    Skull,
    Shield,
    Headphones,
    Mic,
}

impl StyleIcon {
    /// Resolve an icon name from the catalog. Unknown names fall back to `Mic`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "BookOpen" => StyleIcon::BookOpen,
            "Sparkles" => StyleIcon::Sparkles,
            "Skull" => StyleIcon::Skull,
            "Shield" => StyleIcon::Shield,
            "Headphones" => StyleIcon::Headphones,
            _ => StyleIcon::Mic,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            StyleIcon::BookOpen => "📖",
            StyleIcon::Sparkles => "✨",
            StyleIcon::Skull => "💀",
            StyleIcon::Shield => "🛡",
            StyleIcon::Headphones => "🎧",
            StyleIcon::Mic => "🎤",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: StyleIcon,
    /// Prebuilt voice name understood by the provider.
    pub voice_name: &'static str,
    pub prompt_prefix: &'static str,
    pub color: &'static str,
}

struct StyleEntry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    voice_name: &'static str,
    prompt_prefix: &'static str,
    color: &'static str,
}

const ENTRIES: &[StyleEntry] = &[
    StyleEntry {
        id: "narrator",
        name: "The Narrator",
        description: "Deep, calm, and authoritative. Perfect for documentaries or serious readings.",
        icon: "BookOpen",
        voice_name: "Charon",
        prompt_prefix: "Narrate this with a deep, soothing, and authoritative voice, like a movie trailer narrator:",
        color: "from-blue-600 to-indigo-900",
    },
    StyleEntry {
        id: "storyteller",
        name: "The Storyteller",
        description: "Bright, energetic, and engaging. Ideal for children's books or happy announcements.",
        icon: "Sparkles",
        voice_name: "Puck",
        prompt_prefix: "Read this with a bright, energetic, and cheerful tone, full of wonder and excitement:",
        color: "from-yellow-500 to-orange-600",
    },
    StyleEntry {
        id: "villain",
        name: "The Villain",
        description: "Dark, gravelly, and ominous. Best for dramatic, menacing lines.",
        icon: "Skull",
        voice_name: "Fenrir",
        prompt_prefix: "Speak this in a dark, gravelly, and ominous tone, like a classic villain:",
        color: "from-red-700 to-rose-900",
    },
    StyleEntry {
        id: "hero",
        name: "The Hero",
        description: "Bold, inspiring, and confident. For speeches and calls to action.",
        icon: "Shield",
        voice_name: "Kore",
        prompt_prefix: "Declaim this with a bold, inspiring, and heroic tone, full of confidence:",
        color: "from-emerald-500 to-teal-700",
    },
    StyleEntry {
        id: "assistant",
        name: "The Assistant",
        description: "Crisp, professional, and helpful. Great for technical explanations.",
        icon: "Headphones",
        voice_name: "Zephyr",
        prompt_prefix: "Speak this in a crisp, clear, and professional manner, like a helpful AI assistant:",
        color: "from-purple-500 to-fuchsia-700",
    },
];

/// The ordered style catalog, resolved once. The first entry is the default.
pub fn catalog() -> &'static [VoiceStyle] {
    static CATALOG: OnceLock<Vec<VoiceStyle>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        ENTRIES
            .iter()
            .map(|e| VoiceStyle {
                id: e.id,
                name: e.name,
                description: e.description,
                icon: StyleIcon::from_name(e.icon),
                voice_name: e.voice_name,
                prompt_prefix: e.prompt_prefix,
                color: e.color,
            })
            .collect()
    })
}

pub fn default_style() -> &'static VoiceStyle {
    &catalog()[0]
}

pub fn find_style(id: &str) -> Result<&'static VoiceStyle, StylerError> {
    catalog()
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| StylerError::UnknownStyle(id.to_string()))
}

pub fn build_prompt(style: &VoiceStyle, text: &str) -> String {
    format!("{} {}", style.prompt_prefix, text)
}

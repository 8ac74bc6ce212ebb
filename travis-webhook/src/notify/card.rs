//! Google Chat card document sent to the chat webhook.

use serde::Serialize;

use crate::notify::format::format_message;
use crate::payload::BuildPayload;

/// Title shown in every card header.
pub const CARD_TITLE: &str = "Travis CI";

/// Top-level chat message carrying one or more cards.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub header: CardHeader,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHeader {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub image_style: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    TextParagraph { text: String },
    Buttons(Vec<Button>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Button {
    TextButton {
        text: String,
        #[serde(rename = "onClick")]
        on_click: OnClick,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnClick {
    pub open_link: OpenLink,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenLink {
    pub url: String,
}

impl Button {
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Button::TextButton {
            text: text.into(),
            on_click: OnClick {
                open_link: OpenLink { url: url.into() },
            },
        }
    }
}

impl ChatMessage {
    /// Build the notification card for one build.
    ///
    /// The header names the repository and branch, the first section holds
    /// the formatted status line and the second links to the build and to
    /// the PR or commit comparison.
    pub fn for_build(payload: &BuildPayload, repository_slug: &str, image_url: &str) -> Self {
        let second_label = if payload.is_pull_request() {
            "Show PR"
        } else {
            "Commit info"
        };

        let card = Card {
            header: CardHeader {
                title: CARD_TITLE.to_string(),
                subtitle: format!("{}@{}", repository_slug, payload.branch),
                image_url: image_url.to_string(),
                image_style: "IMAGE",
            },
            sections: vec![
                Section {
                    widgets: vec![Widget::TextParagraph {
                        text: format_message(payload, repository_slug),
                    }],
                },
                Section {
                    widgets: vec![Widget::Buttons(vec![
                        Button::link("Show build", payload.build_url.clone()),
                        Button::link(second_label, payload.compare_url.clone()),
                    ])],
                },
            ],
        };

        ChatMessage { cards: vec![card] }
    }
}

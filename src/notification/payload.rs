use std::collections::BTreeMap;
use std::path::PathBuf;

use strum::{Display, EnumString};
use teloxide::types::ReplyMarkup;

/// Named arguments substituted into a localized template.
pub type TemplateArgs = BTreeMap<String, serde_json::Value>;

/// Auto-delete timer a payload gets unless the caller says otherwise.
pub const DEFAULT_AUTO_DELETE_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    Document,
    Animation,
    Audio,
}

/// File attached to a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaFile {
    Memory { data: Vec<u8>, file_name: String },
    Path(PathBuf),
}

impl MediaFile {
    pub fn memory(data: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        MediaFile::Memory {
            data: data.into(),
            file_name: file_name.into(),
        }
    }
}

/// Telegram message effects, by effect id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEffect {
    Fire,
    Like,
    Dislike,
    Love,
    Confetti,
    Poop,
}

impl MessageEffect {
    pub fn id(&self) -> &'static str {
        match self {
            MessageEffect::Fire => "5104841245755180586",
            MessageEffect::Like => "5107584321108051014",
            MessageEffect::Dislike => "5104858069142078462",
            MessageEffect::Love => "5159385139981059251",
            MessageEffect::Confetti => "5046509860389126442",
            MessageEffect::Poop => "5046589136895476101",
        }
    }
}

/// Everything needed to send one notification. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct MessagePayload {
    text_key: String,
    media: Option<MediaFile>,
    media_type: Option<MediaType>,
    reply_markup: Option<ReplyMarkup>,
    auto_delete_after: Option<u64>,
    add_close_button: bool,
    message_effect: Option<MessageEffect>,
    template_args: TemplateArgs,
}

impl MessagePayload {
    pub fn builder(text_key: impl Into<String>) -> MessagePayloadBuilder {
        MessagePayloadBuilder {
            payload: MessagePayload {
                text_key: text_key.into(),
                media: None,
                media_type: None,
                reply_markup: None,
                auto_delete_after: Some(DEFAULT_AUTO_DELETE_SECS),
                add_close_button: false,
                message_effect: None,
                template_args: TemplateArgs::new(),
            },
        }
    }

    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    pub fn media(&self) -> Option<&MediaFile> {
        self.media.as_ref()
    }

    pub fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }

    pub fn reply_markup(&self) -> Option<&ReplyMarkup> {
        self.reply_markup.as_ref()
    }

    pub fn auto_delete_after(&self) -> Option<u64> {
        self.auto_delete_after
    }

    pub fn add_close_button(&self) -> bool {
        self.add_close_button
    }

    pub fn message_effect(&self) -> Option<MessageEffect> {
        self.message_effect
    }

    pub fn template_args(&self) -> &TemplateArgs {
        &self.template_args
    }
}

#[derive(Debug, Clone)]
pub struct MessagePayloadBuilder {
    payload: MessagePayload,
}

impl MessagePayloadBuilder {
    pub fn media(mut self, media: MediaFile, media_type: MediaType) -> Self {
        self.payload.media = Some(media);
        self.payload.media_type = Some(media_type);
        self
    }

    /// Attaches a file without declaring its kind. Delivery falls back to text.
    pub fn untyped_media(mut self, media: MediaFile) -> Self {
        self.payload.media = Some(media);
        self.payload.media_type = None;
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.payload.reply_markup = Some(markup.into());
        self
    }

    pub fn auto_delete_after(mut self, secs: Option<u64>) -> Self {
        self.payload.auto_delete_after = secs;
        self
    }

    pub fn close_button(mut self, add: bool) -> Self {
        self.payload.add_close_button = add;
        self
    }

    pub fn effect(mut self, effect: MessageEffect) -> Self {
        self.payload.message_effect = Some(effect);
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.template_args.insert(name.into(), value.into());
        self
    }

    pub fn args(mut self, args: TemplateArgs) -> Self {
        self.payload.template_args.extend(args);
        self
    }

    pub fn build(self) -> MessagePayload {
        self.payload
    }
}

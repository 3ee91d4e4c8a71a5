use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{EffectId, InputFile, MessageId, ParseMode, ReplyMarkup};

use crate::error::Result;
use crate::notification::payload::{MediaFile, MediaType, MessageEffect};

/// Handle of a message the transport delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

impl From<&Message> for SentMessage {
    fn from(message: &Message) -> Self {
        Self {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
        }
    }
}

/// Outgoing side of the Telegram Bot API used by notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        reply_markup: Option<ReplyMarkup>,
        effect: Option<MessageEffect>,
    ) -> Result<SentMessage>;

    async fn send_media(
        &self,
        chat_id: i64,
        media_type: MediaType,
        media: MediaFile,
        caption: Option<String>,
        reply_markup: Option<ReplyMarkup>,
        effect: Option<MessageEffect>,
    ) -> Result<SentMessage>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;
}

/// [`Transport`] backed by a teloxide [`Bot`]. Texts are sent as HTML.
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
}

impl TeloxideTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn effect_id(effect: MessageEffect) -> EffectId {
    EffectId(effect.id().to_string())
}

fn input_file(media: MediaFile) -> InputFile {
    match media {
        MediaFile::Memory { data, file_name } => InputFile::memory(data).file_name(file_name),
        MediaFile::Path(path) => InputFile::file(path),
    }
}

// Every media request shares the same optional setters.
macro_rules! send_media_request {
    ($request:expr, $caption:expr, $markup:expr, $effect:expr) => {{
        let mut request = $request.parse_mode(ParseMode::Html);
        if let Some(caption) = $caption {
            request = request.caption(caption);
        }
        if let Some(markup) = $markup {
            request = request.reply_markup(markup);
        }
        if let Some(effect) = $effect {
            request = request.message_effect_id(effect_id(effect));
        }
        request.await?
    }};
}

#[async_trait]
impl Transport for TeloxideTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        reply_markup: Option<ReplyMarkup>,
        effect: Option<MessageEffect>,
    ) -> Result<SentMessage> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = reply_markup {
            request = request.reply_markup(markup);
        }
        if let Some(effect) = effect {
            request = request.message_effect_id(effect_id(effect));
        }

        let message = request.await?;
        Ok(SentMessage::from(&message))
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media_type: MediaType,
        media: MediaFile,
        caption: Option<String>,
        reply_markup: Option<ReplyMarkup>,
        effect: Option<MessageEffect>,
    ) -> Result<SentMessage> {
        let chat_id = ChatId(chat_id);
        let file = input_file(media);

        let message = match media_type {
            MediaType::Photo => {
                send_media_request!(self.bot.send_photo(chat_id, file), caption, reply_markup, effect)
            }
            MediaType::Video => {
                send_media_request!(self.bot.send_video(chat_id, file), caption, reply_markup, effect)
            }
            MediaType::Document => {
                send_media_request!(self.bot.send_document(chat_id, file), caption, reply_markup, effect)
            }
            MediaType::Animation => {
                send_media_request!(self.bot.send_animation(chat_id, file), caption, reply_markup, effect)
            }
            MediaType::Audio => {
                send_media_request!(self.bot.send_audio(chat_id, file), caption, reply_markup, effect)
            }
        };

        Ok(SentMessage::from(&message))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }
}

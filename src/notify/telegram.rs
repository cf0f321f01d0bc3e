use teloxide::{prelude::*, types::ParseMode};

use crate::notify::{
    channel::{ChannelError, ChannelKind, NotifyChannel},
    message::ChannelMessage,
};

/// Sends alerts to a fixed chat via the Telegram bot API.
pub struct TelegramChannel {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramChannel {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait::async_trait]
impl NotifyChannel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn send(&self, message: &ChannelMessage) -> Result<(), ChannelError> {
        self.bot
            .send_message(self.chat_id, &message.html_body)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

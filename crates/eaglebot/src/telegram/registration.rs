//! Telegram side of the registration wizard and the "I've paid" button.
//!
//! Translates updates into wizard events and renders `Reply` values as
//! MarkdownV2 messages with inline keyboards. Button presses edit the message
//! they came from; typed answers get a fresh message.

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageId, ParseMode, User,
};
use teloxide::{ApiError, RequestError};

use eaglecore::registration::{prompts, ButtonAction, CallbackAction, Event, Reply};
use eaglecore::VerifyOutcome;

use super::notifications::{notify_admin_payment_verified, notify_admin_registration};
use super::search::handle_view_catalogue;
use super::types::{describe_user, sender_id, user_id, HandlerDeps};

/// Inline keyboard for `reply`, `None` when it has no buttons.
pub fn keyboard(reply: &Reply) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = reply
        .keyboard
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|button| match &button.action {
                    ButtonAction::Callback(action) => {
                        Some(InlineKeyboardButton::callback(button.label.clone(), action.encode()))
                    }
                    ButtonAction::Url(url) => match url::Url::parse(url) {
                        Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
                        Err(e) => {
                            log::warn!("Dropping button '{}' with bad URL {}: {}", button.label, url, e);
                            None
                        }
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<Message> {
    let request = bot
        .send_message(chat_id, reply.text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    match keyboard(reply) {
        Some(markup) => request.reply_markup(markup).await,
        None => request.await,
    }
}

/// Replaces the text of `message_id`, or sends a new message if it can no
/// longer be edited.
pub async fn edit_or_send(bot: &Bot, chat_id: ChatId, message_id: MessageId, reply: &Reply) -> ResponseResult<()> {
    let request = bot
        .edit_message_text(chat_id, message_id, reply.text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    let edited = match keyboard(reply) {
        Some(markup) => request.reply_markup(markup).await,
        None => request.await,
    };

    match edited {
        Ok(_) => Ok(()),
        // Stale button re-asking the question already on screen
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => {
            log::debug!("Edit of message {:?} in chat {} failed ({}), sending instead", message_id, chat_id, e);
            send_reply(bot, chat_id, reply).await.map(|_| ())
        }
    }
}

async fn deliver(bot: &Bot, chat_id: ChatId, edit: Option<MessageId>, reply: &Reply) -> ResponseResult<()> {
    match edit {
        Some(message_id) => edit_or_send(bot, chat_id, message_id, reply).await,
        None => send_reply(bot, chat_id, reply).await.map(|_| ()),
    }
}

/// Runs one wizard event for `user` and answers in `chat_id`.
pub async fn handle_event(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user: &User,
    event: Event,
    edit: Option<MessageId>,
) -> ResponseResult<()> {
    let Some(id) = user_id(user) else {
        return Ok(());
    };

    let handled = match deps.registration.handle(id, event).await {
        Ok(handled) => handled,
        Err(e) => {
            log::error!("Registration event of user {} failed: {}", id, e);
            return deliver(bot, chat_id, edit, &prompts::registration_error()).await;
        }
    };

    deliver(bot, chat_id, edit, &handled.reply).await?;

    if let Some((registration, outcome)) = &handled.finalized {
        notify_admin_registration(bot, id, &describe_user(user), registration, outcome).await;
    }
    Ok(())
}

/// Wizard event carried by a plain message: text answers and documents.
pub fn message_event(msg: &Message) -> Option<Event> {
    if let Some(document) = msg.document() {
        return Some(Event::Document {
            file_id: document.file.id.0.clone(),
            file_name: document.file_name.clone().unwrap_or_default(),
        });
    }
    match msg.text() {
        Some(text) if !text.starts_with('/') => Some(Event::Text(text.to_string())),
        _ => None,
    }
}

/// Messages typed while a registration is in progress. Anything else is
/// ignored: outside the wizard the bot only reacts to commands and buttons.
pub async fn handle_wizard_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let (Some(user), Some(id)) = (msg.from.as_ref(), sender_id(msg)) else {
        return Ok(());
    };
    if !deps.registration.is_active(id).await {
        return Ok(());
    }
    let Some(event) = message_event(msg) else {
        return Ok(());
    };

    handle_event(bot, deps, msg.chat.id, user, event, None).await
}

async fn verify_payment(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    reference: &str,
) -> ResponseResult<()> {
    let reply = match deps.reconciler.verify(reference).await {
        Ok(outcome) => {
            if let VerifyOutcome::Verified(payment) = &outcome {
                notify_admin_payment_verified(bot, payment).await;
            }
            prompts::verify_outcome(&outcome)
        }
        Err(e) => {
            log::error!("Verify of payment {} failed: {}", reference, e);
            prompts::verify_unavailable(reference)
        }
    };
    deliver(bot, chat_id, message_id, &reply).await
}

/// Inline button presses: wizard navigation, payment verification,
/// catalogues and the main menu.
pub async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        return Ok(());
    };
    let message_id = q.message.as_ref().map(|m| m.id());

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::debug!("Ignoring unknown callback data {:?}", q.data);
        return Ok(());
    };

    match action {
        CallbackAction::VerifyPayment(reference) => verify_payment(bot, deps, chat_id, message_id, &reference).await,
        CallbackAction::ViewCatalogue(provider_id) => handle_view_catalogue(bot, deps, chat_id, provider_id).await,
        CallbackAction::MainMenu => deliver(bot, chat_id, message_id, &prompts::welcome(&q.from.first_name)).await,
        other => match other.to_event() {
            Some(event) => handle_event(bot, deps, chat_id, &q.from, event, message_id).await,
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaglecore::registration::Button;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyboard_maps_callbacks_and_urls() {
        let reply = Reply {
            text: "hi".to_string(),
            keyboard: vec![
                vec![Button::url("💳 Pay Now", "https://checkout.paystack.com/abc")],
                vec![Button::callback("Skip", CallbackAction::MainMenu)],
            ],
        };
        let markup = keyboard(&reply).unwrap();

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Skip");
        assert_eq!(
            markup.inline_keyboard[0][0],
            InlineKeyboardButton::url(
                "💳 Pay Now".to_string(),
                url::Url::parse("https://checkout.paystack.com/abc").unwrap()
            )
        );
    }

    #[test]
    fn test_keyboard_drops_unparseable_urls() {
        let reply = Reply {
            text: "hi".to_string(),
            keyboard: vec![vec![Button::url("Pay", "not a url")]],
        };
        assert!(keyboard(&reply).is_none());
    }

    #[test]
    fn test_empty_keyboard_is_none() {
        let reply = Reply {
            text: "hi".to_string(),
            keyboard: vec![],
        };
        assert!(keyboard(&reply).is_none());
    }
}

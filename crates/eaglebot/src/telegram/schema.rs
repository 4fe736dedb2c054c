//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use eaglecore::registration::{prompts, Event};

use super::bot::Command;
use super::registration::{handle_callback, handle_event, handle_wizard_message, send_reply};
use super::search::handle_find_command;
use super::types::{HandlerDeps, HandlerError};

/// Creates the dispatcher schema for the bot.
///
/// Updates of one chat are handled in order (teloxide's default
/// distribution), so a user's wizard events never race each other.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");
                        send_reply(&bot, msg.chat.id, &prompts::welcome(first_name)).await?;
                    }
                    Command::Register => {
                        if let Some(user) = msg.from.as_ref() {
                            handle_event(&bot, &deps, msg.chat.id, user, Event::Start, None).await?;
                        }
                    }
                    Command::Cancel => {
                        if let Some(user) = msg.from.as_ref() {
                            handle_event(&bot, &deps, msg.chat.id, user, Event::Cancel, None).await?;
                        }
                    }
                    Command::Find(query) => {
                        handle_find_command(&bot, msg.chat.id, &deps.directory, &query).await?;
                    }
                    Command::Help => {
                        bot.send_message(msg.chat.id, Command::descriptions().to_string())
                            .await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Wizard answers: text and documents from users with a registration in progress
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            handle_wizard_message(&bot, &msg, &deps).await?;
            Ok(())
        }
    })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            handle_callback(&bot, &q, &deps).await?;
            Ok(())
        }
    })
}

//! `/find <keyword>`: contact cards of approved providers, and the
//! catalogues attached to them.

use std::path::PathBuf;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode};

use eaglecore::config::search::{MAX_RESULTS, MIN_QUERY_CHARS};
use eaglecore::registration::{prompts, Reply};
use eaglecore::storage::directory::{self, Provider};
use eaglecore::{AppResult, CatalogueStore, Directory};

use super::registration::send_reply;
use super::types::HandlerDeps;

/// Reply for `query`: a hint for queries that are too short, else the
/// best `MAX_RESULTS` visible providers.
pub async fn search_reply(store: &Directory, query: &str) -> AppResult<Reply> {
    let query = query.trim().to_string();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(prompts::search_query_too_short());
    }

    let needle = query.clone();
    let providers = store
        .run(move |conn| Ok(directory::search_providers(conn, &needle, MAX_RESULTS)?))
        .await?;
    log::info!("Search '{}' returned {} provider(s)", query, providers.len());

    Ok(prompts::search_results(&query, &providers))
}

pub async fn handle_find_command(bot: &Bot, chat_id: ChatId, store: &Directory, query: &str) -> ResponseResult<()> {
    match search_reply(store, query).await {
        Ok(reply) => {
            send_reply(bot, chat_id, &reply).await?;
        }
        Err(e) => {
            log::error!("Search '{}' failed: {}", query, e);
            bot.send_message(chat_id, "⚠️ Search is unavailable right now, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Stored catalogue of a provider that is listed in search and whose file
/// is still on disk.
pub async fn find_catalogue(
    store: &Directory,
    catalogues: &CatalogueStore,
    provider_id: i64,
) -> AppResult<Option<(Provider, PathBuf)>> {
    let provider = store
        .run(move |conn| Ok(directory::get_provider(conn, provider_id)?))
        .await?;
    let Some(provider) = provider.filter(Provider::is_visible) else {
        return Ok(None);
    };
    let Some(path) = provider
        .catalogue_path
        .as_deref()
        .and_then(|stored| catalogues.resolve(stored))
    else {
        return Ok(None);
    };

    let on_disk = tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
    if !on_disk {
        log::warn!("Catalogue of provider {} missing at {}", provider_id, path.display());
        return Ok(None);
    }
    Ok(Some((provider, path)))
}

/// "📄 Catalogue" button under search results
pub async fn handle_view_catalogue(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    provider_id: i64,
) -> ResponseResult<()> {
    match find_catalogue(&deps.directory, &deps.catalogues, provider_id).await {
        Ok(Some((provider, path))) => {
            log::info!("Sending catalogue of provider {} to chat {}", provider.id, chat_id);
            bot.send_document(
                chat_id,
                InputFile::file(path).file_name(CatalogueStore::download_name(&provider.name)),
            )
            .caption(prompts::catalogue_caption(&provider))
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }
        Ok(None) => {
            send_reply(bot, chat_id, &prompts::catalogue_unavailable()).await?;
        }
        Err(e) => {
            log::error!("Catalogue lookup for provider {} failed: {}", provider_id, e);
            send_reply(bot, chat_id, &prompts::catalogue_unavailable()).await?;
        }
    }
    Ok(())
}

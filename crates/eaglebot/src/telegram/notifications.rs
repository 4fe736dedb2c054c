//! Admin notifications about registrations and payments.
//!
//! Approval is manual: these messages are how the admin learns that a
//! provider is waiting for it. Disabled when ADMIN_CHAT_ID is unset.

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use eaglecore::config;
use eaglecore::core::utils::{escape_markdown_v2, format_naira};
use eaglecore::registration::{CompletedRegistration, FinalizeOutcome};
use eaglecore::storage::directory::Payment;

fn registration_text(
    user_id: i64,
    user: &str,
    registration: &CompletedRegistration,
    outcome: &FinalizeOutcome,
) -> Option<String> {
    let (provider_id, payment_line) = match outcome {
        FinalizeOutcome::AlreadyRegistered => return None,
        FinalizeOutcome::PaymentReady {
            provider_id, reference, ..
        } => (
            *provider_id,
            format!("Payment: pending, reference `{}`", escape_markdown_v2(reference)),
        ),
        FinalizeOutcome::PaymentUnavailable { provider_id, error, .. } => (
            *provider_id,
            format!("Payment: *not started* \\({}\\)", escape_markdown_v2(error)),
        ),
    };

    Some(format!(
        "🆕 *New provider registration*\n\n\
        Business: {}\n\
        Category: {}\n\
        Plan: {} \\({}\\)\n\
        From: {}\n\
        Provider ID: `{}`\n\
        {}\n\n\
        Approve with `eaglebot approve {}`",
        escape_markdown_v2(&registration.name),
        escape_markdown_v2(&registration.category_name),
        escape_markdown_v2(registration.plan.display_name()),
        escape_markdown_v2(&registration.plan.display_price()),
        escape_markdown_v2(user),
        provider_id,
        payment_line,
        user_id,
    ))
}

fn payment_text(payment: &Payment) -> String {
    format!(
        "💰 *Payment verified*\n\n\
        Reference: `{}`\n\
        Provider ID: `{}`\n\
        Plan: {}\n\
        Amount: {}\n\n\
        The provider is still waiting for approval\\.",
        escape_markdown_v2(&payment.reference),
        payment.provider_id,
        escape_markdown_v2(payment.plan.display_name()),
        escape_markdown_v2(&format_naira(payment.amount_minor)),
    )
}

async fn send_to_admin(bot: &Bot, text: String) {
    let Some(chat_id) = *config::ADMIN_CHAT_ID else {
        log::debug!("ADMIN_CHAT_ID not set, admin notification skipped");
        return;
    };

    if let Err(e) = bot
        .send_message(ChatId(chat_id), text)
        .parse_mode(ParseMode::MarkdownV2)
        .await
    {
        log::error!("Failed to send admin notification: {}", e);
    }
}

/// Tells the admin a provider registered and how to approve it.
pub async fn notify_admin_registration(
    bot: &Bot,
    user_id: i64,
    user: &str,
    registration: &CompletedRegistration,
    outcome: &FinalizeOutcome,
) {
    if let Some(text) = registration_text(user_id, user, registration, outcome) {
        send_to_admin(bot, text).await;
    }
}

pub async fn notify_admin_payment_verified(bot: &Bot, payment: &Payment) {
    send_to_admin(bot, payment_text(payment)).await;
}

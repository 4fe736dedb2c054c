//! Messages of the registration conversation, rendered without any
//! messaging-platform types.
//!
//! Text is MarkdownV2: every piece of user data goes through
//! `escape_markdown_v2`, only the markup added here is left raw.

use crate::core::config::validation::SUMMARY_DESCRIPTION_CHARS;
use crate::core::types::PlanTier;
use crate::core::utils::{escape_markdown_v2, format_naira, truncate_chars};
use crate::payment::reconciler::VerifyOutcome;
use crate::registration::callback::CallbackAction;
use crate::registration::draft::RegistrationDraft;
use crate::registration::machine::Step;
use crate::registration::validation::ValidationError;
use crate::storage::directory::{Payment, Provider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(CallbackAction),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: &str, action: CallbackAction) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::Callback(action),
        }
    }

    pub fn url(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::Url(url.to_string()),
        }
    }
}

/// One outgoing message: MarkdownV2 text plus inline keyboard rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    fn new(text: String, keyboard: Vec<Vec<Button>>) -> Self {
        Self { text, keyboard }
    }

    /// Every callback button of the keyboard, in order
    pub fn callbacks(&self) -> Vec<&CallbackAction> {
        self.keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.action {
                ButtonAction::Callback(action) => Some(action),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }
}

fn esc(text: &str) -> String {
    escape_markdown_v2(text)
}

fn bold(text: &str) -> String {
    format!("*{}*", esc(text))
}

fn italic(text: &str) -> String {
    format!("_{}_", esc(text))
}

fn code(text: &str) -> String {
    format!("`{}`", esc(text))
}

// ==================== keyboards ====================

fn cancel_button() -> Button {
    Button::callback("❌ Cancel", CallbackAction::CancelRegistration)
}

fn main_menu_row() -> Vec<Button> {
    vec![Button::callback("« Main Menu", CallbackAction::MainMenu)]
}

fn keyboard_for(step: Step) -> Vec<Vec<Button>> {
    match step {
        Step::SelectPlan => {
            let mut rows: Vec<Vec<Button>> = PlanTier::ALL
                .iter()
                .map(|plan| {
                    vec![Button::callback(
                        &format!("{} - {}", plan.display_name(), plan.display_price()),
                        CallbackAction::SelectPlan(*plan),
                    )]
                })
                .collect();
            rows.push(vec![cancel_button()]);
            rows
        }
        Step::Confirm => vec![
            vec![Button::callback("✅ Confirm & Submit", CallbackAction::ConfirmRegistration)],
            vec![cancel_button()],
        ],
        step if step.is_skippable() => vec![vec![
            Button::callback("⏭ Skip", CallbackAction::Skip(step)),
            cancel_button(),
        ]],
        _ => vec![vec![cancel_button()]],
    }
}

fn payment_keyboard(reference: &str, authorization_url: &str) -> Vec<Vec<Button>> {
    vec![
        vec![Button::url("💳 Pay Now", authorization_url)],
        vec![Button::callback(
            "✅ I've Paid — Verify",
            CallbackAction::VerifyPayment(reference.to_string()),
        )],
        main_menu_row(),
    ]
}

// ==================== wizard ====================

fn plan_perks(plan: PlanTier) -> &'static [&'static str] {
    match plan {
        PlanTier::Basic => &["Listed in search results"],
        PlanTier::Verified => &["✅ Verified badge (after review)", "Higher trust with customers"],
        PlanTier::Premium => &["⭐ Premium badge", "Top placement in search", "Hall of residence in your card"],
    }
}

fn plan_table() -> String {
    let mut text = format!("💰 {}\n", bold("REGISTRATION PLANS"));
    for plan in PlanTier::ALL {
        text.push_str(&format!("\n{} \\- {}\n", bold(plan.display_name()), esc(&plan.display_price())));
        for perk in plan_perks(plan) {
            text.push_str(&format!("• {}\n", esc(perk)));
        }
    }
    text
}

fn question(step: Step, draft: &RegistrationDraft) -> String {
    match step {
        Step::CollectName => format!(
            "📝 {}\n\n{}\n\nPlease enter your {}:\n\n{}",
            bold("PROVIDER REGISTRATION"),
            esc("Welcome! Let's get you registered on Purple Board."),
            bold("Business/Service Name"),
            italic("Example: \"Lash by Sarah\", \"TechDev Solutions\""),
        ),
        Step::CollectDescription => format!(
            "✅ Great\\! Your business name is: {}\n\nNow, enter a {} of your services:\n\n{}",
            bold(draft.name.as_deref().unwrap_or_default()),
            bold("short description"),
            italic("Example: 'Professional lash technician with 3 years experience. Specializing in classic and volume lashes.'"),
        ),
        Step::CollectKeywords => format!(
            "✅ Description saved\\!\n\nEnter {} for your service \\(comma\\-separated\\):\n\n{}\n\n{}",
            bold("keywords"),
            italic("Example: lash, beauty, makeup, volume lash"),
            esc("These help customers find you in search!"),
        ),
        Step::CollectPhone => format!(
            "✅ Keywords saved: {}\n\nYour category will be: {}\n\nNow enter your {}:\n\n{}",
            esc(&draft.keywords.join(", ")),
            bold(draft.category_name.as_deref().unwrap_or_default()),
            bold("phone number"),
            italic("Example: 08012345678"),
        ),
        Step::CollectTelegram => format!(
            "Enter your {} \\(without @\\):\n\n{}",
            bold("Telegram username"),
            italic("Example: yourname"),
        ),
        Step::CollectInstagram => format!(
            "Enter your {} \\(without @\\):\n\n{}",
            bold("Instagram username"),
            italic("Example: yourinstagram"),
        ),
        Step::CollectCatalogue => format!(
            "📄 {}\n\nPlease upload a {} with your work samples, pricing, or portfolio\\.\n\n{}",
            bold("CATALOGUE/PORTFOLIO"),
            bold("PDF"),
            italic("This helps customers learn more about your services!"),
        ),
        Step::SelectPlan => format!("{}\nSelect your plan:", plan_table()),
        Step::CollectHall => format!(
            "⭐ {}\n\nEnter your {}:\n\n{}",
            bold("PREMIUM PLAN SELECTED"),
            bold("Hall of Residence"),
            italic("This will be shown on your contact card."),
        ),
        Step::CollectEmail => format!(
            "📧 Enter your {}:\n\n{}",
            bold("email address"),
            italic("Your payment receipt will be sent here."),
        ),
        Step::Confirm => summary(draft),
    }
}

fn or_not_provided(value: Option<&str>) -> String {
    esc(value.unwrap_or("Not provided"))
}

/// Confirmation screen listing every answer of the draft
pub fn summary(draft: &RegistrationDraft) -> String {
    let description = draft.description.as_deref().unwrap_or_default();
    let mut shown = truncate_chars(description, SUMMARY_DESCRIPTION_CHARS);
    if shown.chars().count() < description.chars().count() {
        shown.push('…');
    }

    let mut text = format!("📋 {}\n\n", bold("REGISTRATION SUMMARY"));
    text.push_str(&format!("{} {}\n", bold("Name:"), esc(draft.name.as_deref().unwrap_or_default())));
    text.push_str(&format!("{} {}\n", bold("Description:"), esc(&shown)));
    text.push_str(&format!("{} {}\n", bold("Keywords:"), esc(&draft.keywords.join(", "))));
    text.push_str(&format!(
        "{} {}\n",
        bold("Category:"),
        esc(draft.category_name.as_deref().unwrap_or_default())
    ));
    text.push_str(&format!("{} {}\n", bold("Phone:"), or_not_provided(draft.phone.as_deref())));
    text.push_str(&format!(
        "{} {}\n",
        bold("Telegram:"),
        or_not_provided(draft.telegram_handle.as_deref())
    ));
    text.push_str(&format!(
        "{} {}\n",
        bold("Instagram:"),
        or_not_provided(draft.instagram_handle.as_deref())
    ));
    let catalogue = if draft.catalogue.is_some() {
        "✅ Uploaded"
    } else {
        "❌ Not uploaded"
    };
    text.push_str(&format!("{} {}\n", bold("Catalogue:"), catalogue));

    if let Some(plan) = draft.plan {
        text.push_str(&format!(
            "{} {} \\- {}\n",
            bold("Plan:"),
            esc(plan.display_name()),
            esc(&plan.display_price())
        ));
        if plan.is_top_tier() {
            text.push_str(&format!(
                "{} {}\n",
                bold("Hall:"),
                or_not_provided(draft.hall_of_residence.as_deref())
            ));
        }
    }
    text.push_str(&format!("{} {}\n", bold("Email:"), esc(draft.email.as_deref().unwrap_or_default())));

    text.push_str(&format!(
        "\n⚠️ {}\n{}",
        bold("Please pay to complete registration:"),
        italic("Payment details will be sent after confirmation.")
    ));
    text
}

pub fn ask(step: Step, draft: &RegistrationDraft) -> Reply {
    Reply::new(question(step, draft), keyboard_for(step))
}

/// The error, then the same question again
pub fn rejected(step: Step, error: ValidationError, draft: &RegistrationDraft) -> Reply {
    Reply::new(
        format!("{}\n\n{}", esc(&error.to_string()), question(step, draft)),
        keyboard_for(step),
    )
}

pub fn cancelled() -> Reply {
    Reply::new(
        format!("❌ Registration cancelled\\.\n\n{}", esc("You can start again anytime!")),
        vec![main_menu_row()],
    )
}

pub fn session_expired() -> Reply {
    Reply::new(
        format!(
            "⌛ {}\n\n{}",
            esc("Your registration session has expired or was already completed."),
            esc("Tap below to start a new registration.")
        ),
        vec![
            vec![Button::callback("📝 Register as a provider", CallbackAction::StartRegistration)],
            main_menu_row(),
        ],
    )
}

pub fn welcome(first_name: &str) -> Reply {
    Reply::new(
        format!(
            "👋 Hi {}\\! Welcome to {}\\.\n\n{}\n\n{}",
            esc(first_name),
            bold("Eagles View"),
            esc("💜 Purple Board is the campus directory of student service providers. Use /find <keyword> to search it."),
            esc("Offer a service? Register and get listed.")
        ),
        vec![vec![Button::callback(
            "📝 Register as a provider",
            CallbackAction::StartRegistration,
        )]],
    )
}

// ==================== finalize ====================

pub fn already_registered() -> Reply {
    Reply::new(
        format!(
            "❌ You are already registered\\!\n\n{}",
            esc("Contact an admin if you need to update your profile.")
        ),
        vec![main_menu_row()],
    )
}

pub fn registration_error() -> Reply {
    Reply::new(
        format!(
            "⚠️ {}\n\n{}",
            esc("Something went wrong while saving your registration."),
            esc("Your answers are kept, please tap Confirm again in a moment.")
        ),
        keyboard_for(Step::Confirm),
    )
}

pub fn payment_ready(plan: PlanTier, reference: &str, authorization_url: &str) -> Reply {
    Reply::new(
        format!(
            "✅ {}\n\nYour {} registration has been received\\.\n\n💰 {} {}\n🧾 {} {}\n\n{}\n\n{}",
            bold("REGISTRATION SUBMITTED!"),
            esc(plan.display_name()),
            bold("Amount to pay:"),
            esc(&plan.display_price()),
            bold("Reference:"),
            code(reference),
            esc("Tap \"Pay Now\" to pay securely with Paystack, then tap \"I've Paid\" to confirm."),
            italic("Your profile will be visible once approved."),
        ),
        payment_keyboard(reference, authorization_url),
    )
}

pub fn payment_unavailable(plan: PlanTier, error: &str) -> Reply {
    Reply::new(
        format!(
            "✅ {}\n\nYour {} registration has been saved, but the payment could not be started:\n{}\n\n📱 {}\n{}\n\n{}",
            bold("REGISTRATION SUBMITTED!"),
            esc(plan.display_name()),
            italic(error),
            bold("Payment Instructions:"),
            esc(&format!(
                "Please contact the admin to complete payment ({}) and activation.",
                plan.display_price()
            )),
            italic("Your profile will be visible once approved."),
        ),
        vec![main_menu_row()],
    )
}

// ==================== verification ====================

fn amount_line(payment: &Payment) -> String {
    format!(
        "{} {}\n{} {}",
        bold("Amount:"),
        esc(&format_naira(payment.amount_minor)),
        bold("Reference:"),
        code(&payment.reference)
    )
}

pub fn verify_outcome(outcome: &VerifyOutcome) -> Reply {
    match outcome {
        VerifyOutcome::NotFound => Reply::new(
            format!(
                "❌ {}\n\n{}",
                esc("Payment not found."),
                esc("Please contact an admin with your payment reference.")
            ),
            vec![main_menu_row()],
        ),
        VerifyOutcome::AlreadyVerified(payment) => Reply::new(
            format!(
                "✅ {}\n\n{}\n\n{}",
                bold("Payment already verified!"),
                amount_line(payment),
                italic("Your profile will be visible once an admin approves it.")
            ),
            vec![main_menu_row()],
        ),
        VerifyOutcome::Verified(payment) => Reply::new(
            format!(
                "🎉 {}\n\n{}\n\n{}",
                bold("PAYMENT SUCCESSFUL!"),
                amount_line(payment),
                italic("Thank you! Your profile will be visible once an admin approves it.")
            ),
            vec![main_menu_row()],
        ),
        VerifyOutcome::Failed(payment) => Reply::new(
            format!(
                "❌ {}\n\n{}\n\n{}",
                bold("Payment failed or was abandoned."),
                amount_line(payment),
                esc("You can try again with the same payment link, then tap verify.")
            ),
            payment_keyboard(&payment.reference, &payment.authorization_url),
        ),
        VerifyOutcome::Pending { payment, gateway_error } => {
            let reason = if gateway_error.is_some() {
                "We could not reach the payment provider right now."
            } else {
                "Your payment has not been confirmed yet."
            };
            Reply::new(
                format!(
                    "⏳ {}\n\n{}\n\n{}",
                    bold(reason),
                    amount_line(payment),
                    esc("If you have paid, wait a moment and tap verify again.")
                ),
                payment_keyboard(&payment.reference, &payment.authorization_url),
            )
        }
    }
}

/// The payment record could not be read; nothing was changed.
pub fn verify_unavailable(reference: &str) -> Reply {
    Reply::new(
        format!(
            "⚠️ {}\n\n{} {}",
            esc("We could not check your payment right now. Please try again in a moment."),
            bold("Reference:"),
            code(reference)
        ),
        vec![
            vec![Button::callback(
                "🔄 Check again",
                CallbackAction::VerifyPayment(reference.to_string()),
            )],
            main_menu_row(),
        ],
    )
}

// ==================== directory ====================

/// Contact card shown in search results. The hall of residence is a
/// top-tier perk.
pub fn contact_card(provider: &Provider) -> String {
    let mut lines = Vec::new();
    let title = match provider.plan.badge() {
        Some(badge) => format!("📋 {} {}", bold(&provider.name), badge),
        None => format!("📋 {}", bold(&provider.name)),
    };
    lines.push(title);
    lines.push(format!("📝 {}", esc(&provider.description)));

    if !provider.phone.is_empty() {
        lines.push(format!("📞 {}", esc(&provider.phone)));
    }
    if !provider.telegram_handle.is_empty() {
        lines.push(format!("💬 {}", esc(&provider.telegram_handle)));
    }
    if !provider.instagram_handle.is_empty() {
        lines.push(format!("📸 {}", esc(&provider.instagram_handle)));
    }
    if provider.plan.is_top_tier() && !provider.hall_of_residence.is_empty() {
        lines.push(format!("🏠 {}", esc(&provider.hall_of_residence)));
    }

    lines.join("\n")
}

pub fn search_query_too_short() -> Reply {
    Reply::new(
        format!(
            "🔍 {}\n\n{}",
            esc("Please enter at least 2 characters to search."),
            italic("Example: /find lash")
        ),
        vec![],
    )
}

pub fn search_results(query: &str, providers: &[Provider]) -> Reply {
    if providers.is_empty() {
        return Reply::new(
            format!(
                "🔍 No providers found for {}\n\n{}",
                bold(query),
                esc("Try a different keyword!")
            ),
            vec![],
        );
    }

    let cards: Vec<String> = providers.iter().map(contact_card).collect();
    let catalogue_rows = providers
        .iter()
        .filter(|provider| provider.catalogue_path.is_some())
        .map(|provider| {
            vec![Button::callback(
                &format!("📄 {} Catalogue", provider.name),
                CallbackAction::ViewCatalogue(provider.id),
            )]
        })
        .collect();
    Reply::new(
        format!(
            "🔍 Results for {}\n{}\n\n{}",
            bold(query),
            esc(&format!("{} provider(s) found", providers.len())),
            cards.join("\n\n")
        ),
        catalogue_rows,
    )
}

pub fn catalogue_caption(provider: &Provider) -> String {
    format!("📄 Catalogue for {}", bold(&provider.name))
}

pub fn catalogue_unavailable() -> Reply {
    Reply::new(
        format!("📄 {}", esc("This catalogue is no longer available.")),
        vec![],
    )
}

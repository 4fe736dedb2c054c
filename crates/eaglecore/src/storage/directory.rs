//! Provider directory storage: categories, providers and payments.
//!
//! Every cross-session race is settled by a UNIQUE constraint rather than a
//! lock: `categories.name`, `providers.telegram_user_id` and
//! `payments.reference`. The functions here translate a violated constraint
//! into an explicit outcome value so callers never have to inspect SQLite
//! error codes.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::core::error::{AppError, AppResult};
use crate::core::types::{PaymentStatus, PlanTier};
use crate::core::utils::slugify;

/// Provider category, created on first use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Parameters for saving a new provider
#[derive(Debug)]
pub struct NewProvider<'a> {
    pub telegram_user_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub keywords: &'a [String],
    pub category_id: Option<i64>,
    pub plan: PlanTier,
    pub phone: Option<&'a str>,
    pub telegram_handle: Option<&'a str>,
    pub instagram_handle: Option<&'a str>,
    pub hall_of_residence: Option<&'a str>,
    pub email: &'a str,
}

/// A stored provider
#[derive(Debug, Clone)]
pub struct Provider {
    pub id: i64,
    pub telegram_user_id: i64,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub plan: PlanTier,
    pub phone: String,
    pub telegram_handle: String,
    pub instagram_handle: String,
    pub hall_of_residence: String,
    pub email: String,
    pub catalogue_path: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Provider {
    /// Listed in search only once an admin approved it and it is active
    pub fn is_visible(&self) -> bool {
        self.is_approved && self.is_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderInsert {
    Created(i64),
    /// The user already owns a provider record
    AlreadyRegistered,
}

/// Parameters for saving a new payment
#[derive(Debug)]
pub struct NewPayment<'a> {
    pub reference: &'a str,
    pub provider_id: i64,
    pub amount_minor: i64,
    pub plan: PlanTier,
    pub authorization_url: &'a str,
    pub gateway_response: Option<&'a serde_json::Value>,
}

/// A stored payment
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i64,
    pub reference: String,
    pub provider_id: i64,
    pub amount_minor: i64,
    pub plan: PlanTier,
    pub authorization_url: String,
    pub status: PaymentStatus,
    pub gateway_response: Option<String>,
    pub created_at: String,
    pub verified_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentInsert {
    Created(i64),
    DuplicateReference,
}

/// Name of the UNIQUE column a failed statement collided with, if any.
fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            message.strip_prefix("UNIQUE constraint failed: ")
        }
        _ => None,
    }
}

// ==================== categories ====================

pub fn get_category_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, slug FROM categories WHERE name = ?1",
        params![name],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Looks a category up by name and creates it when missing.
///
/// Two registrations deriving the same name at the same time both end up
/// with the single row the UNIQUE(name) constraint allows. When a different
/// name maps onto a taken slug ("Lash Art" vs "Lash-Art") the slug gets a
/// numeric suffix.
pub fn get_or_create_category(conn: &Connection, name: &str) -> AppResult<Category> {
    if let Some(existing) = get_category_by_name(conn, name)? {
        return Ok(existing);
    }

    let base_slug = slugify(name);
    for attempt in 0..20 {
        let slug = if attempt == 0 {
            base_slug.clone()
        } else {
            format!("{}-{}", base_slug, attempt + 1)
        };

        match conn.execute(
            "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        ) {
            Ok(_) => {
                log::info!("Created category '{}' (slug '{}')", name, slug);
                return Ok(Category {
                    id: conn.last_insert_rowid(),
                    name: name.to_string(),
                    slug,
                });
            }
            Err(err) => match unique_violation(&err) {
                Some("categories.name") => {
                    // Lost the race to a concurrent registration
                    return get_category_by_name(conn, name)?
                        .ok_or_else(|| AppError::Corrupt(format!("category '{}' vanished after conflict", name)));
                }
                Some("categories.slug") => continue,
                _ => return Err(err.into()),
            },
        }
    }

    Err(AppError::Corrupt(format!("no free slug for category '{}'", name)))
}

// ==================== providers ====================

const PROVIDER_COLUMNS: &str = "p.id, p.telegram_user_id, p.name, p.description, p.keywords, p.category_id, c.name,
     p.plan_type, p.phone, p.telegram_handle, p.instagram_handle, p.hall_of_residence, p.email,
     p.catalogue_path, p.is_approved, p.is_active, p.created_at, p.updated_at";

fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<Provider> {
    let keywords_json: String = row.get(4)?;
    let keywords = serde_json::from_str(&keywords_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Provider {
        id: row.get(0)?,
        telegram_user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        keywords,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        plan: row.get(7)?,
        phone: row.get(8)?,
        telegram_handle: row.get(9)?,
        instagram_handle: row.get(10)?,
        hall_of_residence: row.get(11)?,
        email: row.get(12)?,
        catalogue_path: row.get(13)?,
        is_approved: row.get(14)?,
        is_active: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

pub fn provider_exists(conn: &Connection, telegram_user_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM providers WHERE telegram_user_id = ?1)",
        params![telegram_user_id],
        |row| row.get(0),
    )
}

/// Saves a new provider. Always unapproved and active.
///
/// A second row for the same Telegram user is rejected by the UNIQUE
/// constraint and reported as `AlreadyRegistered`, whatever the interleaving
/// with the earlier `provider_exists` check was.
pub fn insert_provider(conn: &Connection, provider: &NewProvider<'_>) -> AppResult<ProviderInsert> {
    let keywords = serde_json::to_string(provider.keywords)?;

    let result = conn.execute(
        "INSERT INTO providers (
            telegram_user_id, name, description, keywords, category_id, plan_type,
            phone, telegram_handle, instagram_handle, hall_of_residence, email,
            is_approved, is_active
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, 1)",
        params![
            provider.telegram_user_id,
            provider.name,
            provider.description,
            keywords,
            provider.category_id,
            provider.plan,
            provider.phone.unwrap_or_default(),
            provider.telegram_handle.unwrap_or_default(),
            provider.instagram_handle.unwrap_or_default(),
            provider.hall_of_residence.unwrap_or_default(),
            provider.email,
        ],
    );

    match result {
        Ok(_) => Ok(ProviderInsert::Created(conn.last_insert_rowid())),
        Err(err) if unique_violation(&err) == Some("providers.telegram_user_id") => {
            Ok(ProviderInsert::AlreadyRegistered)
        }
        Err(err) => Err(err.into()),
    }
}

/// Saves a provider together with its category in one transaction.
///
/// Nothing is written when the user is already registered: a category
/// created for the rejected attempt is rolled back with it. The write lock is
/// taken up front so concurrent registrations queue on `busy_timeout`.
pub fn create_provider(conn: &Connection, category_name: &str, provider: &NewProvider<'_>) -> AppResult<ProviderInsert> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    if provider_exists(&tx, provider.telegram_user_id)? {
        return Ok(ProviderInsert::AlreadyRegistered);
    }

    let category = get_or_create_category(&tx, category_name)?;
    let inserted = insert_provider(
        &tx,
        &NewProvider {
            category_id: Some(category.id),
            ..*provider
        },
    )?;

    if let ProviderInsert::Created(_) = inserted {
        tx.commit()?;
    }
    Ok(inserted)
}

pub fn set_catalogue_path(conn: &Connection, provider_id: i64, path: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE providers SET catalogue_path = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        params![path, provider_id],
    )?;
    Ok(())
}

pub fn get_provider(conn: &Connection, provider_id: i64) -> rusqlite::Result<Option<Provider>> {
    let sql = format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers p LEFT JOIN categories c ON c.id = p.category_id WHERE p.id = ?1"
    );
    conn.query_row(&sql, params![provider_id], provider_from_row).optional()
}

pub fn get_provider_by_user(conn: &Connection, telegram_user_id: i64) -> rusqlite::Result<Option<Provider>> {
    let sql = format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers p LEFT JOIN categories c ON c.id = p.category_id
         WHERE p.telegram_user_id = ?1"
    );
    conn.query_row(&sql, params![telegram_user_id], provider_from_row)
        .optional()
}

/// Back-office switch; payment never flips this on its own.
///
/// Returns `false` when the user has no provider record.
pub fn set_provider_approval(conn: &Connection, telegram_user_id: i64, approved: bool) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE providers SET is_approved = ?1, updated_at = CURRENT_TIMESTAMP WHERE telegram_user_id = ?2",
        params![approved, telegram_user_id],
    )?;
    Ok(updated > 0)
}

pub fn set_provider_active(conn: &Connection, telegram_user_id: i64, active: bool) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE providers SET is_active = ?1, updated_at = CURRENT_TIMESTAMP WHERE telegram_user_id = ?2",
        params![active, telegram_user_id],
    )?;
    Ok(updated > 0)
}

/// `CASE` expression giving `p.plan_type` its `PlanTier::rank`
fn plan_rank_sql() -> String {
    let arms: String = PlanTier::ALL
        .iter()
        .map(|plan| format!(" WHEN '{}' THEN {}", plan.as_str(), plan.rank()))
        .collect();
    format!("CASE p.plan_type{} ELSE 0 END", arms)
}

/// Visible providers matching `query` in name, description, keywords or
/// category, highest tier first, then newest.
pub fn search_providers(conn: &Connection, query: &str, limit: usize) -> rusqlite::Result<Vec<Provider>> {
    let needle = query.trim().to_lowercase();
    let rank = plan_rank_sql();
    let sql = format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers p LEFT JOIN categories c ON c.id = p.category_id
         WHERE p.is_approved = 1 AND p.is_active = 1
           AND (instr(lower(p.name), ?1) > 0
                OR instr(lower(p.description), ?1) > 0
                OR instr(lower(p.keywords), ?1) > 0
                OR instr(lower(COALESCE(c.name, '')), ?1) > 0)
         ORDER BY {rank} DESC,
                  p.created_at DESC, p.id DESC
         LIMIT ?2"
    );

    let mut stmt = conn.prepare(&sql)?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let providers = stmt
        .query_map(params![needle, limit], provider_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(providers)
}

// ==================== payments ====================

const PAYMENT_COLUMNS: &str = "id, reference, provider_id, amount, plan_type, authorization_url, status,
     gateway_response, created_at, verified_at";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        reference: row.get(1)?,
        provider_id: row.get(2)?,
        amount_minor: row.get(3)?,
        plan: row.get(4)?,
        authorization_url: row.get(5)?,
        status: row.get(6)?,
        gateway_response: row.get(7)?,
        created_at: row.get(8)?,
        verified_at: row.get(9)?,
    })
}

pub fn payment_reference_exists(conn: &Connection, reference: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM payments WHERE reference = ?1)",
        params![reference],
        |row| row.get(0),
    )
}

/// Saves a new PENDING payment.
pub fn insert_payment(conn: &Connection, payment: &NewPayment<'_>) -> AppResult<PaymentInsert> {
    let raw = payment.gateway_response.map(serde_json::to_string).transpose()?;

    let result = conn.execute(
        "INSERT INTO payments (reference, provider_id, amount, plan_type, authorization_url, status, gateway_response)
         VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', ?6)",
        params![
            payment.reference,
            payment.provider_id,
            payment.amount_minor,
            payment.plan,
            payment.authorization_url,
            raw,
        ],
    );

    match result {
        Ok(_) => Ok(PaymentInsert::Created(conn.last_insert_rowid())),
        Err(err) if unique_violation(&err) == Some("payments.reference") => Ok(PaymentInsert::DuplicateReference),
        Err(err) => Err(err.into()),
    }
}

pub fn get_payment(conn: &Connection, reference: &str) -> rusqlite::Result<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = ?1");
    conn.query_row(&sql, params![reference], payment_from_row).optional()
}

pub fn payments_for_provider(conn: &Connection, provider_id: i64) -> rusqlite::Result<Vec<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_id = ?1 ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let payments = stmt
        .query_map(params![provider_id], payment_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(payments)
}

/// Stores the outcome of a gateway verification.
///
/// A SUCCESS row is never touched again, so a late FAILED answer cannot
/// regress it. `verified_at` is stamped only when the new status is SUCCESS.
/// Returns `false` when nothing was updated.
pub fn update_payment_status(
    conn: &Connection,
    reference: &str,
    status: PaymentStatus,
    gateway_response: &serde_json::Value,
) -> AppResult<bool> {
    let raw = serde_json::to_string(gateway_response)?;
    let updated = conn.execute(
        "UPDATE payments
         SET status = ?1,
             gateway_response = ?2,
             verified_at = CASE WHEN ?1 = 'SUCCESS' THEN CURRENT_TIMESTAMP ELSE verified_at END
         WHERE reference = ?3 AND status <> 'SUCCESS'",
        params![status, raw, reference],
    )?;
    Ok(updated > 0)
}

//! Staff profiles under `users/<uid>`.
//!
//! Accounts live in the [`AccountService`]; the store only holds the profile
//! (email, role). Deleting a profile leaves the account untouched.

use chrono::Utc;
use ssb_reconcile::{records_match, Collection};
use ssb_schemas::{collections, UserProfile, ROLE_ADMIN, ROLE_USER};
use ssb_store::record_path;
use tracing::info;

use crate::{decode_collection, to_record, AccountService, InventoryError, LiveStore};

pub async fn list_users(store: &dyn LiveStore) -> Result<Collection<UserProfile>, InventoryError> {
    let snap = store.read_once(collections::USERS).await?;
    Ok(decode_collection(collections::USERS, snap))
}

/// Create the account, then its profile. Returns `(uid, profile)`.
///
/// `password` of `None` uses `initial_password` (the configured first-login
/// password). A role other than `admin` is stored as `user`. A profile that
/// already carries the email is rewritten in place and keeps its `createdAt`,
/// so re-provisioning an account never adds a second profile.
pub async fn create_user(
    store: &dyn LiveStore,
    accounts: &dyn AccountService,
    email: &str,
    password: Option<&str>,
    initial_password: &str,
    role: &str,
) -> Result<(String, UserProfile), InventoryError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(InventoryError::validation("L'adresse e-mail est obligatoire."));
    }
    let password = password.filter(|p| !p.is_empty()).unwrap_or(initial_password);

    let identity = accounts.create_account(email, password).await?;

    let existing = list_users(store)
        .await?
        .into_iter()
        .find(|(_, p)| records_match(&p.email, &identity.email));
    let (uid, created_at) = match existing {
        Some((id, p)) => {
            info!(uid = %id, "reusing existing user profile");
            (id, p.created_at.unwrap_or_else(Utc::now))
        }
        None => (identity.uid, Utc::now()),
    };

    let profile = UserProfile {
        email: identity.email,
        role: if role.trim().eq_ignore_ascii_case(ROLE_ADMIN) {
            ROLE_ADMIN.to_string()
        } else {
            ROLE_USER.to_string()
        },
        created_at: Some(created_at),
    };
    let path = record_path(collections::USERS, &uid);
    store.write_record(&path, to_record(&profile)?).await?;

    info!(uid = %uid, role = %profile.role, "user created");
    Ok((uid, profile))
}

pub async fn delete_user(store: &dyn LiveStore, uid: &str) -> Result<(), InventoryError> {
    let path = record_path(collections::USERS, uid);
    if store.read_record(&path).await?.is_none() {
        return Err(InventoryError::not_found(collections::USERS, uid));
    }
    store.delete_record(&path).await?;
    info!(uid = %uid, "user profile deleted");
    Ok(())
}

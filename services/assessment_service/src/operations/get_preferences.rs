use std::convert::Infallible;

use service_core::{EndpointError, Principal};

use crate::domain::NotificationPreferences;
use crate::repository::PreferencesRepository;

type Error = EndpointError<Infallible>;

/// The caller's stored preferences, or the defaults when none were ever saved. Reading never
/// creates a row.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn get_preferences(
    repo: &impl PreferencesRepository,
    principal: &Principal,
) -> Result<NotificationPreferences, Error> {
    let stored = repo
        .preferences(principal.user_id())
        .await
        .map_err(service_core::simple_err_map!("Loading preferences failed.", Error::internal()))?;

    Ok(stored.unwrap_or_else(|| NotificationPreferences::defaults_for(principal.user_id())))
}

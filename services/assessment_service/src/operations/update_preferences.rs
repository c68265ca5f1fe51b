use std::convert::Infallible;

use chrono::Utc;
use service_core::{EndpointError, Principal};

use crate::domain::{NotificationPreferences, PreferencesPatch};
use crate::repository::PreferencesRepository;

type Error = EndpointError<Infallible>;

/// Writes only the fields set in `patch`, creating the row with defaults first if needed.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn update_preferences(
    repo: &impl PreferencesRepository,
    principal: &Principal,
    patch: PreferencesPatch,
) -> Result<NotificationPreferences, Error> {
    let user_id = principal.user_id();

    repo.ensure_preferences(user_id)
        .await
        .map_err(service_core::simple_err_map!("Creating preferences failed.", Error::internal()))?;

    let changes = patch.changes();
    if !changes.is_empty() {
        repo.apply_changes(user_id, &changes, Utc::now())
            .await
            .map_err(service_core::simple_err_map!("Updating preferences failed.", Error::internal()))?;
    }

    repo.preferences(user_id)
        .await
        .map_err(service_core::simple_err_map!("Reloading preferences failed.", Error::internal()))?
        .ok_or_else(|| {
            tracing::error!("Preferences row vanished after update.");
            Error::internal()
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::operations::test_support::{world, World};

    fn patch(value: serde_json::Value) -> PreferencesPatch {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[tokio::test]
    async fn first_update_starts_from_defaults(world: World) {
        let prefs = update_preferences(&world.store, &world.student, patch(json!({"sms_enabled": false})))
            .await
            .unwrap();

        assert!(!prefs.sms_enabled);
        assert!(prefs.session_reminders && prefs.homework_alerts && prefs.payment_alerts && prefs.marketing);
        assert!(prefs.updated_at.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn untouched_fields_keep_earlier_values(world: World) {
        update_preferences(
            &world.store,
            &world.student,
            patch(json!({"marketing": false, "quiet_hours_start": "22:00:00", "quiet_hours_end": "07:00:00"})),
        )
        .await
        .unwrap();
        let prefs = update_preferences(&world.store, &world.student, patch(json!({"sms_enabled": false})))
            .await
            .unwrap();

        assert!(!prefs.marketing);
        assert!(!prefs.sms_enabled);
        assert!(prefs.homework_alerts);
        assert_eq!(prefs.quiet_hours_start, NaiveTime::from_hms_opt(22, 0, 0));
        assert_eq!(prefs.quiet_hours_end, NaiveTime::from_hms_opt(7, 0, 0));
    }

    #[rstest]
    #[tokio::test]
    async fn empty_patch_creates_default_row(world: World) {
        let prefs = update_preferences(&world.store, &world.parent, PreferencesPatch::default())
            .await
            .unwrap();

        assert!(prefs.marketing && prefs.sms_enabled);
        assert_eq!(prefs.updated_at, None);
        assert!(world.store.preferences(world.parent.user_id()).await.unwrap().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn users_do_not_share_preferences(world: World) {
        update_preferences(&world.store, &world.student, patch(json!({"homework_alerts": false})))
            .await
            .unwrap();

        let other = update_preferences(&world.store, &world.classmate, PreferencesPatch::default())
            .await
            .unwrap();
        assert!(other.homework_alerts);
    }
}

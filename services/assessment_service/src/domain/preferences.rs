use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub session_reminders: bool,
    pub homework_alerts: bool,
    pub payment_alerts: bool,
    pub marketing: bool,
    pub sms_enabled: bool,
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationPreferences {
    /// What a user gets before ever saving preferences. Never persisted by reads.
    pub fn defaults_for(user_id: Uuid) -> Self {
        NotificationPreferences {
            user_id,
            session_reminders: true,
            homework_alerts: true,
            payment_alerts: true,
            marketing: true,
            sms_enabled: true,
            quiet_hours_start: None,
            quiet_hours_end: None,
            updated_at: None,
        }
    }
}

/// A partial update: only the fields that are set get written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub session_reminders: Option<bool>,
    #[serde(default)]
    pub homework_alerts: Option<bool>,
    #[serde(default)]
    pub payment_alerts: Option<bool>,
    #[serde(default)]
    pub marketing: Option<bool>,
    #[serde(default)]
    pub sms_enabled: Option<bool>,
    #[serde(default)]
    pub quiet_hours_start: Option<NaiveTime>,
    #[serde(default)]
    pub quiet_hours_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceColumn {
    SessionReminders,
    HomeworkAlerts,
    PaymentAlerts,
    Marketing,
    SmsEnabled,
    QuietHoursStart,
    QuietHoursEnd,
}

impl PreferenceColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::SessionReminders => "session_reminders",
            Self::HomeworkAlerts => "homework_alerts",
            Self::PaymentAlerts => "payment_alerts",
            Self::Marketing => "marketing",
            Self::SmsEnabled => "sms_enabled",
            Self::QuietHoursStart => "quiet_hours_start",
            Self::QuietHoursEnd => "quiet_hours_end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceValue {
    Flag(bool),
    Time(NaiveTime),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceChange {
    pub column: PreferenceColumn,
    pub value: PreferenceValue,
}

impl PreferencesPatch {
    /// The `(column, value)` pairs to write, in column order.
    pub fn changes(&self) -> Vec<PreferenceChange> {
        use PreferenceColumn::*;

        let flags = [
            (SessionReminders, self.session_reminders),
            (HomeworkAlerts, self.homework_alerts),
            (PaymentAlerts, self.payment_alerts),
            (Marketing, self.marketing),
            (SmsEnabled, self.sms_enabled),
        ];
        let times = [
            (QuietHoursStart, self.quiet_hours_start),
            (QuietHoursEnd, self.quiet_hours_end),
        ];

        let flags = flags.into_iter().filter_map(|(column, value)| {
            value.map(|v| PreferenceChange {
                column,
                value: PreferenceValue::Flag(v),
            })
        });
        let times = times.into_iter().filter_map(|(column, value)| {
            value.map(|v| PreferenceChange {
                column,
                value: PreferenceValue::Time(v),
            })
        });

        flags.chain(times).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }
}

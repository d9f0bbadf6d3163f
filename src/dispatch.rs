use serde::Deserialize;
use uuid::Uuid;

pub const TAG_NORMAL: &str = "normal";
pub const TAG_REMIND: &str = "remind";

pub const NOTIFICATION_ID_REMIND: u32 = 12423;
pub const NOTIFICATION_ID_NORMAL: u32 = 43900;

/// Presentation defaults carried on every rendered notification. Product
/// choices, not protocol: renderers are free to ignore them.
pub const VIBRATION_PATTERN_MILLIS: [u64; 5] = [1000, 500, 200, 500, 1000];
pub const LIGHT_COLOR_ARGB: u32 = 0xFF00_FF00;

/// One inbound push, alive only for the duration of its handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEnvelope {
    pub text: String,
    pub url: Option<String>,
    pub message_uuid: Uuid,
    pub tags: Vec<String>,
}

#[derive(Debug)]
pub enum PayloadError {
    Malformed(String),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Malformed(message) => write!(f, "malformed push payload: {message}"),
        }
    }
}

impl std::error::Error for PayloadError {}

#[derive(Deserialize)]
struct RawPayload {
    text: String,
    url: Option<String>,
    uuid: String,
    tags: Option<String>,
}

impl NotificationEnvelope {
    /// Parses one inbound push payload. The `tags` field holds a JSON array
    /// serialized as a string, a quirk of the wire format.
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let raw: RawPayload = serde_json::from_str(payload)
            .map_err(|err| PayloadError::Malformed(err.to_string()))?;
        let message_uuid = Uuid::parse_str(&raw.uuid)
            .map_err(|err| PayloadError::Malformed(format!("invalid message uuid: {err}")))?;
        let tags = match raw.tags {
            Some(encoded) => serde_json::from_str(&encoded)
                .map_err(|err| PayloadError::Malformed(format!("invalid tags array: {err}")))?,
            None => Vec::new(),
        };
        Ok(Self {
            text: raw.text,
            url: raw.url,
            message_uuid,
            tags,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Normal,
    Remind,
}

impl NotificationCategory {
    /// Fixed per-category identifier: a new notification replaces the
    /// previous one of the same category only.
    pub fn notification_id(self) -> u32 {
        match self {
            NotificationCategory::Normal => NOTIFICATION_ID_NORMAL,
            NotificationCategory::Remind => NOTIFICATION_ID_REMIND,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_NORMAL => Some(NotificationCategory::Normal),
            TAG_REMIND => Some(NotificationCategory::Remind),
            _ => None,
        }
    }
}

/// Classifies an envelope by its tag set. More than one tag is a protocol
/// violation: the notification is logged and dropped, never surfaced. A
/// single unrecognized tag drops it quietly as well.
pub fn classify(tags: &[String]) -> Option<NotificationCategory> {
    match tags {
        [] => Some(NotificationCategory::Normal),
        [tag] => {
            let category = NotificationCategory::from_tag(tag);
            if category.is_none() {
                log::debug!("dropping push notification with unrecognized tag '{tag}'");
            }
            category
        }
        _ => {
            log::error!("more than one tag in the push notification, dropping it");
            None
        }
    }
}

/// What a renderer is asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub vibration_pattern: &'static [u64],
    pub light_color: u32,
}

/// The platform notification seam: the demo binary prints, a real embedder
/// talks to the OS notification service.
pub trait NotificationRenderer {
    /// Shows `notification` under `id`, replacing anything previously shown
    /// under the same id.
    fn show(&self, id: u32, notification: &LocalNotification);
}

pub struct NotificationDispatcher<R> {
    app_name: String,
    renderer: R,
}

impl<R: NotificationRenderer> NotificationDispatcher<R> {
    pub fn new(app_name: &str, renderer: R) -> Self {
        Self {
            app_name: app_name.to_string(),
            renderer,
        }
    }

    /// Parses and dispatches one inbound payload, returning the category it
    /// was rendered under, or `None` when it was dropped.
    pub fn dispatch(&self, payload: &str) -> Result<Option<NotificationCategory>, PayloadError> {
        let envelope = NotificationEnvelope::parse(payload)?;
        Ok(self.dispatch_envelope(&envelope))
    }

    pub fn dispatch_envelope(&self, envelope: &NotificationEnvelope) -> Option<NotificationCategory> {
        let category = classify(&envelope.tags)?;
        let notification = LocalNotification {
            title: self.app_name.clone(),
            body: envelope.text.clone(),
            url: envelope.url.clone(),
            vibration_pattern: &VIBRATION_PATTERN_MILLIS,
            light_color: LIGHT_COLOR_ARGB,
        };
        self.renderer.show(category.notification_id(), &notification);
        Some(category)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct TestRenderer {
        shown: Arc<Mutex<Vec<(u32, LocalNotification)>>>,
    }

    impl NotificationRenderer for TestRenderer {
        fn show(&self, id: u32, notification: &LocalNotification) {
            self.shown
                .lock()
                .expect("shown lock")
                .push((id, notification.clone()));
        }
    }

    fn dispatcher(renderer: &TestRenderer) -> NotificationDispatcher<TestRenderer> {
        NotificationDispatcher::new("StarFlight Demo", renderer.clone())
    }

    #[test]
    fn dispatch__should_render_a_remind_payload_under_the_remind_id() {
        // Given
        let renderer = TestRenderer::default();
        let payload = r#"{
            "text": "Time to come back!",
            "uuid": "7f1a8276-6b32-4f9a-9df0-4546a2c1a680",
            "tags": "[\"remind\"]"
        }"#;

        // When
        let category = dispatcher(&renderer).dispatch(payload).expect("dispatch");

        // Then
        assert_eq!(category, Some(NotificationCategory::Remind));
        let shown = renderer.shown.lock().expect("shown lock");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, NOTIFICATION_ID_REMIND);
        assert_eq!(shown[0].1.title, "StarFlight Demo");
        assert_eq!(shown[0].1.body, "Time to come back!");
    }

    #[test]
    fn dispatch__should_treat_a_missing_tag_list_as_normal() {
        // Given
        let renderer = TestRenderer::default();
        let payload = r#"{
            "text": "Hello",
            "url": "https://example.com/news",
            "uuid": "7f1a8276-6b32-4f9a-9df0-4546a2c1a680"
        }"#;

        // When
        let category = dispatcher(&renderer).dispatch(payload).expect("dispatch");

        // Then
        assert_eq!(category, Some(NotificationCategory::Normal));
        let shown = renderer.shown.lock().expect("shown lock");
        assert_eq!(shown[0].0, NOTIFICATION_ID_NORMAL);
        assert_eq!(shown[0].1.url.as_deref(), Some("https://example.com/news"));
    }

    #[test]
    fn dispatch__should_drop_a_payload_with_two_tags() {
        // Given
        let renderer = TestRenderer::default();
        let payload = r#"{
            "text": "Hello",
            "uuid": "7f1a8276-6b32-4f9a-9df0-4546a2c1a680",
            "tags": "[\"normal\", \"remind\"]"
        }"#;

        // When
        let category = dispatcher(&renderer).dispatch(payload).expect("dispatch");

        // Then
        assert_eq!(category, None);
        assert!(renderer.shown.lock().expect("shown lock").is_empty());
    }

    #[test]
    fn dispatch__should_drop_a_single_unrecognized_tag() {
        // Given
        let renderer = TestRenderer::default();
        let payload = r#"{
            "text": "Hello",
            "uuid": "7f1a8276-6b32-4f9a-9df0-4546a2c1a680",
            "tags": "[\"breaking\"]"
        }"#;

        // When
        let category = dispatcher(&renderer).dispatch(payload).expect("dispatch");

        // Then
        assert_eq!(category, None);
        assert!(renderer.shown.lock().expect("shown lock").is_empty());
    }

    #[test]
    fn parse__should_reject_a_missing_message_uuid() {
        // Given
        let payload = r#"{"text": "Hello"}"#;

        // Then
        assert!(NotificationEnvelope::parse(payload).is_err());
    }

    #[test]
    fn parse__should_reject_an_unparseable_tags_field() {
        // Given
        let payload = r#"{
            "text": "Hello",
            "uuid": "7f1a8276-6b32-4f9a-9df0-4546a2c1a680",
            "tags": "not json"
        }"#;

        // When
        let err = NotificationEnvelope::parse(payload).expect_err("should fail");

        // Then
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn classify__should_map_each_known_tag_to_its_category() {
        assert_eq!(
            classify(&["normal".to_string()]),
            Some(NotificationCategory::Normal)
        );
        assert_eq!(
            classify(&["remind".to_string()]),
            Some(NotificationCategory::Remind)
        );
        assert_eq!(classify(&[]), Some(NotificationCategory::Normal));
    }
}

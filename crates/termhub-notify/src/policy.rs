//! Channel routing by priority.

use termhub_entity::notification::{ChannelKind, NotificationPriority};

/// External channels a notification of `priority` goes to, on top of the
/// in-app record every notification gets.
pub fn channels_for(priority: NotificationPriority) -> &'static [ChannelKind] {
    match priority {
        NotificationPriority::Urgent => &[ChannelKind::Chat],
        NotificationPriority::High => &[ChannelKind::Chat, ChannelKind::Email],
        NotificationPriority::Medium => &[ChannelKind::Email],
        NotificationPriority::Low => &[],
    }
}

/// Whether `kind` is used for `priority`.
pub fn is_eligible(priority: NotificationPriority, kind: ChannelKind) -> bool {
    channels_for(priority).contains(&kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table() {
        assert!(is_eligible(NotificationPriority::Urgent, ChannelKind::Chat));
        assert!(!is_eligible(NotificationPriority::Urgent, ChannelKind::Email));
        assert!(is_eligible(NotificationPriority::High, ChannelKind::Chat));
        assert!(is_eligible(NotificationPriority::High, ChannelKind::Email));
        assert!(!is_eligible(NotificationPriority::Medium, ChannelKind::Chat));
        assert!(is_eligible(NotificationPriority::Medium, ChannelKind::Email));
        assert!(channels_for(NotificationPriority::Low).is_empty());
    }
}

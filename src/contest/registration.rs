use chrono::NaiveDateTime;
use serde::Serialize;

/// Admission phase derived from the wall clock on every query. Nothing is
/// persisted; a clock change simply yields the phase for the new time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Pre,
    Open,
    Closed,
}

impl RegistrationState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// The interval during which new submissions are accepted. Both bounds are
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationWindow {
    pub opens_at: NaiveDateTime,
    pub closes_at: NaiveDateTime,
}

impl RegistrationWindow {
    pub const fn new(opens_at: NaiveDateTime, closes_at: NaiveDateTime) -> Self {
        Self { opens_at, closes_at }
    }

    pub fn state_at(&self, now: NaiveDateTime) -> RegistrationState {
        if now < self.opens_at {
            RegistrationState::Pre
        } else if now > self.closes_at {
            RegistrationState::Closed
        } else {
            RegistrationState::Open
        }
    }

    pub fn is_open_at(&self, now: NaiveDateTime) -> bool {
        self.state_at(now) == RegistrationState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window() -> RegistrationWindow {
        let opens_at = NaiveDateTime::parse_from_str("2025-10-02T00:00:00", "%Y-%m-%dT%H:%M:%S")
            .expect("valid open instant");
        let closes_at = NaiveDateTime::parse_from_str("2025-10-14T23:59:59", "%Y-%m-%dT%H:%M:%S")
            .expect("valid close instant");
        RegistrationWindow::new(opens_at, closes_at)
    }

    #[test]
    fn before_the_open_instant_is_pre() {
        let window = window();
        let just_before = window.opens_at - Duration::seconds(1);
        assert_eq!(window.state_at(just_before), RegistrationState::Pre);
        assert!(!window.is_open_at(just_before));
    }

    #[test]
    fn both_bounds_are_inclusive() {
        let window = window();
        assert_eq!(window.state_at(window.opens_at), RegistrationState::Open);
        assert_eq!(window.state_at(window.closes_at), RegistrationState::Open);
    }

    #[test]
    fn after_the_close_instant_is_closed() {
        let window = window();
        let just_after = window.closes_at + Duration::seconds(1);
        assert_eq!(window.state_at(just_after), RegistrationState::Closed);
        assert!(!window.is_open_at(just_after));
    }
}

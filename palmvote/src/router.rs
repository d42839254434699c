//! Top-level view state: which portal is open and which screen inside it.

use crate::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Landing,
    Admin(AdminScreen),
    Voter(VoterScreen),
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Landing
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Landing => write!(f, "landing"),
            Mode::Admin(screen) => write!(f, "admin.{}", screen),
            Mode::Voter(screen) => write!(f, "voter.{}", screen),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScreen {
    Login,
    Dashboard,
    CreateVoter,
    VoterList,
    PalmRegistration,
    CreateElection,
    Results,
}

impl AdminScreen {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminScreen::Login => "login",
            AdminScreen::Dashboard => "dashboard",
            AdminScreen::CreateVoter => "create-voter",
            AdminScreen::VoterList => "voter-list",
            AdminScreen::PalmRegistration => "palm-registration",
            AdminScreen::CreateElection => "create-election",
            AdminScreen::Results => "results",
        }
    }

    /// Screens reachable straight from the dashboard
    fn from_dashboard(&self) -> bool {
        matches!(
            self,
            AdminScreen::CreateVoter | AdminScreen::VoterList | AdminScreen::CreateElection | AdminScreen::Results
        )
    }
}

impl fmt::Display for AdminScreen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterScreen {
    Login,
    QkdSession,
    PalmScan,
    IdentityVerified,
    CandidateSelection,
    VoteSuccess,
    Error(VoterErrorKind),
}

impl fmt::Display for VoterScreen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VoterScreen::Login => f.write_str("login"),
            VoterScreen::QkdSession => f.write_str("qkd-session"),
            VoterScreen::PalmScan => f.write_str("palm-scan"),
            VoterScreen::IdentityVerified => f.write_str("identity-verified"),
            VoterScreen::CandidateSelection => f.write_str("candidate-selection"),
            VoterScreen::VoteSuccess => f.write_str("vote-success"),
            VoterScreen::Error(kind) => write!(f, "error({})", kind),
        }
    }
}

/// Why the voter flow landed on the error screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterErrorKind {
    InvalidPalm,
    AlreadyVoted,
    SessionExpired,
}

impl VoterErrorKind {
    /// Headline shown on the error screen
    pub fn message(&self) -> &'static str {
        match self {
            VoterErrorKind::InvalidPalm => "Palm verification failed",
            VoterErrorKind::AlreadyVoted => "You have already voted in this election",
            VoterErrorKind::SessionExpired => "Your secure session has expired",
        }
    }
}

impl fmt::Display for VoterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            VoterErrorKind::InvalidPalm => "invalid-palm",
            VoterErrorKind::AlreadyVoted => "already-voted",
            VoterErrorKind::SessionExpired => "session-expired",
        })
    }
}

/// User actions and screen completions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    OpenAdmin,
    OpenVoter,
    AdminAuthenticated,
    Navigate(AdminScreen),
    RegisterPalm,
    Back,
    Completed,
    VoterIdentified,
    SessionEstablished,
    ScanVerified,
    ScanRejected,
    Proceed,
    BallotCast,
    Fail(VoterErrorKind),
    Retry,
    Exit,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::Navigate(screen) => write!(f, "Navigate({})", screen),
            Event::Fail(kind) => write!(f, "Fail({})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

/// The view router.
///
/// Holds the current [`Mode`] and moves between screens only along the
/// transitions listed in [`Router::next`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Router {
    mode: Mode,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply an event, returning the new mode. An invalid event leaves the
    /// router where it was.
    pub fn apply(&mut self, event: Event) -> Result<Mode, TransitionError> {
        let next = Self::next(self.mode, event).ok_or_else(|| TransitionError {
            from: self.mode.to_string(),
            event: event.to_string(),
        })?;
        log::debug!("{} --{}--> {}", self.mode, event, next);
        self.mode = next;
        Ok(next)
    }

    /// The transition table
    pub fn next(mode: Mode, event: Event) -> Option<Mode> {
        use AdminScreen as A;
        use VoterScreen as V;

        let next = match (mode, event) {
            (Mode::Landing, Event::OpenAdmin) => Mode::Admin(A::Login),
            (Mode::Landing, Event::OpenVoter) => Mode::Voter(V::Login),
            (Mode::Landing, _) => return None,
            (_, Event::Exit) => Mode::Landing,

            (Mode::Admin(A::Login), Event::AdminAuthenticated) => Mode::Admin(A::Dashboard),
            (Mode::Admin(A::Dashboard), Event::Navigate(to)) if to.from_dashboard() => Mode::Admin(to),
            (Mode::Admin(A::VoterList), Event::RegisterPalm) => Mode::Admin(A::PalmRegistration),
            (Mode::Admin(A::PalmRegistration), Event::Back) | (Mode::Admin(A::PalmRegistration), Event::Completed) => {
                Mode::Admin(A::VoterList)
            }
            (Mode::Admin(screen), Event::Back) | (Mode::Admin(screen), Event::Completed)
                if screen.from_dashboard() =>
            {
                Mode::Admin(A::Dashboard)
            }

            (Mode::Voter(V::Login), Event::VoterIdentified) => Mode::Voter(V::QkdSession),
            (Mode::Voter(V::QkdSession), Event::SessionEstablished) => Mode::Voter(V::PalmScan),
            (Mode::Voter(V::PalmScan), Event::ScanVerified) => Mode::Voter(V::IdentityVerified),
            (Mode::Voter(V::PalmScan), Event::ScanRejected) => Mode::Voter(V::Error(VoterErrorKind::InvalidPalm)),
            (Mode::Voter(V::IdentityVerified), Event::Proceed) => Mode::Voter(V::CandidateSelection),
            (Mode::Voter(V::CandidateSelection), Event::BallotCast) => Mode::Voter(V::VoteSuccess),
            (Mode::Voter(V::Error(_)), Event::Retry) => Mode::Voter(V::PalmScan),
            (Mode::Voter(V::Error(_)), Event::Fail(_)) => return None,
            (Mode::Voter(_), Event::Fail(kind)) => Mode::Voter(V::Error(kind)),

            _ => return None,
        };
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(events: &[Event]) -> Router {
        let mut router = Router::new();
        for event in events {
            router.apply(*event).unwrap();
        }
        router
    }

    #[test]
    fn voter_happy_path() {
        let router = walk(&[
            Event::OpenVoter,
            Event::VoterIdentified,
            Event::SessionEstablished,
            Event::ScanVerified,
            Event::Proceed,
            Event::BallotCast,
        ]);
        assert_eq!(router.mode(), Mode::Voter(VoterScreen::VoteSuccess));
        assert_eq!(router.mode().to_string(), "voter.vote-success");
    }

    #[test]
    fn rejected_scan_and_retry() {
        let mut router = walk(&[
            Event::OpenVoter,
            Event::VoterIdentified,
            Event::SessionEstablished,
            Event::ScanRejected,
        ]);
        assert_eq!(
            router.mode(),
            Mode::Voter(VoterScreen::Error(VoterErrorKind::InvalidPalm))
        );
        assert!(router.apply(Event::Fail(VoterErrorKind::SessionExpired)).is_err());
        assert_eq!(router.apply(Event::Retry).unwrap(), Mode::Voter(VoterScreen::PalmScan));
    }

    #[test]
    fn failures_reach_the_error_screen_from_any_voter_screen() {
        let mut router = walk(&[Event::OpenVoter, Event::VoterIdentified]);
        let mode = router
            .apply(Event::Fail(VoterErrorKind::SessionExpired))
            .unwrap();
        assert_eq!(mode.to_string(), "voter.error(session-expired)");
    }

    #[test]
    fn admin_navigation() {
        let mut router = walk(&[Event::OpenAdmin, Event::AdminAuthenticated]);
        assert_eq!(router.mode(), Mode::Admin(AdminScreen::Dashboard));

        router.apply(Event::Navigate(AdminScreen::VoterList)).unwrap();
        router.apply(Event::RegisterPalm).unwrap();
        assert_eq!(router.apply(Event::Completed).unwrap(), Mode::Admin(AdminScreen::VoterList));
        assert_eq!(router.apply(Event::Back).unwrap(), Mode::Admin(AdminScreen::Dashboard));

        router.apply(Event::Navigate(AdminScreen::Results)).unwrap();
        assert_eq!(router.apply(Event::Back).unwrap(), Mode::Admin(AdminScreen::Dashboard));

        // Palm registration is only reachable from the voter list
        assert!(router.apply(Event::Navigate(AdminScreen::PalmRegistration)).is_err());
        assert!(router.apply(Event::Navigate(AdminScreen::Login)).is_err());
    }

    #[test]
    fn invalid_events_leave_state_unchanged() {
        let mut router = walk(&[Event::OpenAdmin]);
        let err = router.apply(Event::BallotCast).unwrap_err();
        assert_eq!(err.from, "admin.login");
        assert_eq!(err.event, "BallotCast");
        assert_eq!(router.mode(), Mode::Admin(AdminScreen::Login));

        // Dashboard is never reached without authenticating
        assert!(router.apply(Event::Navigate(AdminScreen::Results)).is_err());

        let mut landing = Router::new();
        assert!(landing.apply(Event::Exit).is_err());
        assert!(landing.apply(Event::Back).is_err());
    }

    #[test]
    fn exit_resets_to_landing() {
        let mut router = walk(&[Event::OpenAdmin, Event::AdminAuthenticated]);
        assert_eq!(router.apply(Event::Exit).unwrap(), Mode::Landing);
        assert_eq!(router.apply(Event::OpenAdmin).unwrap(), Mode::Admin(AdminScreen::Login));

        let mut router = walk(&[Event::OpenVoter, Event::VoterIdentified, Event::SessionEstablished]);
        router.apply(Event::Exit).unwrap();
        assert_eq!(router.apply(Event::OpenVoter).unwrap(), Mode::Voter(VoterScreen::Login));
    }
}

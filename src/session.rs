// 4.0 session.rs: the exchange trading session. one per admin process.
// auto mode advances phases off the clock; manual mode is stepped by an
// employee, one matching round in flight at a time.

use crate::config::AdminConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Phase of the daily session. Ordering follows the trading day, which lets
/// the auto scheduler move strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionPhase {
    PreOpen,
    Ato,
    ContinuousLo,
    Atc,
    Closed,
}

/// The phases an employee can dispatch a matching round for.
/// PreOpen and Closed are not matching rounds, so they are unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingPhase {
    Ato,
    ContinuousLo,
    Atc,
}

impl From<MatchingPhase> for SessionPhase {
    fn from(phase: MatchingPhase) -> Self {
        match phase {
            MatchingPhase::Ato => SessionPhase::Ato,
            MatchingPhase::ContinuousLo => SessionPhase::ContinuousLo,
            MatchingPhase::Atc => SessionPhase::Atc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// Phases advance on the configured schedule; manual stepping disabled
    Auto,
    /// Each matching round is dispatched explicitly by an employee
    Manual,
}

/// Proof that a matching round was opened through [`SessionController::begin_phase`].
/// Not cloneable: exactly one exists per in-flight round, and it must be
/// returned through `finish_phase`.
#[derive(Debug)]
pub struct PhaseTicket {
    phase: MatchingPhase,
}

impl PhaseTicket {
    pub fn phase(&self) -> MatchingPhase {
        self.phase
    }
}

/// Outcome of a dispatched matching round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("manual phase stepping requires manual mode")]
    ManualOnly,

    #[error("a matching round for {0:?} is already in flight")]
    Busy(MatchingPhase),

    #[error("day rollover refused inside the {window_start}-{window_end} trading window")]
    OutsideAllowedWindow {
        window_start: chrono::NaiveTime,
        window_end: chrono::NaiveTime,
    },

    #[error("trading day {0} already prepared")]
    AlreadyPrepared(NaiveDate),
}

/// Process-wide session state: mode, phase, the in-flight matching guard,
/// and the once-per-day preparation marker.
#[derive(Debug)]
pub struct SessionController {
    config: AdminConfig,
    mode: SessionMode,
    phase: SessionPhase,
    in_flight: Option<MatchingPhase>,
    prepared_date: Option<NaiveDate>,
}

impl SessionController {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config,
            mode: SessionMode::Auto,
            phase: SessionPhase::PreOpen,
            in_flight: None,
            prepared_date: None,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_phase_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Switch between auto and manual stepping. Leaving manual mid-phase
    /// preserves the current phase; the auto scheduler picks up from there.
    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }

    /// Open a matching round for `phase`. Rounds are session-wide, so at most
    /// one may be in flight; a second request fails with `Busy` before any
    /// remote dispatch happens.
    pub fn begin_phase(&mut self, phase: MatchingPhase) -> Result<PhaseTicket, SessionError> {
        if self.mode != SessionMode::Manual {
            return Err(SessionError::ManualOnly);
        }
        if let Some(pending) = self.in_flight {
            return Err(SessionError::Busy(pending));
        }
        self.in_flight = Some(phase);
        Ok(PhaseTicket { phase })
    }

    /// Close the round opened by `ticket`. Always clears the in-flight guard;
    /// the session phase only advances on a completed round.
    pub fn finish_phase(&mut self, ticket: PhaseTicket, outcome: PhaseOutcome) {
        self.in_flight = None;
        if outcome == PhaseOutcome::Completed {
            self.phase = ticket.phase.into();
        }
    }

    /// Auto-mode progression: move the phase forward to whatever the schedule
    /// says `now` falls in. Strictly forward, never backward, and a no-op in
    /// manual mode. Returns the new phase if it changed.
    pub fn advance_auto(&mut self, now: Timestamp) -> Option<SessionPhase> {
        if self.mode != SessionMode::Auto {
            return None;
        }

        let time = now.time_of_day();
        let schedule = &self.config.schedule;
        let target = if time < schedule.ato_start {
            SessionPhase::PreOpen
        } else if time < schedule.lo_start {
            SessionPhase::Ato
        } else if time < schedule.atc_start {
            SessionPhase::ContinuousLo
        } else if time < schedule.close {
            SessionPhase::Atc
        } else {
            SessionPhase::Closed
        };

        if target > self.phase {
            self.phase = target;
            Some(target)
        } else {
            None
        }
    }

    /// Day rollover is refused while the clock is inside the protected
    /// trading window. Split from the mutation so the workflow can validate
    /// before the remote call and mutate only after confirmation.
    pub fn check_rollover_window(&self, now: Timestamp) -> Result<(), SessionError> {
        if self.config.in_trading_window(now.time_of_day()) {
            return Err(SessionError::OutsideAllowedWindow {
                window_start: self.config.trading_window_start,
                window_end: self.config.trading_window_end,
            });
        }
        Ok(())
    }

    /// Reset the session for the next trading day.
    pub fn prepare_next_day(&mut self, now: Timestamp) -> Result<(), SessionError> {
        self.check_rollover_window(now)?;
        self.phase = SessionPhase::PreOpen;
        self.prepared_date = None;
        Ok(())
    }

    /// Seeding today's prices is allowed at most once per trading date.
    pub fn check_prepare_today(&self, now: Timestamp) -> Result<(), SessionError> {
        let today = now.trading_date();
        if self.prepared_date == Some(today) {
            return Err(SessionError::AlreadyPrepared(today));
        }
        Ok(())
    }

    /// Mark today's opening prices as seeded. Available at any time of day,
    /// but only once per trading date.
    pub fn prepare_today(&mut self, now: Timestamp) -> Result<(), SessionError> {
        self.check_prepare_today(now)?;
        self.prepared_date = Some(now.trading_date());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn at(h: u32, m: u32) -> Timestamp {
        Timestamp::from_date_time(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
    }

    fn manual_controller() -> SessionController {
        let mut controller = SessionController::new(AdminConfig::default());
        controller.set_mode(SessionMode::Manual);
        controller
    }

    #[test]
    fn begin_phase_requires_manual_mode() {
        let mut controller = SessionController::new(AdminConfig::default());
        assert_eq!(
            controller.begin_phase(MatchingPhase::Ato).unwrap_err(),
            SessionError::ManualOnly
        );
    }

    #[test]
    fn second_begin_while_in_flight_is_busy() {
        let mut controller = manual_controller();

        let ticket = controller.begin_phase(MatchingPhase::Ato).unwrap();
        assert!(controller.is_phase_in_flight());

        assert_eq!(
            controller.begin_phase(MatchingPhase::ContinuousLo).unwrap_err(),
            SessionError::Busy(MatchingPhase::Ato)
        );

        controller.finish_phase(ticket, PhaseOutcome::Completed);
        assert!(!controller.is_phase_in_flight());
        assert_eq!(controller.phase(), SessionPhase::Ato);
    }

    #[test]
    fn failed_round_clears_guard_without_advancing() {
        let mut controller = manual_controller();

        let ticket = controller.begin_phase(MatchingPhase::Ato).unwrap();
        controller.finish_phase(ticket, PhaseOutcome::Failed);

        assert!(!controller.is_phase_in_flight());
        assert_eq!(controller.phase(), SessionPhase::PreOpen);
    }

    #[test]
    fn leaving_manual_preserves_phase() {
        let mut controller = manual_controller();

        let ticket = controller.begin_phase(MatchingPhase::ContinuousLo).unwrap();
        controller.finish_phase(ticket, PhaseOutcome::Completed);
        assert_eq!(controller.phase(), SessionPhase::ContinuousLo);

        controller.set_mode(SessionMode::Auto);
        assert_eq!(controller.phase(), SessionPhase::ContinuousLo);
    }

    #[test]
    fn auto_advances_with_the_clock() {
        let mut controller = SessionController::new(AdminConfig::default());

        assert_eq!(controller.advance_auto(at(8, 30)), None); // still pre-open
        assert_eq!(controller.advance_auto(at(9, 5)), Some(SessionPhase::Ato));
        assert_eq!(controller.advance_auto(at(10, 0)), Some(SessionPhase::ContinuousLo));
        assert_eq!(controller.advance_auto(at(14, 35)), Some(SessionPhase::Atc));
        assert_eq!(controller.advance_auto(at(15, 0)), Some(SessionPhase::Closed));

        // never moves backward
        assert_eq!(controller.advance_auto(at(9, 5)), None);
        assert_eq!(controller.phase(), SessionPhase::Closed);
    }

    #[test]
    fn auto_advance_is_inert_in_manual_mode() {
        let mut controller = manual_controller();
        assert_eq!(controller.advance_auto(at(10, 0)), None);
        assert_eq!(controller.phase(), SessionPhase::PreOpen);
    }

    #[test]
    fn rollover_refused_during_trading_window() {
        let mut controller = manual_controller();
        assert!(matches!(
            controller.prepare_next_day(at(10, 0)),
            Err(SessionError::OutsideAllowedWindow { .. })
        ));
    }

    #[test]
    fn rollover_resets_phase_after_hours() {
        let mut controller = manual_controller();

        let ticket = controller.begin_phase(MatchingPhase::Atc).unwrap();
        controller.finish_phase(ticket, PhaseOutcome::Completed);
        assert_eq!(controller.phase(), SessionPhase::Atc);

        controller.prepare_next_day(at(16, 0)).unwrap();
        assert_eq!(controller.phase(), SessionPhase::PreOpen);
    }

    #[test]
    fn prepare_today_once_per_date() {
        let mut controller = manual_controller();

        controller.prepare_today(at(7, 0)).unwrap();
        assert_eq!(
            controller.prepare_today(at(7, 30)).unwrap_err(),
            SessionError::AlreadyPrepared(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );

        // next-day rollover clears the marker
        controller.prepare_next_day(at(16, 0)).unwrap();
        assert!(controller.prepare_today(at(16, 30)).is_ok());
    }
}

//! Lift control loop
//!
//! One [`LiftController::poll`] call is one iteration of the cooperative
//! loop: safety first, then the switch inputs, then manual actions, then a
//! level change request. Moves block until the last pulse has been emitted,
//! so a fault raised mid-move is acted on at the next poll.

use crate::config::LiftConfig;
use crate::debounce::{Debouncer, InputId};
use crate::homing::{Homing, HomingError, HomingReport};
use crate::level::{Level, LevelError, LevelMachine};
use crate::motion::{execute, MoveReport, StepRamp};
use crate::safety::{FaultLatch, SafetyStatus, SafetySupervisor};
use crate::traits::{Clock, Direction, OptoOutput, OptoState, StepperDriver};

/// Raw input levels sampled once per poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LiftInputs {
    /// Motion enable from the legacy controller (active-high)
    pub enable: bool,
    /// Direction line (high = clockwise)
    pub direction: bool,
    /// Limit switch (active-low)
    pub limit: bool,
    /// Left jog button (active-low)
    pub left: bool,
    /// Right jog button (active-low)
    pub right: bool,
    /// Driver fault line level
    pub fault_line: bool,
}

impl Default for LiftInputs {
    /// Everything idle: switches released, enable low, fault line high
    fn default() -> Self {
        Self {
            enable: false,
            direction: true,
            limit: true,
            left: true,
            right: true,
            fault_line: true,
        }
    }
}

/// Why a level change request was not serviced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Driver fault latched and not yet acknowledged
    Faulted,
    /// A move is still executing
    MoveInProgress,
    /// The level machine had no move in flight to commit
    NoMoveInFlight,
}

impl From<LevelError> for Rejection {
    fn from(e: LevelError) -> Self {
        match e {
            LevelError::MoveInProgress => Rejection::MoveInProgress,
            LevelError::NoMoveInFlight => Rejection::NoMoveInFlight,
        }
    }
}

/// What a poll iteration acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Level change completed
    Moved {
        from: Level,
        to: Level,
        report: MoveReport,
    },
    /// Level change request refused
    Rejected(Rejection),
    /// Manual jog completed; `offset` is the accumulated trim in pulses
    Jogged { direction: Direction, offset: i32 },
    /// Jog trim cleared, current position taken as the level
    PositionRecorded,
    /// Fault cleared by the operator
    FaultAcknowledged,
    /// Acknowledge refused while the fault line is still asserted
    AcknowledgeRefused,
}

/// Result of one poll iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    /// Supervisor verdict at the start of the iteration
    pub safety: SafetyStatus,
    /// Driver was disabled by this iteration
    pub disabled: bool,
    /// Action taken, if any
    pub action: Option<Action>,
}

/// Snapshot for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LiftStatus {
    pub level: Level,
    pub faulted: bool,
    pub driver_enabled: bool,
    pub jog_offset: i32,
    pub opto: OptoState,
}

/// Lift controller
///
/// Owns the driver and the opto output; the fault latch is shared with
/// whatever watches the driver's fault line.
pub struct LiftController<'a, D, O>
where
    D: StepperDriver,
    O: OptoOutput,
{
    config: LiftConfig,
    driver: D,
    opto: O,
    latch: &'a FaultLatch,
    debouncer: Debouncer,
    levels: LevelMachine,
    supervisor: SafetySupervisor,
    ramp: StepRamp,
    /// Single-button jog waiting out the partner button's press window,
    /// with the time the button was confirmed
    pending_jog: Option<(Direction, u32)>,
    /// Net jog pulses since the last recorded position
    jog_offset: i32,
}

impl<'a, D, O> LiftController<'a, D, O>
where
    D: StepperDriver,
    O: OptoOutput,
{
    /// Create a controller with the driver disabled and the opto open
    pub fn new(
        config: LiftConfig,
        mut driver: D,
        mut opto: O,
        latch: &'a FaultLatch,
        now_ms: u32,
    ) -> Self {
        driver.set_reset(false);
        driver.enable(false);
        driver.set_microsteps(config.motion.microsteps);
        opto.set(OptoState::Open);

        Self {
            debouncer: Debouncer::new(config.debounce),
            levels: LevelMachine::new(config.steps_per_level()),
            supervisor: SafetySupervisor::new(config.safety.idle_timeout_ms, now_ms),
            ramp: StepRamp::new(config.motion.ramp.clone()),
            config,
            driver,
            opto,
            latch,
            pending_jog: None,
            jog_offset: 0,
        }
    }

    /// Home against the limit switch and define the position as `Down`
    pub fn home<C, L>(&mut self, clock: &C, limit_raw: L) -> Result<HomingReport, HomingError>
    where
        C: Clock,
        L: FnMut() -> bool,
    {
        let report = Homing::new(self.config.homing).run(
            &mut self.driver,
            clock,
            &mut self.debouncer,
            limit_raw,
        )?;

        self.levels.home();
        self.opto.set(OptoState::Open);
        self.jog_offset = 0;
        self.pending_jog = None;
        self.supervisor.note_activity(clock.now_ms());
        Ok(report)
    }

    /// Run one iteration of the control loop
    pub fn poll(&mut self, now_ms: u32, inputs: LiftInputs) -> PollOutcome {
        // Safety
        self.supervisor.observe_fault(self.latch.is_raised());
        let safety = self.supervisor.check(now_ms);
        let disabled = safety.requires_disable() && self.driver.is_enabled();
        if disabled {
            self.driver.enable(false);
        }

        // Switches
        let left = self.debouncer.sample(InputId::Left, inputs.left, now_ms);
        let right = self.debouncer.sample(InputId::Right, inputs.right, now_ms);
        self.debouncer.sample(InputId::Limit, inputs.limit, now_ms);

        let mut action = None;
        if left.is_some() || right.is_some() {
            let line_asserted = self.fault_line_asserted(inputs);
            action = self.manual_action(now_ms, left.is_some(), line_asserted);
        }
        if action.is_none() {
            action = self.run_pending_jog(now_ms);
        }

        // Level change request while enable is held. A request that
        // coincides with a manual action is serviced on the next poll.
        if inputs.enable && action.is_none() {
            action = Some(self.request_move(now_ms, Direction::from_line(inputs.direction)));
        }

        PollOutcome {
            safety,
            disabled,
            action,
        }
    }

    fn fault_line_asserted(&self, inputs: LiftInputs) -> bool {
        inputs.fault_line != self.config.safety.fault_active_low
    }

    fn manual_action(
        &mut self,
        now_ms: u32,
        left_pressed: bool,
        line_asserted: bool,
    ) -> Option<Action> {
        let both =
            self.debouncer.is_pressed(InputId::Left) && self.debouncer.is_pressed(InputId::Right);

        if self.supervisor.is_faulted() {
            self.pending_jog = None;
            if !both {
                return None;
            }
            if self.supervisor.acknowledge_fault(line_asserted, now_ms) {
                self.latch.clear();
                return Some(Action::FaultAcknowledged);
            }
            return Some(Action::AcknowledgeRefused);
        }

        if both {
            self.pending_jog = None;
            self.jog_offset = 0;
            return Some(Action::PositionRecorded);
        }

        let direction = if left_pressed {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };
        self.pending_jog = Some((direction, now_ms));
        None
    }

    /// Run a held jog once the partner button can no longer be confirmed
    /// alongside it
    fn run_pending_jog(&mut self, now_ms: u32) -> Option<Action> {
        let (direction, since_ms) = self.pending_jog?;
        if now_ms.wrapping_sub(since_ms) <= self.config.debounce.press_ms {
            return None;
        }

        self.pending_jog = None;
        if self.supervisor.is_faulted() {
            return None;
        }
        Some(self.jog(now_ms, direction))
    }

    fn jog(&mut self, now_ms: u32, direction: Direction) -> Action {
        let steps = self.config.jog_steps();
        self.driver.enable(true);
        self.driver.set_direction(direction);
        for _ in 0..steps {
            self.driver.step(self.config.jog.half_period_us);
        }

        let delta = steps.min(i32::MAX as u32) as i32 * direction.sign();
        self.jog_offset = self.jog_offset.saturating_add(delta);

        let elapsed_ms = (steps as u64 * 2 * self.config.jog.half_period_us as u64 / 1000) as u32;
        self.supervisor.note_activity(now_ms.wrapping_add(elapsed_ms));

        Action::Jogged {
            direction,
            offset: self.jog_offset,
        }
    }

    fn request_move(&mut self, now_ms: u32, direction: Direction) -> Action {
        if !self.supervisor.motion_allowed() {
            return Action::Rejected(Rejection::Faulted);
        }

        let from = self.levels.current();
        let pending = match self.levels.begin(direction) {
            Ok(pending) => pending,
            Err(e) => return Action::Rejected(e.into()),
        };

        self.driver.enable(true);
        let plan = self.ramp.generate(
            pending.request.direction,
            pending.request.total_steps,
            self.config.motion.microsteps,
        );
        let report = execute(
            &mut self.driver,
            &mut self.opto,
            plan,
            pending.request.opto_trigger_fraction,
        );

        // begin() succeeded above, so a move is in flight
        let to = self.levels.finish().unwrap_or(pending.target);
        self.supervisor
            .note_activity(now_ms.wrapping_add((report.duration_us / 1000) as u32));

        Action::Moved { from, to, report }
    }

    /// Current level
    pub fn level(&self) -> Level {
        self.levels.current()
    }

    /// Status snapshot
    pub fn status(&self) -> LiftStatus {
        LiftStatus {
            level: self.levels.current(),
            faulted: self.supervisor.is_faulted(),
            driver_enabled: self.driver.is_enabled(),
            jog_offset: self.jog_offset,
            opto: self.opto.state(),
        }
    }

    /// Get the configuration in use
    pub fn config(&self) -> &LiftConfig {
        &self.config
    }

    /// Get the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get the opto output
    pub fn opto(&self) -> &O {
        &self.opto
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockDriver, MockOpto};
    use crate::motion::RampTable;

    type Controller<'a> = LiftController<'a, MockDriver<'a>, MockOpto>;

    fn config() -> LiftConfig {
        let mut config = LiftConfig::default();
        config.motion.ramp = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        config.safety.idle_timeout_ms = 10_000;
        config.jog.steps = 10;
        config.jog.half_period_us = 500;
        config
    }

    fn controller(latch: &FaultLatch) -> Controller<'_> {
        LiftController::new(config(), MockDriver::new(), MockOpto::new(), latch, 0)
    }

    fn idle() -> LiftInputs {
        LiftInputs::default()
    }

    fn enable(direction: Direction) -> LiftInputs {
        LiftInputs {
            enable: true,
            direction: direction == Direction::Clockwise,
            ..LiftInputs::default()
        }
    }

    /// Raise enable after a low poll and return the resulting action
    fn request(ctl: &mut Controller<'_>, now: u32, direction: Direction) -> Option<Action> {
        ctl.poll(now, idle());
        ctl.poll(now + 1, enable(direction)).action
    }

    /// Hold the given buttons low long enough to confirm the press and run
    /// any single-button jog
    fn press(ctl: &mut Controller<'_>, start: u32, left: bool, right: bool) -> Option<Action> {
        let inputs = LiftInputs {
            left: !left,
            right: !right,
            ..LiftInputs::default()
        };
        let mut action = None;
        for t in start..start + 60 {
            if let Some(a) = ctl.poll(t, inputs).action {
                action = Some(a);
            }
        }
        action
    }

    fn release(ctl: &mut Controller<'_>, start: u32) {
        for t in start..start + 300 {
            ctl.poll(t, idle());
        }
    }

    #[test]
    fn test_starts_disabled_and_open() {
        let latch = FaultLatch::new();
        let ctl = controller(&latch);
        let status = ctl.status();
        assert_eq!(status.level, Level::Down);
        assert!(!status.driver_enabled);
        assert_eq!(status.opto, OptoState::Open);
        assert!(!ctl.driver().reset);
    }

    #[test]
    fn test_enable_at_power_on_moves() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        let outcome = ctl.poll(0, enable(Direction::Clockwise));
        assert!(matches!(
            outcome.action,
            Some(Action::Moved {
                from: Level::Down,
                to: Level::MidRight,
                ..
            })
        ));
        assert_eq!(ctl.driver().position, 1000);
    }

    #[test]
    fn test_enable_low_starts_nothing() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        for t in 0..100 {
            assert_eq!(ctl.poll(t, idle()).action, None);
        }
        assert!(ctl.driver().pulses.is_empty());
    }

    #[test]
    fn test_level_change() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        let action = request(&mut ctl, 100, Direction::Clockwise);
        match action {
            Some(Action::Moved { from, to, report }) => {
                assert_eq!(from, Level::Down);
                assert_eq!(to, Level::MidRight);
                assert_eq!(report.steps, 1000);
                assert_eq!(report.fractional_at, 330);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(ctl.level(), Level::MidRight);
        assert!(ctl.driver().enabled);
        assert_eq!(ctl.driver().position, 1000);
        assert_eq!(ctl.opto().changes, [OptoState::Open, OptoState::Blocked, OptoState::Open]);
    }

    #[test]
    fn test_held_enable_steps_through_levels() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        let mut visited = std::vec::Vec::new();
        for t in 100..103 {
            match ctl.poll(t, enable(Direction::Clockwise)).action {
                Some(Action::Moved { to, .. }) => visited.push(to),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(visited, [Level::MidRight, Level::Up, Level::MidLeft]);
        assert_eq!(ctl.driver().position, 3000);

        // Dropping enable stops the sequence
        assert_eq!(ctl.poll(103, idle()).action, None);
        assert_eq!(ctl.level(), Level::MidLeft);
    }

    #[test]
    fn test_request_waits_for_manual_action() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        // Left confirmed at 26, jog runs at 52
        let held = LiftInputs {
            left: false,
            ..LiftInputs::default()
        };
        for t in 0..52 {
            assert_eq!(ctl.poll(t, held).action, None);
        }

        let with_enable = LiftInputs {
            enable: true,
            ..held
        };
        assert!(matches!(
            ctl.poll(52, with_enable).action,
            Some(Action::Jogged { .. })
        ));
        assert!(matches!(
            ctl.poll(53, with_enable).action,
            Some(Action::Moved { .. })
        ));
        assert_eq!(ctl.level(), Level::MidRight);
    }

    #[test]
    fn test_level_error_maps_to_rejection() {
        assert_eq!(
            Rejection::from(LevelError::MoveInProgress),
            Rejection::MoveInProgress
        );
        assert_eq!(
            Rejection::from(LevelError::NoMoveInFlight),
            Rejection::NoMoveInFlight
        );
    }

    #[test]
    fn test_direction_line_selects_ring_direction() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        request(&mut ctl, 100, Direction::CounterClockwise);
        assert_eq!(ctl.level(), Level::MidLeft);
        assert_eq!(ctl.driver().position, -1000);

        request(&mut ctl, 200, Direction::Clockwise);
        assert_eq!(ctl.level(), Level::Down);
        assert_eq!(ctl.driver().position, 0);
    }

    #[test]
    fn test_fault_mid_idle_disables_within_one_poll() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        request(&mut ctl, 100, Direction::Clockwise);
        assert!(ctl.driver().enabled);

        latch.raise();
        let outcome = ctl.poll(200, idle());
        assert_eq!(outcome.safety, SafetyStatus::Fault);
        assert!(outcome.disabled);
        assert!(!ctl.driver().enabled);

        let action = ctl.poll(201, enable(Direction::Clockwise)).action;
        assert_eq!(action, Some(Action::Rejected(Rejection::Faulted)));
        assert_eq!(ctl.level(), Level::MidRight);
        assert!(!ctl.driver().enabled);
    }

    #[test]
    fn test_fault_while_idle_then_request() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        // Fault arrives between polls with nothing moving
        ctl.poll(10, idle());
        latch.raise();
        let outcome = ctl.poll(20, idle());
        assert_eq!(outcome.safety, SafetyStatus::Fault);
        // Driver was never enabled, nothing to disable
        assert!(!outcome.disabled);

        let action = ctl.poll(30, enable(Direction::CounterClockwise)).action;
        assert_eq!(action, Some(Action::Rejected(Rejection::Faulted)));
        assert!(ctl.driver().pulses.is_empty());
        assert_eq!(ctl.level(), Level::Down);
    }

    #[test]
    fn test_acknowledge_fault() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        latch.raise();
        ctl.poll(0, idle());

        // Fault line still asserted (active-low, reads low)
        let held = LiftInputs {
            left: false,
            right: false,
            fault_line: false,
            ..LiftInputs::default()
        };
        let mut action = None;
        for t in 1..40 {
            if let Some(a) = ctl.poll(t, held).action {
                action = Some(a);
            }
        }
        assert_eq!(action, Some(Action::AcknowledgeRefused));
        assert!(ctl.status().faulted);
        release(&mut ctl, 40);

        // Line released
        let action = press(&mut ctl, 400, true, true);
        assert_eq!(action, Some(Action::FaultAcknowledged));
        assert!(!ctl.status().faulted);
        assert!(!latch.is_raised());

        release(&mut ctl, 460);
        assert!(matches!(
            request(&mut ctl, 800, Direction::Clockwise),
            Some(Action::Moved { .. })
        ));
    }

    #[test]
    fn test_single_button_ignored_while_faulted() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        latch.raise();
        assert_eq!(press(&mut ctl, 0, true, false), None);
        assert!(ctl.driver().pulses.is_empty());
    }

    #[test]
    fn test_jog_and_record_position() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        let action = press(&mut ctl, 0, true, false);
        assert_eq!(
            action,
            Some(Action::Jogged {
                direction: Direction::Clockwise,
                offset: 10
            })
        );
        assert_eq!(ctl.driver().position, 10);
        assert!(ctl.driver().pulses.iter().all(|&(_, hp)| hp == 500));
        release(&mut ctl, 60);

        press(&mut ctl, 400, false, true);
        release(&mut ctl, 460);
        press(&mut ctl, 800, false, true);
        release(&mut ctl, 860);
        assert_eq!(ctl.status().jog_offset, -10);
        assert_eq!(ctl.driver().position, -10);
        // Jogging never changes the logical level
        assert_eq!(ctl.level(), Level::Down);

        // Both together: record
        let action = press(&mut ctl, 1200, true, true);
        assert_eq!(action, Some(Action::PositionRecorded));
        assert_eq!(ctl.status().jog_offset, 0);
    }

    #[test]
    fn test_staggered_both_press_records_without_jog() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);

        // Right goes down 10 ms after left, inside left's press window
        let mut actions = std::vec::Vec::new();
        for t in 0..100 {
            let inputs = LiftInputs {
                left: false,
                right: t < 10,
                ..LiftInputs::default()
            };
            if let Some(a) = ctl.poll(t, inputs).action {
                actions.push(a);
            }
        }

        assert_eq!(actions, [Action::PositionRecorded]);
        assert!(ctl.driver().pulses.is_empty());
    }

    #[test]
    fn test_idle_timeout_disables_driver() {
        let latch = FaultLatch::new();
        let mut ctl = controller(&latch);
        request(&mut ctl, 100, Direction::Clockwise);
        assert!(ctl.driver().enabled);

        let outcome = ctl.poll(5_000, idle());
        assert_eq!(outcome.safety, SafetyStatus::Ok);
        assert!(ctl.driver().enabled);

        let outcome = ctl.poll(20_000, idle());
        assert_eq!(outcome.safety, SafetyStatus::Idle);
        assert!(outcome.disabled);
        assert!(!ctl.driver().enabled);

        // Next request re-enables
        assert!(matches!(
            request(&mut ctl, 20_100, Direction::Clockwise),
            Some(Action::Moved { .. })
        ));
        assert!(ctl.driver().enabled);
    }

    #[test]
    fn test_home_resets_level_and_trim() {
        let latch = FaultLatch::new();
        let clock = MockClock::new(0);
        let mut ctl = LiftController::new(
            config(),
            MockDriver::with_clock(&clock),
            MockOpto::new(),
            &latch,
            0,
        );
        request(&mut ctl, 0, Direction::Clockwise);
        press(&mut ctl, 100, true, false);

        let report = ctl.home(&clock, || false).unwrap();
        assert!(report.steps > 0);
        let status = ctl.status();
        assert_eq!(status.level, Level::Down);
        assert_eq!(status.jog_offset, 0);
        assert_eq!(status.opto, OptoState::Open);
    }
}

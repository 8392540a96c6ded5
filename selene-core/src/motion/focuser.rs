//! Focuser motion controller
//!
//! One [`Focuser`] owns every piece of live state: position, target,
//! resolution, speed, hold policy and the stepper driver itself. The
//! firmware calls [`Focuser::tick`] from a periodic high-priority task and
//! the command dispatcher mutates it from the serial path; both go through
//! a single mutex.
//!
//! ```text
//!   Idle ──go──► Moving ──driver off──► Enabling
//!    ▲            │  ▲                     │
//!    │            │  └─── settle elapsed ──┘
//!    └────────────┘ arrival / stop / range bound
//! ```

use core::mem;

use crate::config::{FocuserConfig, Resolution};
use crate::settings::PersistedSettings;
use crate::traits::{Direction, StepperDriver};

/// Motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Not moving
    #[default]
    Idle,
    /// Driver was just enabled; waiting before the first step
    Enabling { ticks_remaining: u32 },
    /// Stepping towards the target
    Moving,
}

impl MotionState {
    /// Check if a move is in progress
    pub fn is_moving(&self) -> bool {
        !matches!(self, MotionState::Idle)
    }
}

/// Single-axis focuser state and motion controller
pub struct Focuser<D: StepperDriver> {
    driver: D,
    config: FocuserConfig,
    state: MotionState,
    position: u16,
    target: u16,
    resolution: Resolution,
    speed_divisor: u8,
    hold: bool,
    /// Ticks since the last eligible tick
    tick_counter: u8,
    /// Ticks left until the driver is released, if armed
    disable_countdown: Option<u32>,
    persist_requested: bool,
}

impl<D: StepperDriver> Focuser<D> {
    /// Create a focuser with default settings
    ///
    /// The driver is switched to the default resolution and left in
    /// whatever enable state it was constructed in.
    pub fn new(driver: D, config: FocuserConfig) -> Self {
        let mut focuser = Self {
            driver,
            config,
            state: MotionState::Idle,
            position: 0,
            target: 0,
            resolution: Resolution::default(),
            speed_divisor: PersistedSettings::DEFAULT.speed_divisor,
            hold: false,
            tick_counter: 0,
            disable_countdown: None,
            persist_requested: false,
        };
        focuser.apply_settings(&PersistedSettings::DEFAULT);
        focuser
    }

    /// Advance the controller by one tick
    ///
    /// Must be called at the configured tick period. Never blocks longer
    /// than the driver's step pulse.
    pub fn tick(&mut self) {
        if !self.state.is_moving() {
            self.run_disable_countdown();
        }

        if let MotionState::Enabling { ticks_remaining } = self.state {
            self.state = match ticks_remaining {
                0 | 1 => MotionState::Moving,
                n => MotionState::Enabling {
                    ticks_remaining: n - 1,
                },
            };
            return;
        }

        self.tick_counter = self.tick_counter.saturating_add(1);
        if self.tick_counter < self.speed_divisor.max(1) {
            return;
        }
        self.tick_counter = 0;

        if !self.state.is_moving() {
            return;
        }

        if self.position != self.target && !self.driver.is_enabled() {
            self.driver.enable();
            if self.config.enable_settle_ticks > 0 {
                trace!("driver enabled, settling");
                self.state = MotionState::Enabling {
                    ticks_remaining: self.config.enable_settle_ticks,
                };
                return;
            }
        }

        if self.position != self.target {
            let (next, direction) = if self.position < self.target {
                (self.position.checked_add(1), Direction::Forward)
            } else {
                (self.position.checked_sub(1), Direction::Reverse)
            };
            let Some(next) = next else {
                debug!("range bound reached at {}", self.position);
                self.end_move();
                return;
            };
            self.driver.step(direction);
            self.position = next;
        }

        if self.position == self.target {
            debug!("arrived at {}", self.position);
            self.end_move();
            self.persist_requested = true;
        }
    }

    /// Halt immediately and cancel the pending target
    pub fn stop(&mut self) {
        if self.state.is_moving() {
            debug!("stopped at {}", self.position);
        }
        self.target = self.position;
        self.end_move();
    }

    /// Start moving towards the target
    pub fn go(&mut self) {
        if !self.state.is_moving() {
            debug!("moving {} -> {}", self.position, self.target);
            self.state = MotionState::Moving;
            self.disable_countdown = None;
        }
    }

    /// Overwrite the current position
    ///
    /// Returns `false` and changes nothing while moving.
    pub fn set_position(&mut self, position: u16) -> bool {
        if self.state.is_moving() {
            return false;
        }
        self.position = position;
        self.persist_requested = true;
        true
    }

    /// Set the target position for the next `go`
    ///
    /// Returns `false` and changes nothing while moving.
    pub fn set_target(&mut self, target: u16) -> bool {
        if self.state.is_moving() {
            return false;
        }
        self.target = target;
        true
    }

    /// Select the microstep resolution
    ///
    /// Returns `false` and changes nothing while moving.
    pub fn set_resolution(&mut self, resolution: Resolution) -> bool {
        if self.state.is_moving() {
            return false;
        }
        self.resolution = resolution;
        self.driver
            .set_microsteps(resolution.microsteps(&self.config));
        self.persist_requested = true;
        true
    }

    /// Set the number of ticks per step
    ///
    /// Returns `false` and changes nothing while moving.
    pub fn set_speed_divisor(&mut self, divisor: u8) -> bool {
        if self.state.is_moving() {
            return false;
        }
        self.speed_divisor = divisor;
        self.persist_requested = true;
        true
    }

    /// Set whether the driver stays energized at rest
    ///
    /// Enabling hold energizes the driver right away. Disabling it releases
    /// the driver through the normal disable delay.
    pub fn set_hold(&mut self, hold: bool) {
        self.hold = hold;
        if hold {
            self.disable_countdown = None;
            if !self.driver.is_enabled() {
                self.driver.enable();
            }
        } else if !self.state.is_moving() {
            self.arm_disable_countdown();
        }
        self.persist_requested = true;
    }

    /// De-energize the driver regardless of hold policy
    ///
    /// Target and motion state are kept. A move in progress re-enables the
    /// driver on its next eligible tick and settles again before stepping.
    pub fn force_disable(&mut self) {
        self.disable_countdown = None;
        if let MotionState::Enabling { .. } = self.state {
            self.state = MotionState::Moving;
        }
        if self.driver.is_enabled() {
            self.driver.disable();
        }
    }

    /// Take and clear the pending persist request
    pub fn take_persist_request(&mut self) -> bool {
        mem::replace(&mut self.persist_requested, false)
    }

    /// Ask for the current settings to be saved again
    ///
    /// Used when a save taken through [`Focuser::take_persist_request`]
    /// could not be completed.
    pub fn request_persist(&mut self) {
        self.persist_requested = true;
    }

    /// Snapshot of the persisted fields
    pub fn settings(&self) -> PersistedSettings {
        PersistedSettings {
            position: self.position,
            resolution: self.resolution,
            speed_divisor: self.speed_divisor,
            hold: self.hold,
        }
    }

    /// Adopt stored settings, typically once at boot
    ///
    /// Target follows the restored position so nothing moves.
    pub fn apply_settings(&mut self, settings: &PersistedSettings) {
        self.state = MotionState::Idle;
        self.position = settings.position;
        self.target = settings.position;
        self.resolution = settings.resolution;
        self.speed_divisor = settings.speed_divisor;
        self.hold = settings.hold;
        self.driver
            .set_microsteps(settings.resolution.microsteps(&self.config));
        if settings.hold && !self.driver.is_enabled() {
            self.driver.enable();
        }
    }

    /// Current position
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Target position
    pub fn target(&self) -> u16 {
        self.target
    }

    /// Motion state
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Check if a move is in progress
    pub fn is_moving(&self) -> bool {
        self.state.is_moving()
    }

    /// Selected resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Ticks per step
    pub fn speed_divisor(&self) -> u8 {
        self.speed_divisor
    }

    /// Hold policy
    pub fn hold(&self) -> bool {
        self.hold
    }

    /// Runtime configuration
    pub fn config(&self) -> &FocuserConfig {
        &self.config
    }

    /// The stepper driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the stepper driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn end_move(&mut self) {
        self.state = MotionState::Idle;
        self.arm_disable_countdown();
    }

    fn arm_disable_countdown(&mut self) {
        self.disable_countdown = Some(self.config.disable_delay_ticks);
    }

    fn run_disable_countdown(&mut self) {
        let Some(remaining) = self.disable_countdown else {
            return;
        };
        if remaining > 1 {
            self.disable_countdown = Some(remaining - 1);
            return;
        }
        self.disable_countdown = None;
        if !self.hold && self.driver.is_enabled() {
            trace!("disable delay elapsed");
            self.driver.disable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::stepper::mock::MockStepper;
    use proptest::prelude::*;

    const SETTLE: u32 = 2;
    const DISABLE_DELAY: u32 = 10;

    fn test_config() -> FocuserConfig {
        FocuserConfig {
            tick_period_us: 500,
            disable_delay_ticks: DISABLE_DELAY,
            enable_settle_ticks: SETTLE,
            coarse_microsteps: 8,
            fine_microsteps: 32,
        }
    }

    fn focuser() -> Focuser<MockStepper> {
        Focuser::new(MockStepper::default(), test_config())
    }

    fn run_until_idle(focuser: &mut Focuser<MockStepper>, limit: u32) -> u32 {
        let mut ticks = 0;
        while focuser.is_moving() && ticks < limit {
            focuser.tick();
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_new_uses_defaults() {
        let f = focuser();
        assert_eq!(f.position(), 0);
        assert_eq!(f.target(), 0);
        assert_eq!(f.resolution(), Resolution::Fine);
        assert_eq!(f.speed_divisor(), 2);
        assert!(!f.hold());
        assert_eq!(f.driver().microsteps, 32);
        assert!(!f.driver().enabled);
        assert!(!f.is_moving());
    }

    #[test]
    fn test_move_forward_to_target() {
        let mut f = focuser();
        assert!(f.set_target(100));
        f.go();
        run_until_idle(&mut f, 10_000);
        assert_eq!(f.position(), 100);
        assert_eq!(f.driver().forward_steps, 100);
        assert_eq!(f.driver().reverse_steps, 0);
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_move_reverse_to_target() {
        let mut f = focuser();
        f.set_position(50);
        f.take_persist_request();
        f.set_target(20);
        f.go();
        run_until_idle(&mut f, 10_000);
        assert_eq!(f.position(), 20);
        assert_eq!(f.driver().reverse_steps, 30);
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_no_step_while_settling() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_target(5);
        f.go();

        f.tick();
        assert!(f.driver().enabled);
        assert_eq!(
            f.state(),
            MotionState::Enabling {
                ticks_remaining: SETTLE
            }
        );

        for _ in 0..SETTLE {
            f.tick();
            assert_eq!(f.driver().total_steps(), 0);
        }
        assert_eq!(f.state(), MotionState::Moving);

        f.tick();
        assert_eq!(f.driver().total_steps(), 1);
        assert_eq!(f.position(), 1);
    }

    #[test]
    fn test_zero_settle_steps_immediately() {
        let config = FocuserConfig {
            enable_settle_ticks: 0,
            ..test_config()
        };
        let mut f = Focuser::new(MockStepper::default(), config);
        f.set_speed_divisor(1);
        f.set_target(3);
        f.go();
        f.tick();
        assert!(f.driver().enabled);
        assert_eq!(f.position(), 1);
    }

    #[test]
    fn test_speed_divisor_spaces_steps() {
        let mut f = focuser();
        f.driver_mut().enabled = true;
        f.set_speed_divisor(4);
        f.set_target(10);
        f.go();

        for _ in 0..3 {
            f.tick();
        }
        assert_eq!(f.position(), 0);
        f.tick();
        assert_eq!(f.position(), 1);
        for _ in 0..4 {
            f.tick();
        }
        assert_eq!(f.position(), 2);
    }

    #[test]
    fn test_zero_divisor_behaves_as_one() {
        let mut f = focuser();
        f.driver_mut().enabled = true;
        f.set_speed_divisor(0);
        f.set_target(3);
        f.go();
        f.tick();
        f.tick();
        assert_eq!(f.position(), 2);
    }

    #[test]
    fn test_delayed_disable_after_arrival() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_target(2);
        f.go();
        run_until_idle(&mut f, 100);
        assert!(f.driver().enabled);

        for _ in 0..DISABLE_DELAY - 1 {
            f.tick();
            assert!(f.driver().enabled);
        }
        f.tick();
        assert!(!f.driver().enabled);
        assert_eq!(f.driver().disable_calls, 1);
    }

    #[test]
    fn test_hold_keeps_driver_enabled() {
        let mut f = focuser();
        f.set_hold(true);
        assert!(f.driver().enabled);
        f.set_target(2);
        f.go();
        run_until_idle(&mut f, 100);
        for _ in 0..DISABLE_DELAY * 2 {
            f.tick();
        }
        assert!(f.driver().enabled);
        assert_eq!(f.driver().disable_calls, 0);
    }

    #[test]
    fn test_hold_disable_goes_through_delay() {
        let mut f = focuser();
        f.set_hold(true);
        f.set_hold(false);
        assert!(f.driver().enabled);
        for _ in 0..DISABLE_DELAY {
            f.tick();
        }
        assert!(!f.driver().enabled);
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_stop_freezes_position() {
        let mut f = focuser();
        f.set_position(1000);
        f.set_speed_divisor(1);
        f.set_target(4000);
        f.go();
        for _ in 0..20 {
            f.tick();
        }
        let frozen = f.position();
        assert!(frozen > 1000);

        f.stop();
        assert!(!f.is_moving());
        assert_eq!(f.target(), frozen);

        let steps = f.driver().total_steps();
        for _ in 0..20 {
            f.tick();
        }
        assert_eq!(f.position(), frozen);
        assert_eq!(f.driver().total_steps(), steps);
    }

    #[test]
    fn test_setters_refused_while_moving() {
        let mut f = focuser();
        f.set_target(100);
        f.go();
        f.take_persist_request();

        assert!(!f.set_position(5));
        assert!(!f.set_target(7));
        assert!(!f.set_resolution(Resolution::Coarse));
        assert!(!f.set_speed_divisor(9));

        assert_eq!(f.position(), 0);
        assert_eq!(f.target(), 100);
        assert_eq!(f.resolution(), Resolution::Fine);
        assert_eq!(f.speed_divisor(), 2);
        assert!(!f.take_persist_request());
    }

    #[test]
    fn test_set_resolution_updates_driver() {
        let mut f = focuser();
        assert!(f.set_resolution(Resolution::Coarse));
        assert_eq!(f.driver().microsteps, 8);
        assert!(f.take_persist_request());
        assert!(!f.take_persist_request());
    }

    #[test]
    fn test_go_at_target_arrives_on_next_eligible_tick() {
        let mut f = focuser();
        f.go();
        assert!(f.is_moving());
        f.tick();
        f.tick();
        assert!(!f.is_moving());
        assert_eq!(f.driver().total_steps(), 0);
        assert!(!f.driver().enabled);
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_force_disable_ignores_hold() {
        let mut f = focuser();
        f.set_hold(true);
        f.force_disable();
        assert!(!f.driver().enabled);
        assert!(f.hold());
        for _ in 0..DISABLE_DELAY * 2 {
            f.tick();
        }
        assert!(!f.driver().enabled);
        assert_eq!(f.driver().enable_calls, 1);
    }

    #[test]
    fn test_force_disable_keeps_move() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_target(0x4000);
        f.go();
        for _ in 0..100 {
            f.tick();
        }
        let before = f.position();
        assert!(before > 0);

        f.force_disable();
        assert!(!f.driver().enabled);
        assert!(f.is_moving());
        assert_eq!(f.target(), 0x4000);
        assert_eq!(f.position(), before);

        // Re-enable, settle, then resume stepping
        f.tick();
        assert!(f.driver().enabled);
        assert_eq!(f.driver().enable_calls, 2);
        for _ in 0..SETTLE {
            f.tick();
        }
        assert_eq!(f.position(), before);
        f.tick();
        assert_eq!(f.position(), before + 1);

        run_until_idle(&mut f, 0x8000);
        assert_eq!(f.position(), 0x4000);
    }

    #[test]
    fn test_force_disable_while_settling() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_target(10);
        f.go();
        f.tick();
        assert!(matches!(f.state(), MotionState::Enabling { .. }));

        f.force_disable();
        assert!(!f.driver().enabled);
        assert_eq!(f.state(), MotionState::Moving);
        f.tick();
        assert!(f.driver().enabled);
        assert_eq!(f.driver().total_steps(), 0);
    }

    #[test]
    fn test_request_persist_after_take() {
        let mut f = focuser();
        f.set_speed_divisor(4);
        assert!(f.take_persist_request());
        f.request_persist();
        assert!(f.take_persist_request());
        assert!(!f.take_persist_request());
    }

    #[test]
    fn test_stalls_at_upper_bound() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_position(65530);
        f.set_target(65535);
        f.go();
        run_until_idle(&mut f, 100);
        assert_eq!(f.position(), 65535);
        assert_eq!(f.driver().forward_steps, 5);

        f.go();
        for _ in 0..20 {
            f.tick();
        }
        assert!(!f.is_moving());
        assert_eq!(f.position(), 65535);
        assert_eq!(f.driver().forward_steps, 5);
    }

    #[test]
    fn test_stalls_at_lower_bound() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_position(5);
        f.set_target(0);
        f.go();
        run_until_idle(&mut f, 100);
        assert_eq!(f.position(), 0);
        assert_eq!(f.driver().reverse_steps, 5);
        assert_eq!(f.driver().forward_steps, 0);

        f.go();
        for _ in 0..20 {
            f.tick();
        }
        assert_eq!(f.position(), 0);
        assert_eq!(f.driver().reverse_steps, 5);
    }

    #[test]
    fn test_driver_enabled_once_per_move() {
        let mut f = focuser();
        f.set_speed_divisor(1);
        f.set_target(50);
        f.go();
        run_until_idle(&mut f, 1_000);
        assert_eq!(f.position(), 50);
        assert_eq!(f.driver().enable_calls, 1);
    }

    #[test]
    fn test_apply_settings() {
        let mut f = focuser();
        f.apply_settings(&PersistedSettings {
            position: 0x1234,
            resolution: Resolution::Coarse,
            speed_divisor: 8,
            hold: true,
        });
        assert_eq!(f.position(), 0x1234);
        assert_eq!(f.target(), 0x1234);
        assert_eq!(f.driver().microsteps, 8);
        assert!(f.driver().enabled);
        assert_eq!(f.settings().speed_divisor, 8);
        assert!(!f.take_persist_request());
    }

    proptest! {
        #[test]
        fn prop_reaches_target_one_step_at_a_time(
            start in 0u16..=u16::MAX,
            offset in -2000i32..=2000,
            divisor in 0u8..4,
        ) {
            let target = (start as i32 + offset).clamp(0, u16::MAX as i32) as u16;

            let mut f = focuser();
            f.set_position(start);
            f.set_speed_divisor(divisor);
            f.set_target(target);
            f.go();

            let mut last = start;
            let mut guard = 0u32;
            while f.is_moving() {
                f.tick();
                let now = f.position();
                prop_assert!((now as i32 - last as i32).abs() <= 1);
                if start < target {
                    prop_assert!(now >= last);
                } else {
                    prop_assert!(now <= last);
                }
                last = now;
                guard += 1;
                prop_assert!(guard < 20_000);
            }

            prop_assert_eq!(f.position(), target);
            let steps = f.driver().total_steps();
            for _ in 0..50 {
                f.tick();
            }
            prop_assert_eq!(f.position(), target);
            prop_assert_eq!(f.driver().total_steps(), steps);
        }
    }
}

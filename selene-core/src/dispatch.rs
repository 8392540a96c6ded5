//! Command dispatch
//!
//! Applies a decoded Moonlite command to the focuser and builds the reply,
//! if the command has one. Set-commands arriving mid-move are dropped
//! without a reply, as Moonlite clients expect.

use selene_protocol::{Command, Reply};

use crate::config::Resolution;
use crate::motion::Focuser;
use crate::traits::StepperDriver;

/// Reported by `GV`
pub const FIRMWARE_VERSION: &str = "01";

/// Reported by `GB`; the board has no backlight
const BACKLIGHT_VALUE: &str = "00";

/// Reported by `GT`; the board has no temperature sensor
const TEMPERATURE_VALUE: &str = "0000";

/// `GH` reply when fine resolution is selected
const HALF_STEP_ON: u8 = 0xFF;

/// Execute a command against the focuser
pub fn dispatch<D: StepperDriver>(focuser: &mut Focuser<D>, command: Command) -> Option<Reply> {
    if command.requires_idle() && focuser.is_moving() {
        debug!("ignoring {:?} while moving", command);
        return None;
    }

    match command {
        Command::Stop => {
            focuser.stop();
            None
        }
        Command::GetPosition => Some(Reply::Hex16(focuser.position())),
        Command::SetPosition(position) => {
            focuser.set_position(position);
            None
        }
        Command::GetTarget => Some(Reply::Hex16(focuser.target())),
        Command::SetTarget(target) => {
            focuser.set_target(target);
            None
        }
        Command::Go => {
            focuser.go();
            None
        }
        Command::GetHalfStep => Some(Reply::Hex8(if focuser.resolution().is_fine() {
            HALF_STEP_ON
        } else {
            0
        })),
        Command::SetFullStep => {
            focuser.set_resolution(Resolution::Coarse);
            None
        }
        Command::SetHalfStep => {
            focuser.set_resolution(Resolution::Fine);
            None
        }
        Command::GetMoving => Some(Reply::flag(focuser.is_moving())),
        Command::GetVersion => Some(Reply::Text(FIRMWARE_VERSION)),
        Command::GetBacklight => Some(Reply::Text(BACKLIGHT_VALUE)),
        Command::GetSpeed => Some(Reply::Hex8(focuser.speed_divisor())),
        Command::SetSpeed(divisor) => {
            focuser.set_speed_divisor(divisor);
            None
        }
        Command::GetTemperature => Some(Reply::Text(TEMPERATURE_VALUE)),
        Command::HoldEnable => {
            focuser.set_hold(true);
            None
        }
        Command::HoldDisable => {
            focuser.set_hold(false);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FocuserConfig;
    use crate::traits::stepper::mock::MockStepper;
    use selene_protocol::FrameParser;

    fn focuser() -> Focuser<MockStepper> {
        Focuser::new(MockStepper::default(), FocuserConfig::default())
    }

    /// Feed raw serial bytes and collect encoded replies
    fn send(focuser: &mut Focuser<MockStepper>, bytes: &[u8]) -> Vec<u8> {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        for &byte in bytes {
            if let Ok(Some(frame)) = parser.feed(byte) {
                if let Ok(command) = Command::from_frame(&frame) {
                    if let Some(reply) = dispatch(focuser, command) {
                        out.extend_from_slice(&reply.encode());
                    }
                }
            }
        }
        out
    }

    fn run_until_idle(focuser: &mut Focuser<MockStepper>) {
        for _ in 0..1_000_000 {
            if !focuser.is_moving() {
                return;
            }
            focuser.tick();
        }
        panic!("focuser never arrived");
    }

    #[test]
    fn test_move_to_target_and_report() {
        let mut f = focuser();
        assert!(send(&mut f, b":SN4000#:FG#").is_empty());
        run_until_idle(&mut f);
        assert_eq!(send(&mut f, b":GP#"), b"4000#");
        assert_eq!(send(&mut f, b":GN#"), b"4000#");
        assert_eq!(send(&mut f, b":GI#"), b"00#");
    }

    #[test]
    fn test_fixed_replies() {
        let mut f = focuser();
        assert_eq!(send(&mut f, b":GV#"), b"01#");
        assert_eq!(send(&mut f, b":GT#"), b"0000#");
        assert_eq!(send(&mut f, b":GB#"), b"00#");
    }

    #[test]
    fn test_set_position_ignored_while_moving() {
        let mut f = focuser();
        send(&mut f, b":SN0100#:FG#");
        assert_eq!(send(&mut f, b":GI#"), b"01#");
        assert!(send(&mut f, b":SP1234#").is_empty());
        assert_eq!(f.position(), 0);
    }

    #[test]
    fn test_setters_ignored_while_moving() {
        let mut f = focuser();
        send(&mut f, b":SN0100#:FG#");
        f.take_persist_request();
        assert!(send(&mut f, b":SN0200#:SF#:SD08#").is_empty());
        assert_eq!(f.target(), 0x100);
        assert_eq!(f.resolution(), Resolution::Fine);
        assert_eq!(f.speed_divisor(), 2);
        assert!(!f.take_persist_request());
    }

    #[test]
    fn test_stop_while_moving() {
        let mut f = focuser();
        send(&mut f, b":SP1000#:SN4000#:FG#");
        for _ in 0..100 {
            f.tick();
        }
        let frozen = f.position();
        assert!(frozen > 0x1000);

        send(&mut f, b":FQ#");
        assert!(!f.is_moving());
        assert_eq!(f.target(), frozen);

        for _ in 0..100 {
            f.tick();
        }
        assert_eq!(f.position(), frozen);
        assert_eq!(send(&mut f, b":GI#"), b"00#");
    }

    #[test]
    fn test_resolution_commands() {
        let mut f = focuser();
        assert_eq!(send(&mut f, b":GH#"), b"FF#");
        send(&mut f, b":SF#");
        assert_eq!(f.driver().microsteps, 8);
        assert_eq!(send(&mut f, b":GH#"), b"00#");
        send(&mut f, b":SH#");
        assert_eq!(f.driver().microsteps, 32);
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_speed_commands() {
        let mut f = focuser();
        assert_eq!(send(&mut f, b":GD#"), b"02#");
        send(&mut f, b":SD20#");
        assert_eq!(send(&mut f, b":GD#"), b"20#");
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_set_position_persists() {
        let mut f = focuser();
        send(&mut f, b":SPabcd#");
        assert_eq!(send(&mut f, b":GP#"), b"ABCD#");
        assert!(f.take_persist_request());
    }

    #[test]
    fn test_set_target_does_not_persist() {
        let mut f = focuser();
        send(&mut f, b":SN0010#");
        assert!(!f.take_persist_request());
    }

    #[test]
    fn test_hold_commands() {
        let mut f = focuser();
        send(&mut f, b":HE#");
        assert!(f.hold());
        assert!(f.driver().enabled);
        assert!(f.take_persist_request());

        send(&mut f, b":HD#");
        assert!(!f.hold());
        assert!(f.take_persist_request());
        for _ in 0..f.config().disable_delay_ticks {
            f.tick();
        }
        assert!(!f.driver().enabled);
    }

    #[test]
    fn test_unknown_command_is_silent() {
        let mut f = focuser();
        assert!(send(&mut f, b":XX#:C#:#").is_empty());
        assert!(!f.take_persist_request());
    }
}

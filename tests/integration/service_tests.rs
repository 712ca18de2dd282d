//! End-to-end command surface: JSON in, real drivers on mock channels,
//! JSON and events out.

use std::time::Duration;

use servolight::app::commands::CommandError;
use servolight::app::events::ActuatorEvent;
use servolight::app::service::ActuatorService;
use servolight::config::{ActuatorConfig, CommandLimits};
use servolight::drivers::rgb_light::IndicatorLight;
use servolight::drivers::servo::Servo;
use servolight::error::Error;

use crate::mock_hw::{rgb_channels, wait_until, MockPwm, RecordingSink};

struct Rig {
    service: ActuatorService<Servo<MockPwm>, IndicatorLight<MockPwm>>,
    servo_pwm: MockPwm,
    rgb: [MockPwm; 3],
    sink: RecordingSink,
}

fn rig_with(limits: CommandLimits, init_servo: bool) -> Rig {
    let config = ActuatorConfig::default();
    let servo_pwm = MockPwm::new();
    let servo = Servo::new(servo_pwm.clone(), config.servo.clone());
    if init_servo {
        servo.initialize().unwrap();
    }
    let (chans, rgb) = rgb_channels();
    let mut light = IndicatorLight::new(chans, config.light.clone());
    light.initialize().unwrap();
    Rig {
        service: ActuatorService::new(servo, light, limits),
        servo_pwm,
        rgb,
        sink: RecordingSink::new(),
    }
}

fn rig() -> Rig {
    let limits = CommandLimits {
        burst: 100,
        rate_per_sec: 100,
        ..CommandLimits::default()
    };
    rig_with(limits, true)
}

impl Rig {
    fn send(&mut self, json: &str) -> String {
        self.service.handle_json(json, &mut self.sink)
    }
}

#[test]
fn set_rgb_lights_the_indicator() {
    let mut r = rig();
    let reply = r.send(r#"{"name":"rgb_light.set_rgb","arguments":{"r":255,"g":128,"b":0}}"#);
    assert_eq!(reply, r#"{"ok":true}"#);
    assert_eq!(r.rgb[0].last_duty(), Some(255));
    assert_eq!(r.rgb[1].last_duty(), Some(128));
    assert_eq!(r.rgb[2].last_duty(), Some(0));

    assert_eq!(r.send(r#"{"name":"rgb_light.turn_off"}"#), r#"{"ok":true}"#);
    assert_eq!(r.sink.last(), Some(&ActuatorEvent::LightOff));
    assert!(r.rgb.iter().all(|c| c.last_duty() == Some(0)));
}

#[test]
fn preset_then_get_angle() {
    let mut r = rig();
    assert_eq!(
        r.send(r#"{"name":"servo.set_preset","arguments":{"preset":"0"}}"#),
        r#"{"ok":true}"#
    );
    assert_eq!(r.send(r#"{"name":"servo.get_angle"}"#), r#"{"angle":0}"#);
    assert_eq!(r.sink.events, vec![ActuatorEvent::AngleSet(0)]);
}

#[test]
fn trim_over_json_shifts_duty_but_not_angle() {
    let mut r = rig();
    assert_eq!(
        r.send(r#"{"name":"servo.set_trim","arguments":{"trim":5}}"#),
        r#"{"ok":true}"#
    );
    assert_eq!(r.send(r#"{"name":"servo.set_angle","arguments":{"angle":90}}"#), r#"{"ok":true}"#);
    let expected = r.service.servo().duty_for(95);
    assert_eq!(r.servo_pwm.last_duty(), Some(expected));
    assert_eq!(r.send(r#"{"name":"servo.get_angle"}"#), r#"{"angle":90}"#);
    assert_eq!(r.send(r#"{"name":"servo.get_trim"}"#), r#"{"trim":5}"#);
    assert_eq!(
        r.sink.events,
        vec![ActuatorEvent::TrimSet(5), ActuatorEvent::AngleSet(90)]
    );

    let reply = r.send(r#"{"name":"servo.set_trim","arguments":{"trim":45}}"#);
    assert_eq!(reply, r#"{"ok":false,"error":"argument 'trim' out of range"}"#);
    assert_eq!(r.service.servo().trim(), 5);
}

#[test]
fn out_of_range_never_reaches_hardware() {
    let mut r = rig();
    let writes_before = r.servo_pwm.writes().len();
    let reply = r.send(r#"{"name":"servo.set_angle","arguments":{"angle":-1}}"#);
    assert_eq!(reply, r#"{"ok":false,"error":"argument 'angle' out of range"}"#);
    assert_eq!(r.servo_pwm.writes().len(), writes_before);
    assert_eq!(
        r.sink.last(),
        Some(&ActuatorEvent::CommandRejected(CommandError::OutOfRange("angle")))
    );
}

#[test]
fn oscillate_and_stop_over_json() {
    let mut r = rig();
    let reply = r.send(
        r#"{"name":"servo.oscillate","arguments":{"start_angle":30,"end_angle":150,"cycles":10,"period_ms":5000}}"#,
    );
    assert_eq!(reply, r#"{"ok":true}"#);
    assert!(r.service.servo().is_oscillating());

    assert_eq!(r.send(r#"{"name":"servo.stop"}"#), r#"{"ok":true}"#);
    assert!(!r.service.servo().is_oscillating());
    assert_eq!(
        r.sink.events,
        vec![
            ActuatorEvent::OscillationStarted {
                start_angle: 30,
                end_angle: 150,
                cycles: 10,
                period_ms: 5000
            },
            ActuatorEvent::OscillationStopped { was_running: true },
        ]
    );

    // Idle stop is still a success.
    assert_eq!(r.send(r#"{"name":"servo.stop"}"#), r#"{"ok":true}"#);
    assert_eq!(
        r.sink.last(),
        Some(&ActuatorEvent::OscillationStopped { was_running: false })
    );
}

#[test]
fn oscillation_finishes_on_its_own() {
    let limits = CommandLimits {
        min_period_ms: 20,
        rate_per_sec: 100,
        burst: 100,
        ..CommandLimits::default()
    };
    let mut r = rig_with(limits, true);
    r.send(r#"{"name":"servo.oscillate","arguments":{"start_angle":0,"end_angle":90,"cycles":1,"period_ms":20}}"#);
    assert!(wait_until(Duration::from_secs(2), || !r.service.servo().is_oscillating()));
    assert_eq!(r.send(r#"{"name":"servo.get_angle"}"#), r#"{"angle":90}"#);
}

#[test]
fn uninitialized_servo_reports_error() {
    let mut r = rig_with(CommandLimits::default(), false);
    let reply = r.send(r#"{"name":"servo.set_angle","arguments":{"angle":10}}"#);
    assert_eq!(reply, r#"{"ok":false,"error":"actuator not initialized"}"#);
    assert_eq!(
        r.sink.last(),
        Some(&ActuatorEvent::CommandRejected(CommandError::Actuator(Error::NotInitialized)))
    );
    // The light is unaffected.
    assert_eq!(r.send(r#"{"name":"rgb_light.turn_on"}"#), r#"{"ok":true}"#);
}

#[test]
fn garbage_and_unknown_tools() {
    let mut r = rig();
    assert_eq!(r.send("{{{"), r#"{"ok":false,"error":"malformed tool call"}"#);
    assert_eq!(
        r.send(r#"{"name":"servo.moonwalk"}"#),
        r#"{"ok":false,"error":"unknown tool"}"#
    );
}

#[test]
fn flood_is_rate_limited() {
    let limits = CommandLimits {
        rate_per_sec: 1,
        burst: 3,
        ..CommandLimits::default()
    };
    let mut r = rig_with(limits, true);
    let replies: Vec<String> = (0..5).map(|_| r.send(r#"{"name":"servo.get_angle"}"#)).collect();
    assert_eq!(replies[..3], [r#"{"angle":90}"#; 3]);
    assert_eq!(replies[4], r#"{"ok":false,"error":"rate limited"}"#);
}

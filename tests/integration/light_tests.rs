//! RGB indicator against three recording PWM channels.

use servolight::config::LightConfig;
use servolight::drivers::rgb_light::IndicatorLight;
use servolight::error::Error;

use crate::mock_hw::{rgb_channels, MockPwm, MOCK_RC};

fn light() -> (IndicatorLight<MockPwm>, [MockPwm; 3]) {
    let (chans, handles) = rgb_channels();
    let mut light = IndicatorLight::new(chans, LightConfig::default());
    light.initialize().unwrap();
    (light, handles)
}

fn duties(h: &[MockPwm; 3]) -> [Option<u32>; 3] {
    [h[0].last_duty(), h[1].last_duty(), h[2].last_duty()]
}

#[test]
fn initialize_configures_5khz_8bit_and_goes_dark() {
    let (light, h) = light();
    for (i, ch) in h.iter().enumerate() {
        let cfg = ch.configured_with().unwrap();
        assert_eq!(cfg.frequency_hz, 5_000);
        assert_eq!(cfg.resolution_bits, 8);
        assert_eq!(cfg.gpio, LightConfig::default().gpio[i]);
    }
    assert!(!light.is_on());
    assert_eq!(duties(&h), [Some(0); 3]);
}

#[test]
fn round_trip_colour_through_off_and_on() {
    let (mut light, h) = light();
    light.set_color(200, 10, 5).unwrap();
    light.turn_on().unwrap();
    assert!(light.is_on());
    assert_eq!(light.color(), (200, 10, 5));
    assert_eq!(duties(&h), [Some(200), Some(10), Some(5)]);

    light.turn_off().unwrap();
    assert_eq!(duties(&h), [Some(0); 3]);
    light.turn_on().unwrap();
    assert_eq!(duties(&h), [Some(200), Some(10), Some(5)]);
}

#[test]
fn turn_off_wins_over_late_set_color() {
    let (mut light, h) = light();
    light.turn_on().unwrap();
    light.set_color(50, 60, 70).unwrap();
    light.turn_off().unwrap();
    assert_eq!(duties(&h), [Some(0); 3]);
}

#[test]
fn partial_write_is_not_rolled_back() {
    let (mut light, h) = light();
    light.turn_on().unwrap();
    h[1].fail_writes(true);

    assert_eq!(light.set_color(9, 8, 7), Err(Error::HardwareWrite(MOCK_RC)));
    assert_eq!(h[0].last_duty(), Some(9), "red committed before green failed");
    assert_eq!(h[2].last_duty(), Some(0), "blue never written");
    assert_eq!(light.color(), (9, 8, 7));
}

#[test]
fn turn_off_attempts_every_channel() {
    let (mut light, h) = light();
    light.set_color(1, 2, 3).unwrap();
    light.turn_on().unwrap();
    h[0].fail_writes(true);
    assert!(light.turn_off().is_err());
    assert_eq!(h[1].last_duty(), Some(0));
    assert_eq!(h[2].last_duty(), Some(0));
    assert!(!light.is_on());
}

#[test]
fn drop_releases_all_channels() {
    let (light, h) = light();
    drop(light);
    assert!(h.iter().all(MockPwm::released));
}

//! Produtor de frames: amostra os sensores uma vez e codifica.

use crate::protocol::encode_frame;
use crate::sensors::{SensorReadError, SoundSensor, TouchSensor};
use crate::types::{EncodedFrame, SensorFrame, TouchPin};

/// Produz um [`EncodedFrame`] por chamada a partir de um backend de sensores.
///
/// Não guarda histórico nem estado entre chamadas; qualquer erro de
/// leitura é devolvido imediatamente, sem retry.
#[derive(Debug)]
pub struct FrameProducer<B> {
    sensors: B,
}

impl<B: TouchSensor + SoundSensor> FrameProducer<B> {
    pub fn new(sensors: B) -> Self {
        Self { sensors }
    }

    /// Lê toque 0, toque 1 e nível de som, nessa ordem, uma vez cada.
    pub fn sample(&mut self) -> Result<SensorFrame, SensorReadError> {
        let touch0 = self.sensors.is_touched(TouchPin::P0)?;
        let touch1 = self.sensors.is_touched(TouchPin::P1)?;
        let sound_level = self.sensors.sound_level()?;

        Ok(SensorFrame {
            touch0,
            touch1,
            sound_level,
        })
    }

    /// Amostra e codifica: `"touch0,touch1,soundLevel"`.
    pub fn sample_and_encode(&mut self) -> Result<EncodedFrame, SensorReadError> {
        self.sample().map(|frame| encode_frame(&frame))
    }

    pub fn sensors(&self) -> &B {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut B {
        &mut self.sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{FixedSensors, MissingSensor, SensorKind, SensorPair};

    fn producer(t0: bool, t1: bool, s: u16) -> FrameProducer<FixedSensors> {
        FrameProducer::new(FixedSensors::new(t0, t1, s))
    }

    #[test]
    fn encodes_every_touch_pair_and_sound_level() {
        for t0 in [false, true] {
            for t1 in [false, true] {
                for s in 0..=255u16 {
                    let got = producer(t0, t1, s).sample_and_encode().unwrap();
                    let want = format!("{},{},{}", u8::from(t0), u8::from(t1), s);
                    assert_eq!(got.as_str(), want);
                }
            }
        }
    }

    #[test]
    fn touched_first_pin_with_sound() {
        let frame = producer(true, false, 37).sample_and_encode().unwrap();
        assert_eq!(frame.as_str(), "1,0,37");
    }

    #[test]
    fn all_quiet() {
        let frame = producer(false, false, 0).sample_and_encode().unwrap();
        assert_eq!(frame.as_str(), "0,0,0");
    }

    #[test]
    fn sound_boundaries_are_not_truncated() {
        assert_eq!(producer(false, false, 0).sample_and_encode().unwrap().as_str(), "0,0,0");
        assert_eq!(
            producer(false, false, 255).sample_and_encode().unwrap().as_str(),
            "0,0,255"
        );
    }

    #[test]
    fn repeated_calls_are_equal() {
        let mut p = producer(true, true, 128);
        let a = p.sample_and_encode().unwrap();
        let b = p.sample_and_encode().unwrap();
        assert_eq!(a, b);
        assert_eq!(*p.sensors(), FixedSensors::new(true, true, 128));
    }

    #[test]
    fn follows_sensor_changes_between_calls() {
        let mut p = producer(false, false, 3);
        assert_eq!(p.sample_and_encode().unwrap().as_str(), "0,0,3");
        p.sensors_mut().frame.touch1 = true;
        assert_eq!(p.sample_and_encode().unwrap().as_str(), "0,1,3");
    }

    #[test]
    fn missing_hardware_fails_without_frame() {
        let mut p = FrameProducer::new(MissingSensor);
        assert_eq!(
            p.sample_and_encode(),
            Err(SensorReadError::Unavailable(SensorKind::Touch(TouchPin::P0)))
        );
    }

    #[test]
    fn missing_microphone_fails_after_touch_reads() {
        let mut p = FrameProducer::new(SensorPair::new(
            FixedSensors::new(true, true, 0),
            MissingSensor,
        ));
        assert_eq!(
            p.sample_and_encode(),
            Err(SensorReadError::Unavailable(SensorKind::Sound))
        );
    }
}

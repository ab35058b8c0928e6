//! ADC Driver
//!
//! Single-channel blocking ADC reads for the temperature sensor input.

use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::peripherals::ADC1;

use crate::link::hardware::AnalogInput;

/// Sensor input on ADC1
pub struct SensorAdc<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

impl SensorAdc<'_> {
    /// Create the sensor ADC on one channel
    #[must_use]
    pub fn new(adc: ADC1, channel: AnyAdcChannel<ADC1>) -> Self {
        let mut adc = Adc::new(adc);
        // Long sample time for the high source impedance of the sensor
        adc.set_sample_time(SampleTime::CYCLES247_5);
        Self { adc, channel }
    }

    /// Read one raw 12-bit sample
    pub fn read(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}

impl AnalogInput for SensorAdc<'_> {
    fn read_raw(&mut self) -> u16 {
        self.read()
    }
}

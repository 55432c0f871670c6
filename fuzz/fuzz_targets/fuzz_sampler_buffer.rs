//! Fuzz target: thermocouple sample bursts
//!
//! Feeds arbitrary ADC bursts through the sampler's full measurement
//! cycle and verifies:
//! - No panics for any burst length, including empty and oversized
//! - The tip-check bias is never left driven after a check burst
//! - A reported temperature is always the conversion of the burst mean
//!
//! cargo fuzz run fuzz_sampler_buffer

#![no_main]

use libfuzzer_sys::fuzz_target;
use solderctl::app::ports::FrontEndPort;
use solderctl::config::ControllerConfig;
use solderctl::sensors::thermocouple::{SampleOutcome, ThermocoupleSampler, counts_to_celsius};

#[derive(Default)]
struct Pins {
    bias: bool,
}

impl FrontEndPort for Pins {
    fn set_heater_output(&mut self, _on: bool) {}
    fn set_tip_check_bias(&mut self, on: bool) {
        self.bias = on;
    }
    fn set_tip_clamp(&mut self, _clamped: bool) {}
}

fuzz_target!(|data: &[u8]| {
    let mut sampler = ThermocoupleSampler::new(&ControllerConfig::default());
    let mut pins = Pins::default();

    // First byte picks the burst length; the rest are little-endian samples.
    let Some((&len, rest)) = data.split_first() else {
        return;
    };
    let samples: Vec<u16> = rest
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]) & 0x0FFF)
        .collect();

    for (i, burst) in samples.chunks(usize::from(len).max(1)).enumerate() {
        if i % 3 == 0 {
            sampler.begin_tip_check(&mut pins);
        }
        match sampler.on_conversion_complete(burst, &mut pins) {
            SampleOutcome::TipCheck(_) => assert!(!pins.bias),
            SampleOutcome::Temperature(c) => {
                assert_eq!(c, counts_to_celsius(sampler.buffer_average()));
            }
            _ => {}
        }
    }
});

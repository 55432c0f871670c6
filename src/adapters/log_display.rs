//! Display adapter that renders frames as log lines.
//!
//! Stands in for the panel driver: frames go out at `debug`, messages at
//! `info`.

use log::{debug, info};

use crate::app::events::{DisplayMessage, StatusSnapshot};
use crate::app::ports::DisplayPort;

#[derive(Default)]
pub struct LogDisplay;

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayPort for LogDisplay {
    fn show_status(&mut self, status: &StatusSnapshot) {
        match status.tip_temperature {
            Ok(celsius) => debug!(
                "LCD   | {:?} | tip {}\u{00b0}C / {}\u{00b0}C | power {}",
                status.mode, celsius, status.target_c, status.power_half_cycles
            ),
            Err(e) => debug!(
                "LCD   | {:?} | tip --- ({}) / {}\u{00b0}C | {:?}",
                status.mode, e, status.target_c, status.tip_presence
            ),
        }
    }

    fn show_message(&mut self, message: DisplayMessage) {
        info!("LCD   | {}", message_text(message));
    }
}

/// Short text for each message code.
pub fn message_text(message: DisplayMessage) -> &'static str {
    match message {
        DisplayMessage::Off => "OFF",
        DisplayMessage::On => "ON",
        DisplayMessage::Wait => "WAIT",
        DisplayMessage::TipDetected => "TIP DETECTED",
        DisplayMessage::TipNotDetected => "NO TIP",
        DisplayMessage::TipCheckError => "TIP CHECK ERROR",
        DisplayMessage::AcNotDetected => "NO AC",
        DisplayMessage::Overheating => "OVERHEATING",
        DisplayMessage::ReadingError => "READING ERROR",
    }
}

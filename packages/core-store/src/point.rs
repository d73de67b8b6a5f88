//! Channel endpoints and their on/off behavior.
//!
//! A [`Point`] is a sign bound to a channel. Its [`PointKind`] decides how it
//! reacts when the channel changes state:
//!
//! | kind               | `apply_on`            | `apply_off`           |
//! |--------------------|-----------------------|-----------------------|
//! | `Transmitter`      | nothing               | nothing               |
//! | `Receiver`         | output high           | output low            |
//! | `InvertedReceiver` | output low            | output high           |
//! | `Screen`           | redraw showing ON     | redraw showing OFF    |
//!
//! The inverted receiver is its own kind rather than a flag on `Receiver`, so
//! the tag written by every backend is what selects the swapped behavior.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::location::{Location, Orientation};

pub const TRANSMITTER_TAG: &str = "[transmitter]";
pub const RECEIVER_TAG: &str = "[receiver]";
pub const INVERTER_TAG: &str = "[inverter]";
pub const SCREEN_TAG: &str = "[screen]";
pub const SCREEN_ON: &str = "ON";
pub const SCREEN_OFF: &str = "OFF";

/// Discriminator for the four endpoint variants.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Transmitter,
    Receiver,
    InvertedReceiver,
    Screen,
}

impl PointKind {
    pub const ALL: [PointKind; 4] = [
        PointKind::Transmitter,
        PointKind::Receiver,
        PointKind::InvertedReceiver,
        PointKind::Screen,
    ];

    /// The tag stored in files and in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::Transmitter => "transmitter",
            PointKind::Receiver => "receiver",
            PointKind::InvertedReceiver => "inverted_receiver",
            PointKind::Screen => "screen",
        }
    }

    /// Whether this kind drives an electrical output.
    pub fn is_receiver(&self) -> bool {
        matches!(self, PointKind::Receiver | PointKind::InvertedReceiver)
    }
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown point kind '{0}'")]
pub struct UnknownPointKind(pub String);

impl FromStr for PointKind {
    type Err = UnknownPointKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPointKind(s.to_string()))
    }
}

/// The world-side effects a point can have.
///
/// The host implements this over its block and sign API. Points call into it
/// from [`Point::apply_on`], [`Point::apply_off`] and [`Point::render`].
pub trait Actuator {
    /// Set the redstone output behind a receiver.
    fn set_powered(&mut self, at: &Location, facing: Orientation, powered: bool);

    /// Redraw the sign at a point.
    fn render(&mut self, at: &Location, lines: &[String]);
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    fn set_powered(&mut self, at: &Location, facing: Orientation, powered: bool) {
        (*self).set_powered(at, facing, powered)
    }

    fn render(&mut self, at: &Location, lines: &[String]) {
        (*self).render(at, lines)
    }
}

/// An endpoint bound to a channel.
///
/// `channel` is not serialized into channel files: the file that holds the
/// point already names its channel, and loading fills it back in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub kind: PointKind,
    #[serde(skip)]
    pub channel: String,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub display_text: String,
}

impl Point {
    pub fn new(kind: PointKind, location: Location, orientation: Orientation) -> Self {
        Self {
            kind,
            channel: String::new(),
            location,
            orientation,
            display_text: String::new(),
        }
    }

    pub fn transmitter(location: Location) -> Self {
        Self::new(PointKind::Transmitter, location, Orientation::default())
    }

    pub fn receiver(location: Location) -> Self {
        Self::new(PointKind::Receiver, location, Orientation::default())
    }

    pub fn inverted_receiver(location: Location) -> Self {
        Self::new(PointKind::InvertedReceiver, location, Orientation::default())
    }

    pub fn screen(location: Location) -> Self {
        Self::new(PointKind::Screen, location, Orientation::default())
    }

    /// The sign lines currently recorded for this point.
    pub fn display_lines(&self) -> Vec<String> {
        if self.display_text.is_empty() {
            return Vec::new();
        }
        self.display_text.lines().map(str::to_string).collect()
    }

    /// React to the channel turning on.
    pub fn apply_on(&mut self, channel_name: &str, actuator: &mut dyn Actuator) {
        match self.kind {
            PointKind::Transmitter => {}
            PointKind::Receiver => self.drive(channel_name, true, actuator),
            PointKind::InvertedReceiver => self.drive(channel_name, false, actuator),
            PointKind::Screen => self.show(channel_name, true, actuator),
        }
    }

    /// React to the channel turning off.
    pub fn apply_off(&mut self, channel_name: &str, actuator: &mut dyn Actuator) {
        match self.kind {
            PointKind::Transmitter => {}
            PointKind::Receiver => self.drive(channel_name, false, actuator),
            PointKind::InvertedReceiver => self.drive(channel_name, true, actuator),
            PointKind::Screen => self.show(channel_name, false, actuator),
        }
    }

    /// Draw the sign as it looks right after binding, before any state change.
    pub fn render(&mut self, channel_name: &str, actuator: &mut dyn Actuator) {
        let lines = self.sign_lines(channel_name, None);
        self.display(lines, actuator);
    }

    fn drive(&mut self, channel_name: &str, powered: bool, actuator: &mut dyn Actuator) {
        actuator.set_powered(&self.location, self.orientation, powered);
        let lines = self.sign_lines(channel_name, None);
        self.display(lines, actuator);
    }

    fn show(&mut self, channel_name: &str, on: bool, actuator: &mut dyn Actuator) {
        let lines = self.sign_lines(channel_name, Some(on));
        self.display(lines, actuator);
    }

    fn display(&mut self, lines: Vec<String>, actuator: &mut dyn Actuator) {
        actuator.render(&self.location, &lines);
        self.display_text = lines.join("\n");
    }

    fn sign_lines(&self, channel_name: &str, state: Option<bool>) -> Vec<String> {
        let mut lines = match self.kind {
            PointKind::Transmitter => vec![TRANSMITTER_TAG.to_string()],
            PointKind::Receiver => vec![RECEIVER_TAG.to_string()],
            PointKind::InvertedReceiver => vec![RECEIVER_TAG.to_string()],
            PointKind::Screen => vec![SCREEN_TAG.to_string()],
        };
        lines.push(channel_name.to_string());

        if self.kind == PointKind::InvertedReceiver {
            lines.push(INVERTER_TAG.to_string());
        }
        if let Some(on) = state {
            lines.push(if on { SCREEN_ON } else { SCREEN_OFF }.to_string());
        }
        lines
    }
}

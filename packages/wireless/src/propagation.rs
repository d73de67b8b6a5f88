//! Signal propagation: turning a channel on or off.

use std::collections::HashMap;

use wireless_core_store::{fold, Actuator, Channel, Error};

use crate::configuration::Configuration;

/// Tracks the live on/off state of every channel that has changed since
/// startup.
///
/// Live state is separate from the stored channel record. Nothing here writes
/// to storage until [`SignalEngine::save`] is called, so a restart without a
/// save loses the last state.
#[derive(Debug, Default)]
pub struct SignalEngine {
    states: HashMap<String, bool>,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live state of `name`, if it has been set since startup.
    pub fn state(&self, name: &str) -> Option<bool> {
        self.states.get(&fold(name)).copied()
    }

    /// Apply `state` to every point of `channel`.
    ///
    /// Each point decides its own effect; inverted receivers flip the signal
    /// themselves. Screens redraw even when the state did not change.
    pub fn propagate(channel: &mut Channel, state: bool, actuator: &mut dyn Actuator) {
        channel.set_state(state);
        let name = channel.name().as_str().to_string();
        for point in channel.points_mut() {
            if state {
                point.apply_on(&name, actuator);
            } else {
                point.apply_off(&name, actuator);
            }
        }
    }

    /// Load `name`, drive all of its points to `state` and remember the state.
    ///
    /// Returns the channel as it stands after propagation, sign text included.
    pub fn set_channel_state(
        &mut self,
        config: &Configuration,
        name: &str,
        state: bool,
        actuator: &mut dyn Actuator,
    ) -> Result<Channel, Error> {
        let mut channel = config.get_channel(name)?;
        Self::propagate(&mut channel, state, actuator);
        tracing::debug!(
            channel = %channel.name(),
            state,
            points = channel.points().len(),
            "propagated"
        );
        self.states.insert(channel.key().to_string(), state);
        Ok(channel)
    }

    /// Write the live state of `name` to storage.
    ///
    /// A channel whose state was never set since startup is left untouched.
    pub fn save(&self, config: &mut Configuration, name: &str) -> Result<(), Error> {
        match self.state(name) {
            Some(state) => config.save_channel_state(name, state),
            None => Ok(()),
        }
    }

    /// Forget a channel, e.g. after it was removed or renamed.
    pub fn forget(&mut self, name: &str) {
        self.states.remove(&fold(name));
    }
}

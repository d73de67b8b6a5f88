use std::collections::HashMap;

use wireless_redstone::{Actuator, Location, Orientation};

/// Stands in for the world: remembers the output and sign at every location.
#[derive(Default)]
pub struct World {
    pub powered: HashMap<Location, bool>,
    pub signs: HashMap<Location, Vec<String>>,
}

impl Actuator for World {
    fn set_powered(&mut self, at: &Location, _facing: Orientation, powered: bool) {
        self.powered.insert(at.clone(), powered);
    }

    fn render(&mut self, at: &Location, lines: &[String]) {
        self.signs.insert(at.clone(), lines.to_vec());
    }
}

pub fn at(x: i32) -> Location {
    Location::new("world", x, 64, 10)
}

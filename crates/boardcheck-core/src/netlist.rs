use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One pin-to-net assignment of a netlist component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinNet {
    pub pin: String,
    pub net: String,
}

/// A component as declared by the schematic netlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetlistComponent {
    pub reference: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub footprint: String,
    #[serde(default)]
    pub pins: Vec<PinNet>,
}

impl NetlistComponent {
    pub fn new(reference: &str, value: &str) -> Self {
        Self {
            reference: reference.to_string(),
            value: value.to_string(),
            footprint: String::new(),
            pins: Vec::new(),
        }
    }

    pub fn with_pin(mut self, pin: &str, net: &str) -> Self {
        self.pins.push(PinNet {
            pin: pin.to_string(),
            net: net.to_string(),
        });
        self
    }
}

/// The external netlist used to reconcile placed footprints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    #[serde(default)]
    pub components: Vec<NetlistComponent>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: NetlistComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn component(&self, reference: &str) -> Option<&NetlistComponent> {
        self.components.iter().find(|c| c.reference == reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.component(reference).is_some()
    }

    /// Pins grouped by net name, in net name order.
    pub fn nets(&self) -> BTreeMap<&str, Vec<(&str, &str)>> {
        let mut nets: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for component in &self.components {
            for pin in &component.pins {
                nets.entry(pin.net.as_str())
                    .or_default()
                    .push((component.reference.as_str(), pin.pin.as_str()));
            }
        }
        nets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nets_grouping() {
        let netlist = Netlist::new()
            .with_component(NetlistComponent::new("R1", "10k").with_pin("1", "GND").with_pin("2", "VCC"))
            .with_component(NetlistComponent::new("C1", "100n").with_pin("2", "GND"));
        let nets = netlist.nets();
        assert_eq!(nets["GND"], vec![("R1", "1"), ("C1", "2")]);
        assert!(netlist.contains("C1"));
        assert!(!netlist.contains("U1"));
    }
}

use chrono::{DateTime, Utc};

/// Unit reported for every appliance; the gateway only measures power draw.
pub const UNIT_WATT: &str = "W";

/// One appliance reading as captured by a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Appliance {
    /// `id` attribute of the appliance's `module` element.
    pub id: String,
    pub name: String,
    pub kind: String,
    pub current_power: f64,
    pub unit_of_measure: &'static str,
}

/// All readings captured by one successful fetch, in document order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub appliances: Vec<Appliance>,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(appliances: Vec<Appliance>) -> Self {
        Self {
            appliances,
            captured_at: Utc::now(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Appliance> {
        self.appliances.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.appliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appliances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appliance> {
        self.appliances.iter()
    }
}

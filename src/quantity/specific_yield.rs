use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Energy generated per unit of installed capacity (kWh/kWp) during a step.
///
/// Dimensionally this is time: equivalent full-load hours.
pub type SpecificYield = Quantity<0, 1, 0>;

impl Display for SpecificYield {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} kWh/kWp", self.0)
    }
}

impl Debug for SpecificYield {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}kWh/kWp", self.0)
    }
}

use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Cost per kilowatt-hour: tariffs, LCOE and storage capex per kWh of capacity.
pub type KilowattHourRate = Quantity<-1, -1, 1>;

/// Cost per kilowatt of installed peak capacity.
pub type KilowattRate = Quantity<-1, 0, 1>;

impl Display for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} /kWh", self.0)
    }
}

impl Debug for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}/kWh", self.0)
    }
}

impl Display for KilowattRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} /kWp", self.0)
    }
}

impl Debug for KilowattRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}/kWp", self.0)
    }
}

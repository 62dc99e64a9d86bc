pub mod balance;
pub mod battery;
pub mod cashflow;
pub mod costs;
pub mod design;
pub mod goal;
pub mod metrics;
pub mod series;
pub mod simulator;

pub use self::{
    balance::{EnergyBalance, Step, Totals},
    battery::StorageParameters,
    cashflow::{Cashflow, CashflowYear},
    costs::CostAssumptions,
    design::{Bound, Bounds, DesignParameters, Parameter},
    goal::{Goal, Indicator},
    metrics::Metrics,
    series::TimeSeries,
    simulator::{SimulationOptions, simulate},
};

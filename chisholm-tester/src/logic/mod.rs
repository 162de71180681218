pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::GameplayStrategy;
pub use reports::aggregate;
pub use seeds::resolve_seed_inputs;
pub use simulation::{DriveRecord, SimulationConfig, TesterAssets, simulate_drive};

pub mod emissions;
pub mod erp;
pub mod normalizer;

pub use emissions::{ActivityCategory, ActivityMatcher, EmissionFactors, EmissionsService};
pub use erp::ErpConnectorService;

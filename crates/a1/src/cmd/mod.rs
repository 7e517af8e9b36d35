//! Command modules for the A1 CLI.

pub mod analyze_code;
pub mod batch;
pub mod experiment;
pub mod extract_constructor;
pub mod fetch_source;
pub mod metrics;
pub mod read_state;
pub mod resolve_proxy;
pub mod results;
pub mod run;

pub use analyze_code::analyze_code;
pub use batch::batch;
pub use experiment::experiment;
pub use extract_constructor::extract_constructor;
pub use fetch_source::fetch_source;
pub use metrics::metrics;
pub use read_state::read_state;
pub use resolve_proxy::resolve_proxy;
pub use run::run;

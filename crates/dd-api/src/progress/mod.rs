pub mod aggregator;
pub mod container;
pub mod routes;

pub use aggregator::Completion;
pub use container::StatsContainer;
pub use routes::routes;

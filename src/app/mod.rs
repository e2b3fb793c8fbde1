mod cache;
pub mod state;

pub use cache::ChartCache;
pub use state::ChartState;

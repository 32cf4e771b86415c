pub mod cluster;
pub mod facility;
pub mod geo;

pub use cluster::ClusterIconTier;
pub use facility::*;
pub use geo::*;

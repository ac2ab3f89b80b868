pub mod artifacts;
pub mod dataset;
pub mod features;
pub mod providers;
pub mod recommender;
pub mod similarity;

pub use artifacts::Artifacts;
pub use dataset::DatasetLoader;
pub use features::FeatureBuilder;
pub use recommender::Recommender;
pub use similarity::SimilarityIndex;

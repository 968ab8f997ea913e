// Topic and cluster grouping — density topics, k-means, keywords.

pub mod density;
pub mod keywords;
pub mod kmeans;
pub mod traits;
pub mod translate;

pub use density::DensityTopicModel;
pub use kmeans::KMeans;
pub use traits::{group, Assignment, Grouper, Grouping};
pub use translate::{translate_keywords, LibreTranslateClient, Translator};

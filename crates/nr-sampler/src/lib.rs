pub mod score;
pub mod sampler;
pub mod temperature;
pub mod top_k;
pub mod top_p;
pub mod filter;
pub mod repetition;
pub mod select;

pub use score::ScoreVector;
pub use sampler::{Sampler, SamplerChain};
pub use temperature::TemperatureSampler;
pub use top_k::TopKSampler;
pub use top_p::TopPSampler;
pub use filter::{filter, DistributionFilter};
pub use repetition::{apply_repetition_penalty, RepetitionPenaltySampler};
pub use select::{DistSelector, GreedySelector, Selector};

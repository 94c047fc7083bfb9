pub mod allocation_service;
pub mod anomaly_service;
pub mod export_service;
pub mod population_service;
pub mod sample_size_service;
pub mod sampling_service;

pub use allocation_service::{AllocationRequest, AllocationService, SampleNote, SampleReport};
pub use anomaly_service::{AnomalyReport, AnomalyService};
pub use export_service::ExportService;
pub use population_service::{PopulationMetrics, PopulationService};
pub use sample_size_service::{
    ConfidenceLevel, Recommendation, RecommendationWarning, SampleSizeService,
};
pub use sampling_service::{SamplingRun, SamplingService};

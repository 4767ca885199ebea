pub mod advantage;
pub mod archive;
pub mod blood_score;
pub mod camp;
pub mod course;
pub mod dataset_export;
pub mod forest;
pub mod form_points;
pub mod history;
pub mod merit;
pub mod metrics;
pub mod pedigree;
pub mod pipeline;
pub mod recency;
pub mod results;

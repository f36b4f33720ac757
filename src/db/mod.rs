pub mod country_queries;
pub mod normalization_queries;
pub mod observation_queries;
pub mod run_log_queries;

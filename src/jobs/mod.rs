//! Scheduled and offline work: the daily scoring pipeline, the one-shot
//! historical backfill reducers, and the normalization-parameter
//! builder. Jobs are idempotent and fault-tolerant; a failing source
//! never takes a run down, it just leaves a null metric behind.

pub mod backfill;
pub mod daily_pipeline_job;
pub mod normalization_job;
pub mod scheduler;

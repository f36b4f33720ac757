pub mod indicators;
pub mod rate_limiter;
pub mod scoreboard_service;
pub mod scoring;

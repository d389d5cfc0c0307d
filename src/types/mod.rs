pub mod geography;
pub mod group_by;
pub mod statistic;
pub mod time_period;

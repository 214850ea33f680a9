pub mod analysis;
pub mod charts;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod table;

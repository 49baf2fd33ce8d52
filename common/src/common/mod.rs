pub mod labels;
pub mod tags;

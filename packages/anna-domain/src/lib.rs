pub mod calculator;
pub mod slenderness;

pub mod audit;
pub mod decide;
pub mod decisions;
pub mod dispatch;
pub mod quota;
pub mod relationship;
pub mod shared;

pub mod answer;
pub mod liveness;
pub mod notes;
pub mod question;

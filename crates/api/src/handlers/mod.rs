pub mod figure;
pub mod health;

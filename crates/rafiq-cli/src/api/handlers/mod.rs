pub mod goals;
pub mod health;
pub mod likes;
pub mod stories;

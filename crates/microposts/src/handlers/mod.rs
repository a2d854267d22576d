pub mod error;
pub mod extract;
pub mod microposts;
pub mod responses;
pub mod users;

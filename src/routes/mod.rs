pub mod auth;
pub mod buildings;
pub mod devices;
pub mod energy;
pub mod health;
pub mod invitations;
pub mod locations;
pub mod members;
pub mod metrics;
pub mod users;

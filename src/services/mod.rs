pub mod auth;
pub mod authz;
pub mod buildings;
pub mod devices;
pub mod email;
pub mod energy;
pub mod invitations;
pub mod locations;
pub mod memberships;
pub mod metrics;
pub mod notifications;

//! Domain types shared by the coordination layer and its collaborators.

pub mod balance;
pub mod capture;
pub mod money;
pub mod payment;
pub mod ports;

// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod exam;
pub mod home;
pub mod leaderboard;
pub mod profile;

pub mod admin;
pub mod config;
pub mod repository;
pub mod store;
pub mod web;

//! PostgreSQL implementation of the catalog repository.
//!
//! ## Tables read
//!
//! - `film_work`: root aggregates
//! - `genre`, `person`: child entities
//! - `genre_film_work`, `person_film_work`: join tables

mod catalog_repository;

pub use catalog_repository::PostgresCatalogRepository;

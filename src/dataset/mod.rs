//! # Dataset
//! src/dataset/mod.rs
//!
//! Tabla inmutable cargada una sola vez al arrancar y compartida (vía `Arc`)
//! por todos los workers. Al no mutarse nunca después de la carga, no
//! necesita sincronización.

pub mod table;

pub use table::{DatasetError, Row, Table};

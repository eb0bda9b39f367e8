pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
pub mod workspace;

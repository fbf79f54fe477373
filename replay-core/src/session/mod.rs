pub mod cancel;
pub mod controller;
pub mod probe;

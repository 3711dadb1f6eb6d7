// Domain layer: core models, rendered views and ports (interfaces).

pub mod model;
pub mod ports;
pub mod view;

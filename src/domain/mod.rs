// Domain layer: records, scan events and the ports the pipeline talks through.

pub mod model;
pub mod ports;

pub mod autoscale;

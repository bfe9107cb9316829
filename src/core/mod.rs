// Core execution engine: context, algorithm lifecycle, scheduler, run entry

pub mod algorithm;
pub mod context;
pub mod controller;
pub mod run;
pub mod scheduler;

pub use algorithm::Algorithm;
pub use context::{
    new_sim_clock, Exchange, ExchangeSettings, ExecutionContext, LiveClientFactory, Mode, SimClock,
};
pub use controller::AlgorithmController;
pub use run::{execute_algorithm, RunSettings};
pub use scheduler::{main_loop, next_boundary_index, InterruptFlag, SystemClock, WallClock};

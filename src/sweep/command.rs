pub mod run_sweep_cmd;

mod io;

pub use io::{init_first_run, load_cfg, load_cfg_from, save_cfg, save_cfg_to};

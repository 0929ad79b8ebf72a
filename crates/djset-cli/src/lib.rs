//! djset command line front ends

pub mod output;

/// Initialise `env_logger`: `-v` raises the level to info, otherwise
/// logging stays off so stdout carries only results
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
